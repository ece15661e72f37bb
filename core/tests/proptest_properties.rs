//! Property tests for tokenization, scoring and the postings encoding.

use eensy_core::reader::decode_term;
use eensy_core::persist::encode_term;
use eensy_core::score::{idf, tf};
use eensy_core::{Index, Tokenizer};
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,6}",
        "[A-Z][a-z]{0,5}",
        "[a-z]{1,3}[.,!']",
        "[0-9]{1,3}",
        Just("the".to_string()),
        Just("and".to_string()),
        Just("--".to_string()),
    ]
}

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..40).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn tokens_are_clean(raw in "[a-zA-Z0-9éÉ .,!'\t\n-]{0,200}") {
        let tok = Tokenizer::default();
        for t in tok.tokens(&raw) {
            prop_assert!(!t.is_empty());
            prop_assert_eq!(t.to_lowercase(), t.clone());
            prop_assert!(t.chars().any(char::is_alphanumeric));
            prop_assert!(!tok.is_stop_word(&t));
        }
    }

    #[test]
    fn tf_is_bounded(docs in prop::collection::vec(text(), 1..6)) {
        let mut idx = Index::new();
        for (i, d) in docs.iter().enumerate() {
            let _ = idx.ingest(&format!("{i}.txt"), d);
        }
        for entry in idx.terms() {
            for p in &entry.postings {
                let doc = idx.document(p.doc_id).unwrap();
                let value = tf(p, doc);
                prop_assert!(value > 0.0 && value <= 100.0);
                prop_assert_eq!(value == 100.0, p.term_frequency() == doc.max_tf);
                prop_assert!(p.offsets.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn idf_non_increasing_in_df(n in 1usize..500, df in 1usize..500) {
        prop_assume!(df < n);
        prop_assert!(idf(n, df).unwrap() >= idf(n, df + 1).unwrap());
        prop_assert!(idf(n, 0).is_none());
    }

    #[test]
    fn results_sorted_and_limited(docs in prop::collection::vec(text(), 1..8), query in text(), limit in 0i64..12) {
        let mut idx = Index::new();
        for (i, d) in docs.iter().enumerate() {
            let _ = idx.ingest(&format!("{i}.txt"), d);
        }
        let all = idx.search(&query, i64::from(u32::MAX)).unwrap();
        let limited = idx.search(&query, limit).unwrap();
        prop_assert!(limited.len() as i64 <= limit);
        prop_assert_eq!(limited.len(), all.len().min(limit as usize));
        for w in all.windows(2) {
            prop_assert!(w[0].score > w[1].score
                || (w[0].score == w[1].score && w[0].document.id < w[1].document.id));
        }
    }

    #[test]
    fn postings_block_round_trips(
        term in "[a-z]{1,8}",
        postings in prop::collection::btree_map(0u32..50, prop::collection::btree_set(0u32..1000, 1..20), 1..10)
    ) {
        let postings: Vec<eensy_core::Posting> = postings
            .into_iter()
            .map(|(doc_id, offsets)| eensy_core::Posting { doc_id, offsets: offsets.into_iter().collect() })
            .collect();
        let mut block = Vec::new();
        encode_term(&term, &postings, &mut block).unwrap();
        let decoded = decode_term(&term, &block, 50).unwrap();
        prop_assert_eq!(decoded, postings);
    }
}
