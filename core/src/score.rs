use crate::error::{IndexError, Result};
use crate::index::{Document, Index, Posting};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult<'a> {
    pub document: &'a Document,
    pub score: f64,
}

/// `ln(N / df)`, or `None` when no document contains the term.
pub fn idf(num_docs: usize, doc_freq: usize) -> Option<f64> {
    if doc_freq == 0 || num_docs == 0 {
        return None;
    }
    Some((num_docs as f64 / doc_freq as f64).ln())
}

/// Occurrences scaled against the document's most frequent term, in (0, 100].
pub fn tf(posting: &Posting, document: &Document) -> f64 {
    if document.max_tf == 0 {
        return 0.0;
    }
    100.0 * posting.term_frequency() as f64 / document.max_tf as f64
}

impl Index {
    pub fn idf(&self, term: &str) -> Option<f64> {
        idf(self.num_docs(), self.doc_freq(term))
    }

    /// Rank documents for `query` by summed tf-idf. Every query term counts,
    /// so repeating a term weights it again; unknown terms add nothing.
    /// Ties keep ingestion order.
    pub fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchResult<'_>>> {
        let limit = usize::try_from(limit)
            .map_err(|_| IndexError::InvalidArgument(format!("limit must be non-negative, got {limit}")))?;
        Ok(self.rank(query, limit))
    }

    /// [`Index::search`] with the configured default limit.
    pub fn search_top(&self, query: &str) -> Vec<SearchResult<'_>> {
        self.rank(query, self.default_limit())
    }

    fn rank(&self, query: &str, limit: usize) -> Vec<SearchResult<'_>> {
        if limit == 0 {
            return Vec::new();
        }

        let mut scores = vec![0.0f64; self.num_docs()];
        for term in self.tokenizer().tokens(query) {
            let Some(idf) = self.idf(&term) else { continue };
            for posting in self.lookup(&term) {
                let doc = &self.documents()[posting.doc_id as usize];
                scores[posting.doc_id as usize] += tf(posting, doc) * idf;
            }
        }

        let mut results: Vec<SearchResult<'_>> = self
            .documents()
            .iter()
            .zip(scores)
            .filter(|(_, score)| *score > 0.0)
            .map(|(document, score)| SearchResult { document, score })
            .collect();
        // stable: equal scores stay in id order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);
        tracing::debug!(query, hits = results.len(), "search complete");
        results
    }
}
