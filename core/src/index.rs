use crate::config::{IndexConfig, DEFAULT_LIMIT};
use crate::error::{IndexError, Result};
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    /// Display name: the filename without its trailing `.txt`.
    pub name: String,
    pub filename: String,
    /// Occurrence count of the most frequent term in this document.
    pub max_tf: u32,
}

impl Document {
    fn new(id: DocId, filename: &str, max_tf: u32) -> Self {
        let name = filename.strip_suffix(".txt").unwrap_or(filename).to_string();
        Self { id, name, filename: filename.to_string(), max_tf }
    }
}

/// Occurrences of one term in one document. This struct is also the binary
/// record written to the postings blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub offsets: Vec<u32>, // strictly increasing, never empty
}

impl Posting {
    pub fn term_frequency(&self) -> u32 {
        self.offsets.len() as u32
    }
}

#[derive(Debug, Clone)]
pub struct TermEntry {
    pub term: String,
    pub postings: Vec<Posting>, // ingestion order
}

/// Per-document accumulator: term -> offsets, in first-seen order.
#[derive(Default)]
struct DocTerms {
    slots: HashMap<String, usize>,
    entries: Vec<(String, Vec<u32>)>,
}

impl DocTerms {
    fn offsets_mut(&mut self, term: String) -> &mut Vec<u32> {
        let entries = &mut self.entries;
        let slot = *self.slots.entry(term).or_insert_with_key(|t| {
            entries.push((t.clone(), Vec::new()));
            entries.len() - 1
        });
        &mut self.entries[slot].1
    }

    fn max_tf(&self) -> usize {
        self.entries.iter().map(|(_, offsets)| offsets.len()).max().unwrap_or(0)
    }
}

/// In-memory inverted index. Built once through [`Index::ingest`] and then
/// queried read-only.
#[derive(Debug, Clone)]
pub struct Index {
    tokenizer: Tokenizer,
    default_limit: usize,
    documents: Vec<Document>,
    dictionary: HashMap<String, TermId>,
    terms: Vec<TermEntry>, // indexed by TermId, first-seen order
}

impl Default for Index {
    fn default() -> Self {
        Self::with_tokenizer(Tokenizer::default())
    }
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokenizer(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            default_limit: DEFAULT_LIMIT,
            documents: Vec::new(),
            dictionary: HashMap::new(),
            terms: Vec::new(),
        }
    }

    pub fn with_config(config: &IndexConfig) -> Self {
        let mut index = Self::with_tokenizer(config.tokenizer());
        index.default_limit = config.default_limit;
        index
    }

    /// Index every entry of `dir` (non-recursive) with the default config.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::from_dir_with_config(dir, &IndexConfig::default())
    }

    /// Index every entry of `dir` as a text document. Entries are read in
    /// file-name order so identical directories produce identical indexes.
    pub fn from_dir_with_config<P: AsRef<Path>>(dir: P, config: &IndexConfig) -> Result<Self> {
        let dir = dir.as_ref();
        let meta = std::fs::metadata(dir).map_err(|e| IndexError::io(dir, e))?;
        if !meta.is_dir() {
            return Err(IndexError::io(dir, std::io::Error::other("not a directory")));
        }
        let mut index = Self::with_config(config);
        let walker = WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                IndexError::io(path, e.into())
            })?;
            let path = entry.path();
            let text = std::fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            match index.ingest(&filename, &text) {
                Ok(_) => {}
                Err(IndexError::EmptyDocument { filename }) if config.skip_empty_documents => {
                    tracing::warn!(%filename, "skipping document without indexable terms");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!(
            dir = %dir.display(),
            num_docs = index.num_docs(),
            num_terms = index.num_terms(),
            "ingested documents"
        );
        Ok(index)
    }

    /// Add one document. Nothing is modified when the text yields no terms.
    pub fn ingest(&mut self, filename: &str, text: &str) -> Result<DocId> {
        let mut doc_terms = DocTerms::default();
        for (pos, term) in self.tokenizer.tokens(text).enumerate() {
            let pos = u32::try_from(pos)
                .map_err(|_| IndexError::InvalidArgument(format!("{filename} has too many terms")))?;
            doc_terms.offsets_mut(term).push(pos);
        }
        let max_tf = doc_terms.max_tf();
        if max_tf == 0 {
            return Err(IndexError::EmptyDocument { filename: filename.to_string() });
        }

        let doc_id = DocId::try_from(self.documents.len())
            .map_err(|_| IndexError::InvalidArgument("document table is full".into()))?;
        self.documents.push(Document::new(doc_id, filename, max_tf as u32));

        for (term, offsets) in doc_terms.entries {
            let tid = match self.dictionary.get(&term) {
                Some(&tid) => tid,
                None => {
                    let tid = self.terms.len() as TermId;
                    self.dictionary.insert(term.clone(), tid);
                    self.terms.push(TermEntry { term, postings: Vec::new() });
                    tid
                }
            };
            self.terms[tid as usize].postings.push(Posting { doc_id, offsets });
        }
        tracing::debug!(doc_id, filename, max_tf, "ingested document");
        Ok(doc_id)
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id as usize)
    }

    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Terms in first-seen order.
    pub fn terms(&self) -> impl Iterator<Item = &TermEntry> {
        self.terms.iter()
    }

    /// Postings for `term`, empty when the term was never indexed.
    pub fn lookup(&self, term: &str) -> &[Posting] {
        match self.dictionary.get(term) {
            Some(&tid) => &self.terms[tid as usize].postings,
            None => &[],
        }
    }

    pub fn doc_freq(&self, term: &str) -> usize {
        self.lookup(term).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_assigns_sequential_ids() {
        let mut idx = Index::new();
        assert_eq!(idx.ingest("a.txt", "apple").unwrap(), 0);
        assert_eq!(idx.ingest("b.txt", "banana").unwrap(), 1);
        assert_eq!(idx.document(1).unwrap().name, "b");
        assert_eq!(idx.document(1).unwrap().filename, "b.txt");
    }

    #[test]
    fn offsets_skip_filtered_words() {
        let mut idx = Index::new();
        idx.ingest("d", "the cat sat on the mat with a cat").unwrap();
        let cat = idx.lookup("cat");
        assert_eq!(cat.len(), 1);
        assert_eq!(cat[0].offsets, vec![0, 3]);
        assert_eq!(idx.lookup("mat")[0].offsets, vec![2]);
        assert_eq!(idx.document(0).unwrap().max_tf, 2);
    }

    #[test]
    fn terms_keep_first_seen_order() {
        let mut idx = Index::new();
        idx.ingest("a", "zebra apple").unwrap();
        idx.ingest("b", "mango apple zebra").unwrap();
        let order: Vec<&str> = idx.terms().map(|t| t.term.as_str()).collect();
        assert_eq!(order, vec!["zebra", "apple", "mango"]);
        let docs: Vec<DocId> = idx.lookup("apple").iter().map(|p| p.doc_id).collect();
        assert_eq!(docs, vec![0, 1]);
    }

    #[test]
    fn empty_document_is_rejected_without_side_effects() {
        let mut idx = Index::new();
        let err = idx.ingest("empty.txt", "the of ... --").unwrap_err();
        assert!(matches!(err, IndexError::EmptyDocument { ref filename } if filename == "empty.txt"));
        assert_eq!(idx.num_docs(), 0);
        assert_eq!(idx.ingest("next.txt", "word").unwrap(), 0);
    }

    #[test]
    fn only_trailing_txt_is_stripped() {
        let mut idx = Index::new();
        idx.ingest("notes.txt.bak", "word").unwrap();
        idx.ingest("a.txt", "word").unwrap();
        assert_eq!(idx.document(0).unwrap().name, "notes.txt.bak");
        assert_eq!(idx.document(1).unwrap().name, "a");
    }
}
