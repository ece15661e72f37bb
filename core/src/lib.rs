//! Small TF-IDF search over a directory of plain-text files.
//!
//! Build an [`Index`] with [`Index::from_dir`] or [`Index::ingest`], query it
//! with [`Index::search`], and write it out with [`Index::persist`]. A
//! persisted index is read back through [`IndexReader`].

pub mod config;
pub mod error;
pub mod index;
pub mod persist;
pub mod reader;
pub mod score;
pub mod tokenizer;

pub use config::{IndexConfig, DEFAULT_LIMIT};
pub use error::{IndexError, Result};
pub use index::{DocId, Document, Index, Posting, TermEntry, TermId};
pub use reader::IndexReader;
pub use score::SearchResult;
pub use tokenizer::{tokenize, Tokenizer};
