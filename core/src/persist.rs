//! On-disk layout of a persisted index.
//!
//! ```text
//! documents.txt   name,filename,max_tf           one line per document, id order
//! index.dat       term "\n" posting*             per term, first-seen order
//! directory.txt   term,byte_offset,byte_length   one line per term
//! meta.json       format version and counts
//! ```
//!
//! Terms never contain whitespace but may keep punctuation, commas included,
//! so directory lines are split from the right. Document names and filenames
//! are not escaped and must not contain commas.
//!
//! A posting record is the bincode (fixed-int, little-endian) encoding of
//! [`Posting`]: `doc_id: u32`, `count: u64`, then `count` `u32` offsets. The
//! records carry their own length, so a term's byte range decodes without
//! further metadata. Writing is not atomic: a failure leaves a partial
//! directory that must be rebuilt.

use crate::error::{IndexError, Result};
use crate::index::{Document, Index, Posting, TermEntry};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub num_docs: u32,
    pub num_terms: u32,
}

/// Where one term's line and postings live inside `index.dat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub term: String,
    pub offset: u64,
    pub len: u64,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn documents(&self) -> PathBuf { self.root.join("documents.txt") }
    pub fn directory(&self) -> PathBuf { self.root.join("directory.txt") }
    pub fn postings(&self) -> PathBuf { self.root.join("index.dat") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).map_err(|e| IndexError::io(path, e))?;
    f.write_all(bytes).map_err(|e| IndexError::io(path, e))?;
    Ok(())
}

/// Commas and newlines would break the comma-separated tables.
fn check_field(kind: &str, value: &str) -> Result<()> {
    if value.contains([',', '\n', '\r']) {
        return Err(IndexError::InvalidArgument(format!(
            "{kind} {value:?} cannot be stored in a comma-separated table"
        )));
    }
    Ok(())
}

pub fn save_documents(paths: &IndexPaths, docs: &[Document]) -> Result<()> {
    let mut out = String::new();
    for doc in docs {
        check_field("document name", &doc.name)?;
        check_field("filename", &doc.filename)?;
        out.push_str(&format!("{},{},{}\n", doc.name, doc.filename, doc.max_tf));
    }
    write_file(&paths.documents(), out.as_bytes())
}

/// Append one term's block to `blob`: the term, a newline, then its postings.
pub fn encode_term(term: &str, postings: &[Posting], blob: &mut Vec<u8>) -> Result<()> {
    blob.extend_from_slice(term.as_bytes());
    blob.push(b'\n');
    for posting in postings {
        bincode::serialize_into(&mut *blob, posting)?;
    }
    Ok(())
}

/// Write the postings blob and return the directory describing it.
pub fn save_postings<'a, I>(paths: &IndexPaths, terms: I) -> Result<Vec<DirectoryEntry>>
where
    I: IntoIterator<Item = &'a TermEntry>,
{
    let mut blob = Vec::new();
    let mut directory = Vec::new();
    for entry in terms {
        let offset = blob.len() as u64;
        encode_term(&entry.term, &entry.postings, &mut blob)?;
        directory.push(DirectoryEntry {
            term: entry.term.clone(),
            offset,
            len: blob.len() as u64 - offset,
        });
    }
    write_file(&paths.postings(), &blob)?;
    Ok(directory)
}

pub fn save_directory(paths: &IndexPaths, directory: &[DirectoryEntry]) -> Result<()> {
    let mut out = String::new();
    for entry in directory {
        out.push_str(&format!("{},{},{}\n", entry.term, entry.offset, entry.len));
    }
    write_file(&paths.directory(), out.as_bytes())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    write_file(&paths.meta(), json.as_bytes())
}

impl Index {
    /// Write this index to `index_dir`, creating it if needed.
    pub fn persist<P: AsRef<Path>>(&self, index_dir: P) -> Result<()> {
        let paths = IndexPaths::new(index_dir);
        create_dir_all(&paths.root).map_err(|e| IndexError::io(&paths.root, e))?;

        save_documents(&paths, self.documents())?;
        let directory = save_postings(&paths, self.terms())?;
        save_directory(&paths, &directory)?;
        let meta = MetaFile {
            version: FORMAT_VERSION,
            num_docs: self.num_docs() as u32,
            num_terms: self.num_terms() as u32,
        };
        save_meta(&paths, &meta)?;

        tracing::info!(
            index_dir = %paths.root.display(),
            num_docs = meta.num_docs,
            num_terms = meta.num_terms,
            "index persisted"
        );
        Ok(())
    }
}
