use crate::error::{IndexError, Result};
use crate::index::{DocId, Document, Posting};
use crate::persist::{DirectoryEntry, IndexPaths, MetaFile, FORMAT_VERSION};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Read-only view over a persisted index. Documents and the directory are
/// loaded up front; postings are read on demand from the term's byte range.
pub struct IndexReader {
    paths: IndexPaths,
    documents: Vec<Document>,
    directory: Vec<DirectoryEntry>,
    slots: HashMap<String, usize>,
    meta: Option<MetaFile>,
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| IndexError::io(path, e))
}

fn parse_number<T: std::str::FromStr>(field: &str, what: &str, line_no: usize) -> Result<T> {
    field
        .parse()
        .map_err(|_| IndexError::corrupt(format!("line {}: bad {what} {field:?}", line_no + 1)))
}

fn parse_documents(raw: &str) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let (head, max_tf) = line
            .rsplit_once(',')
            .ok_or_else(|| IndexError::corrupt(format!("documents line {}: missing fields", line_no + 1)))?;
        let (name, filename) = head
            .split_once(',')
            .ok_or_else(|| IndexError::corrupt(format!("documents line {}: missing fields", line_no + 1)))?;
        let max_tf: u32 = parse_number(max_tf, "max_tf", line_no)?;
        if max_tf == 0 {
            return Err(IndexError::corrupt(format!("documents line {}: max_tf is zero", line_no + 1)));
        }
        docs.push(Document {
            id: line_no as DocId,
            name: name.to_string(),
            filename: filename.to_string(),
            max_tf,
        });
    }
    Ok(docs)
}

fn parse_directory(raw: &str, blob_len: u64) -> Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        // terms may contain commas; the two numeric fields never do
        let mut fields = line.rsplitn(3, ',');
        let (Some(len), Some(offset), Some(term)) = (fields.next(), fields.next(), fields.next()) else {
            return Err(IndexError::corrupt(format!("directory line {}: missing fields", line_no + 1)));
        };
        let offset: u64 = parse_number(offset, "byte offset", line_no)?;
        let len: u64 = parse_number(len, "byte length", line_no)?;
        let end = offset.checked_add(len).filter(|end| *end <= blob_len).ok_or_else(|| {
            IndexError::corrupt(format!(
                "directory entry for {term:?} ({offset}+{len}) exceeds blob of {blob_len} bytes"
            ))
        })?;
        if len < term.len() as u64 + 1 {
            return Err(IndexError::corrupt(format!("directory entry for {term:?} is too short")));
        }
        tracing::trace!(term, offset, end, "directory entry");
        entries.push(DirectoryEntry { term: term.to_string(), offset, len });
    }
    Ok(entries)
}

/// Decode one term block (`term "\n" posting*`) from `index.dat`.
///
/// Every record must decode completely and reference a known document;
/// offsets must be non-empty and strictly increasing, doc ids strictly
/// increasing. Anything else is reported as corruption.
pub fn decode_term(term: &str, block: &[u8], num_docs: usize) -> Result<Vec<Posting>> {
    let nl = block
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| IndexError::corrupt(format!("postings for {term:?} lack a term line")))?;
    if &block[..nl] != term.as_bytes() {
        return Err(IndexError::corrupt(format!(
            "directory points {term:?} at postings for {:?}",
            String::from_utf8_lossy(&block[..nl])
        )));
    }

    let mut rest = &block[nl + 1..];
    let mut postings: Vec<Posting> = Vec::new();
    while !rest.is_empty() {
        let posting: Posting = bincode::deserialize_from(&mut rest)
            .map_err(|e| IndexError::corrupt(format!("undecodable posting for {term:?}: {e}")))?;
        if posting.doc_id as usize >= num_docs {
            return Err(IndexError::corrupt(format!(
                "posting for {term:?} references unknown document {}",
                posting.doc_id
            )));
        }
        if postings.last().is_some_and(|prev| prev.doc_id >= posting.doc_id) {
            return Err(IndexError::corrupt(format!("postings for {term:?} are out of order")));
        }
        if posting.offsets.is_empty() || posting.offsets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IndexError::corrupt(format!(
                "posting for {term:?} in document {} has invalid offsets",
                posting.doc_id
            )));
        }
        postings.push(posting);
    }
    if postings.is_empty() {
        return Err(IndexError::corrupt(format!("term {term:?} has no postings")));
    }
    Ok(postings)
}

impl IndexReader {
    pub fn open<P: AsRef<Path>>(index_dir: P) -> Result<Self> {
        let paths = IndexPaths::new(index_dir);
        let documents = parse_documents(&read_text(&paths.documents())?)?;

        let blob_path = paths.postings();
        let blob_len = std::fs::metadata(&blob_path).map_err(|e| IndexError::io(&blob_path, e))?.len();
        let directory = parse_directory(&read_text(&paths.directory())?, blob_len)?;

        let mut slots = HashMap::with_capacity(directory.len());
        for (slot, entry) in directory.iter().enumerate() {
            if slots.insert(entry.term.clone(), slot).is_some() {
                return Err(IndexError::corrupt(format!("term {:?} listed twice", entry.term)));
            }
        }

        let meta = if paths.meta().exists() {
            let meta: MetaFile = serde_json::from_str(&read_text(&paths.meta())?)
                .map_err(|e| IndexError::corrupt(format!("unreadable meta.json: {e}")))?;
            if meta.version != FORMAT_VERSION {
                return Err(IndexError::corrupt(format!("unsupported format version {}", meta.version)));
            }
            if meta.num_docs as usize != documents.len() || meta.num_terms as usize != directory.len() {
                return Err(IndexError::corrupt("meta.json counts disagree with the index files"));
            }
            Some(meta)
        } else {
            None
        };

        tracing::debug!(
            index_dir = %paths.root.display(),
            num_docs = documents.len(),
            num_terms = directory.len(),
            "opened index"
        );
        Ok(Self { paths, documents, directory, slots, meta })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn meta(&self) -> Option<&MetaFile> {
        self.meta.as_ref()
    }

    /// Directory entries in first-seen term order.
    pub fn terms(&self) -> &[DirectoryEntry] {
        &self.directory
    }

    pub fn entry(&self, term: &str) -> Option<&DirectoryEntry> {
        self.slots.get(term).map(|&slot| &self.directory[slot])
    }

    pub fn contains(&self, term: &str) -> bool {
        self.slots.contains_key(term)
    }

    /// Read and decode the postings for `term`, or `None` if it is not indexed.
    pub fn postings(&self, term: &str) -> Result<Option<Vec<Posting>>> {
        let Some(entry) = self.entry(term) else {
            return Ok(None);
        };
        let path = self.paths.postings();
        let mut f = File::open(&path).map_err(|e| IndexError::io(&path, e))?;
        f.seek(SeekFrom::Start(entry.offset)).map_err(|e| IndexError::io(&path, e))?;
        let mut block = vec![0u8; entry.len as usize];
        f.read_exact(&mut block).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                IndexError::corrupt(format!("postings for {term:?} run past the end of index.dat"))
            }
            _ => IndexError::io(&path, e),
        })?;
        decode_term(term, &block, self.documents.len()).map(Some)
    }

    pub fn doc_freq(&self, term: &str) -> Result<usize> {
        Ok(self.postings(term)?.map_or(0, |p| p.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::encode_term;

    #[test]
    fn decode_rejects_truncated_record() {
        let mut block = Vec::new();
        encode_term("cat", &[Posting { doc_id: 0, offsets: vec![0, 4] }], &mut block).unwrap();
        block.truncate(block.len() - 2);
        assert!(matches!(decode_term("cat", &block, 1), Err(IndexError::CorruptIndex(_))));
    }

    #[test]
    fn decode_rejects_wrong_term() {
        let mut block = Vec::new();
        encode_term("dog", &[Posting { doc_id: 0, offsets: vec![1] }], &mut block).unwrap();
        assert!(matches!(decode_term("cat", &block, 1), Err(IndexError::CorruptIndex(_))));
    }

    #[test]
    fn decode_rejects_unknown_document() {
        let mut block = Vec::new();
        encode_term("cat", &[Posting { doc_id: 3, offsets: vec![1] }], &mut block).unwrap();
        assert!(matches!(decode_term("cat", &block, 2), Err(IndexError::CorruptIndex(_))));
    }

    #[test]
    fn directory_lines_split_from_the_right() {
        let entries = parse_directory("rocks,,0,14\n", 14).unwrap();
        assert_eq!(entries[0].term, "rocks,");
        assert_eq!(entries[0].len, 14);
    }

    #[test]
    fn directory_out_of_bounds_is_corrupt() {
        assert!(matches!(parse_directory("cat,10,20\n", 25), Err(IndexError::CorruptIndex(_))));
    }
}
