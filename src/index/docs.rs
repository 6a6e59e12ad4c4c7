//! Per-document metadata loaded by the query process
//!
//! Three artifacts, all indexed by the dense internal docID:
//!   - `doc_len.bin`: raw little-endian u32 lengths (from the merger)
//!   - `doc_table.txt`: `internalDocID \t originalDocID` (from the indexer)
//!   - `doc_offset.bin` + `doc_content.bin`: random-access passage text

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{CuttleError, Result};

/// Document lengths indexed by docID.
///
/// A document whose every token was unindexable keeps a zero slot; the BM25
/// `dl = 0` guard scores such documents zero rather than failing.
pub struct DocLengths {
    lengths: Vec<u32>,
}

impl DocLengths {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        if bytes.len() % 4 != 0 {
            return Err(CuttleError::InvalidIndexFile {
                file: path.as_ref().display().to_string(),
                reason: format!("size {} is not a multiple of 4", bytes.len()),
            });
        }

        let lengths: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        info!("loaded lengths for {} documents", lengths.len());
        Ok(Self { lengths })
    }

    /// Length of a document; 0 for unknown docIDs.
    pub fn get(&self, doc_id: u32) -> u32 {
        self.lengths.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// Mapping from internal docID to the collection's original document id.
pub struct DocTable {
    original_ids: Vec<String>,
}

impl DocTable {
    /// Two-pass load: first scan for the maximum docID to size the table,
    /// then fill it. Entries never mentioned stay empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);

        let mut max_doc_id: Option<u32> = None;
        for line in reader.by_ref().lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            if let Some((id, _)) = line.split_once('\t') {
                if let Ok(doc_id) = id.parse::<u32>() {
                    max_doc_id = Some(max_doc_id.map_or(doc_id, |m| m.max(doc_id)));
                }
            }
        }

        let size = max_doc_id.map_or(0, |m| m as usize + 1);
        let mut original_ids = vec![String::new(); size];

        reader.seek(SeekFrom::Start(0))?;
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let Some((id, rest)) = line.split_once('\t') else {
                warn!("skipping malformed doc table line: {}", line);
                continue;
            };
            let Ok(doc_id) = id.parse::<u32>() else {
                warn!("skipping malformed doc table line: {}", line);
                continue;
            };
            // Tolerate trailing columns from older builds
            let original = rest.split('\t').next().unwrap_or(rest);
            original_ids[doc_id as usize] = original.to_string();
        }

        info!("loaded {} documents from doc table", original_ids.len());
        Ok(Self { original_ids })
    }

    /// Original document id, or empty string for unknown docIDs.
    pub fn original_id(&self, doc_id: u32) -> &str {
        self.original_ids
            .get(doc_id as usize)
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.original_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original_ids.is_empty()
    }
}

/// Random-access reader for raw passage text.
///
/// `doc_offset.bin` holds one 12-byte record per docID: `u64 offset` then
/// `u32 length`, little-endian, in docID order. The content file handle is
/// shared behind a mutex because a positioned read is a seek immediately
/// followed by a read.
pub struct DocContentStore {
    offsets: Vec<(u64, u32)>,
    content: Mutex<File>,
}

impl DocContentStore {
    pub fn open<P: AsRef<Path>>(offset_path: P, content_path: P) -> Result<Self> {
        let mut bytes = Vec::new();
        File::open(offset_path.as_ref())?.read_to_end(&mut bytes)?;

        if bytes.len() % 12 != 0 {
            return Err(CuttleError::InvalidIndexFile {
                file: offset_path.as_ref().display().to_string(),
                reason: format!("size {} is not a multiple of 12", bytes.len()),
            });
        }

        let offsets: Vec<(u64, u32)> = bytes
            .chunks_exact(12)
            .map(|c| {
                let offset = u64::from_le_bytes(c[0..8].try_into().unwrap());
                let length = u32::from_le_bytes(c[8..12].try_into().unwrap());
                (offset, length)
            })
            .collect();

        let content = File::open(content_path.as_ref())?;
        info!("opened content store for {} documents", offsets.len());

        Ok(Self {
            offsets,
            content: Mutex::new(content),
        })
    }

    /// Read a document's raw text. Returns `None` for unknown docIDs.
    pub fn read(&self, doc_id: u32) -> Result<Option<String>> {
        let Some(&(offset, length)) = self.offsets.get(doc_id as usize) else {
            return Ok(None);
        };

        let mut buf = vec![0u8; length as usize];
        {
            let mut file = self.content.lock();
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf)?;
        }

        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_doc_lengths_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc_len.bin");
        let mut file = File::create(&path).unwrap();
        for len in [4u32, 5, 3] {
            file.write_all(&len.to_le_bytes()).unwrap();
        }
        drop(file);

        let lengths = DocLengths::load(&path).unwrap();
        assert_eq!(lengths.len(), 3);
        assert_eq!(lengths.get(0), 4);
        assert_eq!(lengths.get(1), 5);
        assert_eq!(lengths.get(2), 3);
        assert_eq!(lengths.get(99), 0);
    }

    #[test]
    fn test_doc_lengths_bad_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc_len.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        assert!(DocLengths::load(&path).is_err());
    }

    #[test]
    fn test_doc_table_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc_table.txt");
        std::fs::write(&path, "0\tD100\n2\tD300\n1\tD200\n").unwrap();

        let table = DocTable::load(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.original_id(0), "D100");
        assert_eq!(table.original_id(1), "D200");
        assert_eq!(table.original_id(2), "D300");
        assert_eq!(table.original_id(9), "");
    }

    #[test]
    fn test_content_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let offset_path = dir.path().join("doc_offset.bin");
        let content_path = dir.path().join("doc_content.bin");

        let docs = ["the quick brown fox", "a lazy dog"];
        let mut content = File::create(&content_path).unwrap();
        let mut offsets = File::create(&offset_path).unwrap();
        let mut pos = 0u64;
        for doc in &docs {
            offsets.write_all(&pos.to_le_bytes()).unwrap();
            offsets.write_all(&(doc.len() as u32).to_le_bytes()).unwrap();
            content.write_all(doc.as_bytes()).unwrap();
            content.write_all(b"\n").unwrap();
            pos += doc.len() as u64 + 1;
        }
        drop(content);
        drop(offsets);

        let store = DocContentStore::open(&offset_path, &content_path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.read(0).unwrap().as_deref(), Some("the quick brown fox"));
        assert_eq!(store.read(1).unwrap().as_deref(), Some("a lazy dog"));
        assert_eq!(store.read(2).unwrap(), None);
    }
}
