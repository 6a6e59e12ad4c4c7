use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of postings per compressed block
pub const BLOCK_SIZE: usize = 128;

/// File layout of a merged index directory
///
/// All readers and the merger agree on these names.
#[derive(Clone, Debug)]
pub struct IndexPaths {
    pub dir: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Block-compressed, gap-coded docIDs
    pub fn docids(&self) -> PathBuf {
        self.dir.join("postings.docids.bin")
    }

    /// Block-compressed term frequencies, aligned block-for-block with docids
    pub fn freqs(&self) -> PathBuf {
        self.dir.join("postings.freqs.bin")
    }

    /// Term dictionary, TSV
    pub fn lexicon(&self) -> PathBuf {
        self.dir.join("lexicon.tsv")
    }

    /// Collection statistics, key/value text
    pub fn stats(&self) -> PathBuf {
        self.dir.join("stats.txt")
    }

    /// Raw little-endian u32 document lengths
    pub fn doc_len(&self) -> PathBuf {
        self.dir.join("doc_len.bin")
    }
}

/// File layout of a Phase-1 indexer output directory
#[derive(Clone, Debug)]
pub struct CollectionPaths {
    pub dir: PathBuf,
}

impl CollectionPaths {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// internalDocID \t originalDocID
    pub fn doc_table(&self) -> PathBuf {
        self.dir.join("doc_table.txt")
    }

    /// (u64 offset, u32 length) per docID into doc_content.bin
    pub fn doc_offset(&self) -> PathBuf {
        self.dir.join("doc_offset.bin")
    }

    /// Cleaned passages, newline-terminated
    pub fn doc_content(&self) -> PathBuf {
        self.dir.join("doc_content.bin")
    }

    /// Flat postings partition: term \t docID \t tf
    pub fn postings_part(&self, n: u32) -> PathBuf {
        self.dir.join(format!("postings_part_{:04}.tsv", n))
    }
}

/// Phase-1 indexer tunables
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Rotate postings partition files once they grow past this many bytes
    pub part_size_limit: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            // 2 GiB per part keeps each file sortable on a modest machine
            part_size_limit: 2 * 1024 * 1024 * 1024,
        }
    }
}

impl IndexerConfig {
    pub fn with_part_size_limit(mut self, bytes: u64) -> Self {
        self.part_size_limit = bytes;
        self
    }
}

/// Default number of results returned when the caller does not say
pub const DEFAULT_TOP_K: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_paths() {
        let paths = IndexPaths::new("/tmp/idx");
        assert_eq!(paths.docids(), PathBuf::from("/tmp/idx/postings.docids.bin"));
        assert_eq!(paths.freqs(), PathBuf::from("/tmp/idx/postings.freqs.bin"));
        assert_eq!(paths.lexicon(), PathBuf::from("/tmp/idx/lexicon.tsv"));
        assert_eq!(paths.stats(), PathBuf::from("/tmp/idx/stats.txt"));
        assert_eq!(paths.doc_len(), PathBuf::from("/tmp/idx/doc_len.bin"));
    }

    #[test]
    fn test_collection_paths() {
        let paths = CollectionPaths::new("/tmp/out");
        assert_eq!(
            paths.postings_part(3),
            PathBuf::from("/tmp/out/postings_part_0003.tsv")
        );
        assert_eq!(paths.doc_table(), PathBuf::from("/tmp/out/doc_table.txt"));
    }

    #[test]
    fn test_indexer_config_default() {
        let config = IndexerConfig::default();
        assert_eq!(config.part_size_limit, 2 * 1024 * 1024 * 1024);

        let small = IndexerConfig::default().with_part_size_limit(1024);
        assert_eq!(small.part_size_limit, 1024);
    }
}
