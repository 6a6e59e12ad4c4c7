//! Phase-1 collection indexer
//!
//! Streams a collection TSV (`originalDocID \t passage`), assigns dense
//! internal docIDs in parse order, and emits flat `term \t docID \t tf`
//! triples partitioned by size. No cross-document aggregation happens here;
//! the external sort and the merger own the global grouping. Alongside the
//! postings it writes the document table, the content file, and the offset
//! records that make passages randomly addressable for snippets.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::config::{CollectionPaths, IndexerConfig};
use crate::error::Result;
use crate::tokenizer;

/// Summary of one indexing run
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexSummary {
    pub doc_count: u64,
    pub posting_count: u64,
    pub part_count: u32,
}

pub struct CollectionIndexer {
    out: CollectionPaths,
    config: IndexerConfig,
}

impl CollectionIndexer {
    pub fn new(out: CollectionPaths, config: IndexerConfig) -> Self {
        Self { out, config }
    }

    /// Index a whole collection file.
    pub fn index<P: AsRef<Path>>(&self, collection: P) -> Result<IndexSummary> {
        let input = File::open(collection.as_ref())?;
        let reader = BufReader::new(input);

        std::fs::create_dir_all(&self.out.dir)?;
        let mut doc_table = BufWriter::new(File::create(self.out.doc_table())?);
        let mut doc_offset = BufWriter::new(File::create(self.out.doc_offset())?);
        let mut doc_content = BufWriter::new(File::create(self.out.doc_content())?);
        let mut parts = PartWriter::new(&self.out, self.config.part_size_limit)?;

        let mut doc_id: u32 = 0;
        let mut content_pos: u64 = 0;
        let mut posting_count: u64 = 0;

        info!("indexing collection {}", collection.as_ref().display());

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let Some((original_id, passage)) = line.split_once('\t') else {
                warn!("skipping malformed collection line: {}", line);
                continue;
            };

            writeln!(doc_table, "{}\t{}", doc_id, original_id)?;

            doc_offset.write_all(&content_pos.to_le_bytes())?;
            doc_offset.write_all(&(passage.len() as u32).to_le_bytes())?;
            doc_content.write_all(passage.as_bytes())?;
            doc_content.write_all(b"\n")?;
            content_pos += passage.len() as u64 + 1;

            // Per-document tf aggregation only; triples go straight to disk
            let mut freqs: Vec<(String, u32)> = tokenizer::term_frequencies(passage)
                .into_iter()
                .collect();
            freqs.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            for (term, tf) in freqs {
                parts.write_posting(&term, doc_id, tf)?;
                posting_count += 1;
            }

            doc_id += 1;
            if doc_id % 100_000 == 0 {
                info!("indexed {} documents", doc_id);
            }
        }

        doc_table.flush()?;
        doc_offset.flush()?;
        doc_content.flush()?;
        let part_count = parts.finish()?;

        let summary = IndexSummary {
            doc_count: doc_id as u64,
            posting_count,
            part_count,
        };
        info!(
            "indexing complete: {} documents, {} postings, {} parts",
            summary.doc_count, summary.posting_count, summary.part_count
        );
        Ok(summary)
    }
}

/// Rotating writer for postings partitions
struct PartWriter<'a> {
    out: &'a CollectionPaths,
    size_limit: u64,
    current: BufWriter<File>,
    current_size: u64,
    part_number: u32,
}

impl<'a> PartWriter<'a> {
    fn new(out: &'a CollectionPaths, size_limit: u64) -> Result<Self> {
        let current = BufWriter::new(File::create(out.postings_part(0))?);
        Ok(Self {
            out,
            size_limit,
            current,
            current_size: 0,
            part_number: 0,
        })
    }

    fn write_posting(&mut self, term: &str, doc_id: u32, tf: u32) -> Result<()> {
        // Rotate between documents only at the line level; a line never splits
        if self.current_size >= self.size_limit {
            self.rotate()?;
        }
        let line = format!("{}\t{}\t{}\n", term, doc_id, tf);
        self.current.write_all(line.as_bytes())?;
        self.current_size += line.len() as u64;
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.current.flush()?;
        self.part_number += 1;
        info!("rotating to postings part {}", self.part_number);
        self.current = BufWriter::new(File::create(self.out.postings_part(self.part_number))?);
        self.current_size = 0;
        Ok(())
    }

    fn finish(mut self) -> Result<u32> {
        self.current.flush()?;
        Ok(self.part_number + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::docs::{DocContentStore, DocTable};

    fn index_collection(collection: &str, config: IndexerConfig) -> (tempfile::TempDir, IndexSummary) {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("collection.tsv");
        std::fs::write(&input_path, collection).unwrap();

        let out = CollectionPaths::new(dir.path().join("out"));
        let summary = CollectionIndexer::new(out, config)
            .index(&input_path)
            .unwrap();
        (dir, summary)
    }

    #[test]
    fn test_index_small_collection() {
        let collection = "D100\tthe quick brown fox\nD200\tthe fox and the dog\nD300\ta lazy dog\n";
        let (dir, summary) = index_collection(collection, IndexerConfig::default());

        assert_eq!(summary.doc_count, 3);
        // Distinct terms per doc: 4 + 4 + 3
        assert_eq!(summary.posting_count, 11);
        assert_eq!(summary.part_count, 1);

        let out = CollectionPaths::new(dir.path().join("out"));
        let table = DocTable::load(out.doc_table()).unwrap();
        assert_eq!(table.original_id(0), "D100");
        assert_eq!(table.original_id(2), "D300");

        let content = DocContentStore::open(out.doc_offset(), out.doc_content()).unwrap();
        assert_eq!(content.read(1).unwrap().as_deref(), Some("the fox and the dog"));
    }

    #[test]
    fn test_postings_lines_are_well_formed() {
        let collection = "D1\tfox fox dog\n";
        let (dir, _) = index_collection(collection, IndexerConfig::default());

        let out = CollectionPaths::new(dir.path().join("out"));
        let part = std::fs::read_to_string(out.postings_part(0)).unwrap();
        let mut lines: Vec<&str> = part.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["dog\t0\t1", "fox\t0\t2"]);
    }

    #[test]
    fn test_part_rotation() {
        let mut collection = String::new();
        for i in 0..50 {
            collection.push_str(&format!("D{}\talpha beta gamma delta\n", i));
        }
        let config = IndexerConfig::default().with_part_size_limit(128);
        let (dir, summary) = index_collection(&collection, config);

        assert!(summary.part_count > 1);
        let out = CollectionPaths::new(dir.path().join("out"));
        // Every part exists and every line in every part parses
        let mut total_lines = 0;
        for n in 0..summary.part_count {
            let part = std::fs::read_to_string(out.postings_part(n)).unwrap();
            for line in part.lines() {
                let fields: Vec<&str> = line.split('\t').collect();
                assert_eq!(fields.len(), 3);
                fields[1].parse::<u32>().unwrap();
                fields[2].parse::<u32>().unwrap();
                total_lines += 1;
            }
        }
        assert_eq!(total_lines, summary.posting_count);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let collection = "D1\tfox\nno tab here\nD2\tdog\n";
        let (_dir, summary) = index_collection(collection, IndexerConfig::default());
        assert_eq!(summary.doc_count, 2);
    }
}
