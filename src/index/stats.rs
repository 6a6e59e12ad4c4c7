//! Collection statistics (`stats.txt`)
//!
//! Key/value text, one `key \t value` pair per line. Readers tolerate
//! unknown keys so the format can grow without breaking old binaries.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;

/// Collection-wide statistics produced by the merger
#[derive(Clone, Debug, Default)]
pub struct IndexStats {
    /// Total number of documents (max docID + 1)
    pub doc_count: u64,
    /// Mean document length over the collection
    pub avgdl: f64,
    /// Number of distinct terms
    pub total_terms: u64,
    /// Number of postings across all terms
    pub total_postings: u64,
    /// Sum of all document lengths
    pub total_doc_length: u64,
}

impl IndexStats {
    /// Read stats from disk. Only `doc_count` and `avgdl` are required for
    /// scoring; the rest are informational.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let mut stats = IndexStats::default();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.splitn(2, '\t');
            let key = fields.next().unwrap_or("");
            let value = fields.next().unwrap_or("").trim();

            let parsed = match key {
                "doc_count" => value.parse().map(|v| stats.doc_count = v).is_ok(),
                "avgdl" => value.parse().map(|v| stats.avgdl = v).is_ok(),
                "total_terms" => value.parse().map(|v| stats.total_terms = v).is_ok(),
                "total_postings" => value.parse().map(|v| stats.total_postings = v).is_ok(),
                "total_doc_length" => value.parse().map(|v| stats.total_doc_length = v).is_ok(),
                _ => true, // unknown keys are fine
            };
            if !parsed {
                warn!("skipping malformed stats line: {}", line);
            }
        }

        info!(
            "loaded stats: doc_count={}, avgdl={:.2}",
            stats.doc_count, stats.avgdl
        );
        Ok(stats)
    }

    /// Write stats in the on-disk format.
    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "# Index Statistics")?;
        writeln!(writer, "doc_count\t{}", self.doc_count)?;
        writeln!(writer, "total_terms\t{}", self.total_terms)?;
        writeln!(writer, "total_postings\t{}", self.total_postings)?;
        writeln!(writer, "avgdl\t{}", self.avgdl)?;
        writeln!(writer, "total_doc_length\t{}", self.total_doc_length)?;
        writer.flush()?;
        Ok(())
    }
}
