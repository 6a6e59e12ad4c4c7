//! Term dictionary over `lexicon.tsv`
//!
//! One record per term: `term \t df \t cf \t docids_offset \t freqs_offset \t
//! blocks_count`. Offsets are decimal byte positions into the two posting
//! files. The whole dictionary is held in a hash map; at one to two million
//! terms this is a modest, single linear pass at startup.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;

/// Per-term metadata as written by the merger
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TermMeta {
    /// Document frequency: number of postings in the term's list
    pub df: u32,
    /// Collection frequency: sum of tf over the term's postings
    pub cf: u64,
    /// Byte offset of the term's first block in postings.docids.bin
    pub docids_offset: u64,
    /// Byte offset of the term's first block in postings.freqs.bin
    pub freqs_offset: u64,
    /// Number of blocks in the term's list
    pub blocks: u32,
}

impl TermMeta {
    fn parse_fields(fields: &[&str]) -> Option<TermMeta> {
        if fields.len() < 6 {
            return None;
        }
        Some(TermMeta {
            df: fields[1].parse().ok()?,
            cf: fields[2].parse().ok()?,
            docids_offset: fields[3].parse().ok()?,
            freqs_offset: fields[4].parse().ok()?,
            blocks: fields[5].parse().ok()?,
        })
    }
}

/// In-memory term dictionary: term string -> metadata
pub struct Lexicon {
    terms: HashMap<String, TermMeta>,
}

impl Lexicon {
    /// Load the lexicon from its TSV file. Lines starting with `#` are
    /// comments; malformed lines are logged and skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let mut terms = HashMap::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            match TermMeta::parse_fields(&fields) {
                Some(meta) => {
                    terms.insert(fields[0].to_string(), meta);
                }
                None => {
                    warn!("skipping malformed lexicon line: {}", line);
                }
            }
        }

        info!("loaded {} terms from lexicon", terms.len());
        Ok(Self { terms })
    }

    /// Look up a term's metadata
    pub fn get(&self, term: &str) -> Option<&TermMeta> {
        self.terms.get(term)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Render one lexicon record the way the merger writes it.
pub fn format_entry(term: &str, meta: &TermMeta) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        term, meta.df, meta.cf, meta.docids_offset, meta.freqs_offset, meta.blocks
    )
}

/// Header line written at the top of lexicon.tsv
pub const LEXICON_HEADER: &str = "# term\tdf\tcf\tdocids_offset\tfreqs_offset\tblocks_count";
