//! Merger: sorted postings stream -> block-compressed inverted index
//!
//! Consumes the globally-sorted `term \t docID \t tf` stream (sorted by term
//! bytes, then docID numerically) and groups it into per-term runs. Each
//! completed run is handed to the block writer, which also maintains the
//! per-document length accumulator. Once the stream is exhausted the merger
//! writes `doc_len.bin` and `stats.txt`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::config::IndexPaths;
use crate::error::Result;
use crate::index::lexicon::{self, TermMeta};
use crate::index::stats::IndexStats;
use crate::index::writer::{Posting, PostingsWriter};

const READ_BUFFER_SIZE: usize = 8 * 1024 * 1024;

pub struct IndexMerger {
    out: IndexPaths,
}

impl IndexMerger {
    pub fn new(out: IndexPaths) -> Self {
        Self { out }
    }

    /// Run the merge. The input must already be sorted (`LC_ALL=C sort
    /// -t'\t' -k1,1 -k2,2n`); the merger itself only ever holds one term's
    /// postings in memory.
    pub fn merge<P: AsRef<Path>>(&self, sorted_postings: P) -> Result<IndexStats> {
        let input = File::open(sorted_postings.as_ref())?;
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, input);

        std::fs::create_dir_all(&self.out.dir)?;
        let mut writer = PostingsWriter::create(&self.out)?;
        let mut lexicon_out = BufWriter::new(File::create(self.out.lexicon())?);
        writeln!(lexicon_out, "{}", lexicon::LEXICON_HEADER)?;

        let mut current_term = String::new();
        let mut current_postings: Vec<Posting> = Vec::with_capacity(1024);
        let mut doc_lengths: Vec<u32> = Vec::new();

        let mut doc_count: u64 = 0;
        let mut total_terms: u64 = 0;
        let mut total_postings: u64 = 0;
        let mut lines_processed: u64 = 0;

        info!(
            "merging sorted postings from {} into {}",
            sorted_postings.as_ref().display(),
            self.out.dir.display()
        );

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((term, doc_id, tf)) = parse_posting_line(&line) else {
                warn!("skipping malformed posting line: {}", line);
                continue;
            };

            if doc_id as u64 >= doc_count {
                doc_count = doc_id as u64 + 1;
            }

            if term != current_term {
                if !current_postings.is_empty() {
                    let meta = writer.write_list(&current_postings, &mut doc_lengths)?;
                    write_lexicon_entry(&mut lexicon_out, &current_term, &meta)?;
                    total_terms += 1;
                    total_postings += meta.df as u64;
                    current_postings.clear();
                }
                current_term.clear();
                current_term.push_str(term);
            }

            // The indexer coalesces per document, so a repeated docID within a
            // term is unexpected; folding the tf keeps the list well-formed.
            match current_postings.last_mut() {
                Some(last) if last.doc_id == doc_id => {
                    warn!("duplicate posting for term '{}' doc {}, summing tf", term, doc_id);
                    last.tf += tf;
                }
                _ => current_postings.push(Posting::new(doc_id, tf)),
            }

            lines_processed += 1;
            if lines_processed % 10_000_000 == 0 {
                info!(
                    "processed {}M postings, {} terms",
                    lines_processed / 1_000_000,
                    total_terms
                );
            }
        }

        if !current_postings.is_empty() {
            let meta = writer.write_list(&current_postings, &mut doc_lengths)?;
            write_lexicon_entry(&mut lexicon_out, &current_term, &meta)?;
            total_terms += 1;
            total_postings += meta.df as u64;
        }

        writer.finish()?;
        lexicon_out.flush()?;

        // Documents past the last posting-bearing docID keep zero-length slots
        doc_lengths.resize(doc_count as usize, 0);
        self.write_doc_lengths(&doc_lengths)?;

        let total_doc_length: u64 = doc_lengths.iter().map(|&l| l as u64).sum();
        let avgdl = if doc_count > 0 {
            total_doc_length as f64 / doc_count as f64
        } else {
            0.0
        };

        let stats = IndexStats {
            doc_count,
            avgdl,
            total_terms,
            total_postings,
            total_doc_length,
        };
        stats.store(self.out.stats())?;

        info!(
            "merge complete: {} terms, {} postings, {} documents, avgdl {:.2}",
            total_terms, total_postings, doc_count, avgdl
        );
        Ok(stats)
    }

    fn write_doc_lengths(&self, doc_lengths: &[u32]) -> Result<()> {
        let mut out = BufWriter::new(File::create(self.out.doc_len())?);
        for &len in doc_lengths {
            out.write_all(&len.to_le_bytes())?;
        }
        out.flush()?;
        Ok(())
    }
}

fn write_lexicon_entry(out: &mut BufWriter<File>, term: &str, meta: &TermMeta) -> Result<()> {
    writeln!(out, "{}", lexicon::format_entry(term, meta))?;
    Ok(())
}

fn parse_posting_line(line: &str) -> Option<(&str, u32, u32)> {
    let mut fields = line.splitn(3, '\t');
    let term = fields.next()?;
    if term.is_empty() {
        return None;
    }
    let doc_id: u32 = fields.next()?.parse().ok()?;
    let tf: u32 = fields.next()?.trim_end().parse().ok()?;
    Some((term, doc_id, tf))
}
