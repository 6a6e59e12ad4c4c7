//! Block posting writer
//!
//! Serializes one term's posting list as a run of fixed-size blocks across
//! the two posting files. Each block is `VarByte(block_len)` followed by
//! `block_len` values: gap-coded docIDs on one side, plain term frequencies
//! on the other. The gap base resets to zero at every block boundary, so a
//! block can be decoded without looking at its predecessor.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::config::{IndexPaths, BLOCK_SIZE};
use crate::error::Result;
use crate::index::lexicon::TermMeta;
use crate::index::varbyte;

/// A single `(docID, tf)` pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: u32,
    pub tf: u32,
}

impl Posting {
    pub fn new(doc_id: u32, tf: u32) -> Self {
        Self { doc_id, tf }
    }
}

/// Writer over the two posting files, tracking byte offsets as it goes.
pub struct PostingsWriter {
    docids: BufWriter<File>,
    freqs: BufWriter<File>,
    docids_offset: u64,
    freqs_offset: u64,
}

impl PostingsWriter {
    /// Create (truncating) both posting files in the index directory.
    pub fn create(paths: &IndexPaths) -> Result<Self> {
        std::fs::create_dir_all(&paths.dir)?;
        Ok(Self {
            docids: BufWriter::new(File::create(paths.docids())?),
            freqs: BufWriter::new(File::create(paths.freqs())?),
            docids_offset: 0,
            freqs_offset: 0,
        })
    }

    /// Write one term's complete posting list and return its lexicon record.
    ///
    /// Postings must be strictly ascending in docID (the merger guarantees
    /// this). `doc_lengths` is grown as needed and each tf is added to its
    /// document's slot.
    pub fn write_list(&mut self, postings: &[Posting], doc_lengths: &mut Vec<u32>) -> Result<TermMeta> {
        debug_assert!(postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id));

        let docids_offset = self.docids_offset;
        let freqs_offset = self.freqs_offset;
        let mut cf: u64 = 0;
        let mut blocks: u32 = 0;

        for block in postings.chunks(BLOCK_SIZE) {
            self.write_docids_block(block)?;
            cf += self.write_freqs_block(block, doc_lengths)?;
            blocks += 1;
        }

        Ok(TermMeta {
            df: postings.len() as u32,
            cf,
            docids_offset,
            freqs_offset,
            blocks,
        })
    }

    fn write_docids_block(&mut self, block: &[Posting]) -> Result<()> {
        self.docids_offset += varbyte::encode(&mut self.docids, block.len() as u32)? as u64;

        // First gap is the absolute docID; the base resets per block
        let mut prev = 0u32;
        for (i, posting) in block.iter().enumerate() {
            let gap = if i == 0 { posting.doc_id } else { posting.doc_id - prev };
            self.docids_offset += varbyte::encode(&mut self.docids, gap)? as u64;
            prev = posting.doc_id;
        }
        Ok(())
    }

    fn write_freqs_block(&mut self, block: &[Posting], doc_lengths: &mut Vec<u32>) -> Result<u64> {
        self.freqs_offset += varbyte::encode(&mut self.freqs, block.len() as u32)? as u64;

        let mut cf = 0u64;
        for posting in block {
            self.freqs_offset += varbyte::encode(&mut self.freqs, posting.tf)? as u64;
            cf += posting.tf as u64;

            let slot = posting.doc_id as usize;
            if slot >= doc_lengths.len() {
                doc_lengths.resize(slot + 1, 0);
            }
            doc_lengths[slot] += posting.tf;
        }
        Ok(cf)
    }

    /// Flush both files.
    pub fn finish(mut self) -> Result<()> {
        self.docids.flush()?;
        self.freqs.flush()?;
        Ok(())
    }
}
