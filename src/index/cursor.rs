//! Posting-list cursor with block-at-a-time decoding
//!
//! One cursor per query term, each with its own pair of file handles:
//! cursors within a query interleave seeks, so a shared handle would corrupt
//! reads. A cursor decodes lazily, one aligned block pair at a time, and
//! exposes the classic DAAT surface: `doc()`, `freq()`, `valid()`, `next()`,
//! `next_geq(target)`.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};

use crate::config::IndexPaths;
use crate::error::{CuttleError, Result};
use crate::index::lexicon::TermMeta;
use crate::index::varbyte;

#[derive(Debug)]
pub struct PostingCursor {
    docids: BufReader<File>,
    freqs: BufReader<File>,

    total_blocks: u32,
    current_block: u32,

    doc_buf: Vec<u32>,
    freq_buf: Vec<u32>,
    pos: usize,

    current_doc: u32,
    current_freq: u32,
    valid: bool,
}

impl PostingCursor {
    /// Open a cursor over one term's posting list.
    ///
    /// Seeks both files to the term's offsets and decodes the first block.
    /// A term with zero blocks yields an immediately-invalid cursor.
    pub fn open(meta: &TermMeta, paths: &IndexPaths) -> Result<Self> {
        let mut docids = BufReader::new(File::open(paths.docids())?);
        let mut freqs = BufReader::new(File::open(paths.freqs())?);
        docids.seek(SeekFrom::Start(meta.docids_offset))?;
        freqs.seek(SeekFrom::Start(meta.freqs_offset))?;

        let mut cursor = Self {
            docids,
            freqs,
            total_blocks: meta.blocks,
            current_block: 0,
            doc_buf: Vec::new(),
            freq_buf: Vec::new(),
            pos: 0,
            current_doc: 0,
            current_freq: 0,
            valid: false,
        };

        if cursor.load_next_block()? {
            cursor.set_current(0);
        }
        Ok(cursor)
    }

    /// Current docID. Unspecified once `valid()` is false.
    pub fn doc(&self) -> u32 {
        self.current_doc
    }

    /// Current term frequency. Unspecified once `valid()` is false.
    pub fn freq(&self) -> u32 {
        self.current_freq
    }

    /// Whether the cursor points at a posting.
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Advance to the next posting. Returns whether the cursor is still valid.
    pub fn next(&mut self) -> Result<bool> {
        if !self.valid {
            return Ok(false);
        }

        self.pos += 1;
        if self.pos < self.doc_buf.len() {
            self.set_current(self.pos);
            return Ok(true);
        }

        if self.load_next_block()? {
            self.set_current(0);
            Ok(true)
        } else {
            self.valid = false;
            Ok(false)
        }
    }

    /// Advance to the first posting with docID >= `target`.
    ///
    /// Returns true iff such a posting exists; otherwise the cursor is
    /// exhausted. Whole blocks whose decoded maximum falls short of the
    /// target are skipped without a per-posting walk.
    pub fn next_geq(&mut self, target: u32) -> Result<bool> {
        while self.valid {
            // Last docID of the decoded block bounds everything in it
            let block_max = *self.doc_buf.last().expect("loaded block is non-empty");
            if block_max < target {
                if !self.load_next_block()? {
                    self.valid = false;
                    return Ok(false);
                }
                self.pos = 0;
                continue;
            }

            // Target lies within this block at or after the current position
            let skip = self.doc_buf[self.pos..].partition_point(|&d| d < target);
            self.set_current(self.pos + skip);
            return Ok(true);
        }
        Ok(false)
    }

    fn set_current(&mut self, pos: usize) {
        self.pos = pos;
        self.current_doc = self.doc_buf[pos];
        self.current_freq = self.freq_buf[pos];
        self.valid = true;
    }

    /// Decode the next aligned block pair into the buffers.
    ///
    /// Returns false when the list is exhausted. Any decode failure,
    /// including a truncated stream, invalidates the cursor for good.
    fn load_next_block(&mut self) -> Result<bool> {
        match self.read_block() {
            Ok(more) => Ok(more),
            Err(e) => {
                self.valid = false;
                Err(e)
            }
        }
    }

    /// A length disagreement between the two streams means the index is
    /// corrupt and fails hard.
    fn read_block(&mut self) -> Result<bool> {
        if self.current_block >= self.total_blocks {
            return Ok(false);
        }

        let block_len = varbyte::decode(&mut self.docids)?;
        let freq_block_len = varbyte::decode(&mut self.freqs)?;
        if block_len != freq_block_len {
            return Err(CuttleError::Corrupt(format!(
                "block length mismatch at block {}: docids={}, freqs={}",
                self.current_block, block_len, freq_block_len
            )));
        }
        if block_len == 0 {
            return Err(CuttleError::Corrupt(format!(
                "empty block at block {}",
                self.current_block
            )));
        }

        self.doc_buf.clear();
        self.doc_buf.reserve(block_len as usize);
        let mut prev = 0u32;
        for i in 0..block_len {
            let gap = varbyte::decode(&mut self.docids)?;
            let doc_id = if i == 0 { gap } else { prev + gap };
            self.doc_buf.push(doc_id);
            prev = doc_id;
        }

        self.freq_buf.clear();
        self.freq_buf.reserve(block_len as usize);
        for _ in 0..block_len {
            self.freq_buf.push(varbyte::decode(&mut self.freqs)?);
        }

        self.pos = 0;
        self.current_block += 1;
        Ok(true)
    }
}
