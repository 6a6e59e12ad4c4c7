//! Document-at-a-time query evaluation
//!
//! Opens one cursor per query term and drives all cursors in lockstep.
//! OR visits every document any cursor mentions; AND aligns all cursors on a
//! shared docID before scoring. Candidates feed a K-bounded min-heap keyed
//! by BM25 score.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::IndexPaths;
use crate::error::{CuttleError, Result};
use crate::index::{DocLengths, IndexStats, Lexicon, PostingCursor};
use crate::search::bm25::{self, Bm25Params};

/// Conjunctive or disjunctive evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    And,
    Or,
}

impl FromStr for QueryMode {
    type Err = CuttleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(QueryMode::And),
            "or" => Ok(QueryMode::Or),
            other => Err(CuttleError::InvalidRequest(format!(
                "unknown query mode '{}', expected 'and' or 'or'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryMode::And => write!(f, "and"),
            QueryMode::Or => write!(f, "or"),
        }
    }
}

/// One ranked result
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f64,
}

/// Evaluates queries against a loaded index.
///
/// The lexicon, stats, and doc-length array are immutable and shared across
/// concurrent queries; every query opens its own cursors with private file
/// handles.
pub struct QueryEvaluator {
    lexicon: Arc<Lexicon>,
    stats: Arc<IndexStats>,
    doc_lengths: Arc<DocLengths>,
    paths: IndexPaths,
}

impl QueryEvaluator {
    pub fn new(
        lexicon: Arc<Lexicon>,
        stats: Arc<IndexStats>,
        doc_lengths: Arc<DocLengths>,
        paths: IndexPaths,
    ) -> Self {
        Self {
            lexicon,
            stats,
            doc_lengths,
            paths,
        }
    }

    /// Evaluate a bag of terms and return up to `k` hits, best first.
    ///
    /// Terms are deduplicated here so a repeated term cannot open two cursors
    /// and double its idf. Terms absent from the lexicon contribute nothing;
    /// if none survive, the result is empty (not an error).
    pub fn process_query(
        &self,
        terms: &[String],
        mode: QueryMode,
        k: usize,
        params: &Bm25Params,
    ) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let unique: BTreeSet<&str> = terms.iter().map(|t| t.as_str()).collect();

        let mut cursors: Vec<PostingCursor> = Vec::new();
        let mut idfs: Vec<f64> = Vec::new();
        for term in unique {
            if let Some(meta) = self.lexicon.get(term) {
                let cursor = PostingCursor::open(meta, &self.paths)?;
                if cursor.valid() {
                    idfs.push(bm25::idf(self.stats.doc_count, meta.df));
                    cursors.push(cursor);
                }
            }
        }

        if cursors.is_empty() {
            return Ok(Vec::new());
        }

        let heap = match mode {
            QueryMode::Or => self.evaluate_or(&mut cursors, &idfs, k, params)?,
            QueryMode::And => self.evaluate_and(&mut cursors, &idfs, k, params)?,
        };

        let mut results: Vec<SearchHit> = heap
            .into_iter()
            .map(|Reverse(entry)| SearchHit {
                doc_id: entry.doc_id,
                score: entry.score,
            })
            .collect();
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.doc_id.cmp(&b.doc_id))
        });
        Ok(results)
    }

    fn evaluate_or(
        &self,
        cursors: &mut [PostingCursor],
        idfs: &[f64],
        k: usize,
        params: &Bm25Params,
    ) -> Result<TopK> {
        let mut heap = TopK::with_capacity(k);

        loop {
            let candidate = cursors
                .iter()
                .filter(|c| c.valid())
                .map(|c| c.doc())
                .min();
            let Some(doc_id) = candidate else { break };

            let dl = self.doc_lengths.get(doc_id);
            let mut score = 0.0;
            for (cursor, &idf) in cursors.iter_mut().zip(idfs) {
                if cursor.valid() && cursor.doc() == doc_id {
                    score += bm25::score(idf, cursor.freq(), dl, self.stats.avgdl, params);
                    cursor.next()?;
                }
            }

            offer(&mut heap, k, doc_id, score);
        }

        Ok(heap)
    }

    fn evaluate_and(
        &self,
        cursors: &mut [PostingCursor],
        idfs: &[f64],
        k: usize,
        params: &Bm25Params,
    ) -> Result<TopK> {
        let mut heap = TopK::with_capacity(k);

        'daat: loop {
            if cursors.iter().any(|c| !c.valid()) {
                break;
            }
            let candidate = cursors.iter().map(|c| c.doc()).max().expect("non-empty");

            // Align every lagging cursor on the candidate. A cursor that
            // lands past it raises the bar; re-selecting the maximum next
            // iteration is what guarantees forward progress.
            let mut aligned = true;
            for cursor in cursors.iter_mut() {
                if cursor.doc() < candidate {
                    if !cursor.next_geq(candidate)? {
                        break 'daat;
                    }
                    if cursor.doc() > candidate {
                        aligned = false;
                    }
                }
            }
            if !aligned {
                continue;
            }

            let dl = self.doc_lengths.get(candidate);
            let mut score = 0.0;
            for (cursor, &idf) in cursors.iter().zip(idfs) {
                score += bm25::score(idf, cursor.freq(), dl, self.stats.avgdl, params);
            }
            offer(&mut heap, k, candidate, score);

            for cursor in cursors.iter_mut() {
                cursor.next()?;
            }
        }

        Ok(heap)
    }
}

type TopK = BinaryHeap<Reverse<HeapEntry>>;

/// Heap key: lowest score at the top so it can be evicted in O(log k).
/// Equal scores evict the larger docID, which makes ties deterministic.
#[derive(Debug, PartialEq)]
struct HeapEntry {
    score: f64,
    doc_id: u32,
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score
            .total_cmp(&other.score)
            .then(other.doc_id.cmp(&self.doc_id))
    }
}

fn offer(heap: &mut TopK, k: usize, doc_id: u32, score: f64) {
    if heap.len() < k {
        heap.push(Reverse(HeapEntry { score, doc_id }));
    } else if let Some(Reverse(min)) = heap.peek() {
        if score > min.score {
            heap.pop();
            heap.push(Reverse(HeapEntry { score, doc_id }));
        }
    }
}
