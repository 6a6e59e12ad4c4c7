//! Loaded-index facade shared by the REPL and the HTTP server
//!
//! Owns everything a query needs: the lexicon, collection statistics, the
//! doc-length array, and (optionally) the document table and content store
//! for original ids and snippets. All of it is immutable after `open`, so a
//! single engine serves concurrent queries without locks; only the content
//! file handle is mutex-guarded, inside `DocContentStore`.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::config::{CollectionPaths, IndexPaths};
use crate::error::Result;
use crate::index::{DocContentStore, DocLengths, DocTable, IndexStats, Lexicon};
use crate::search::{snippet, Bm25Params, QueryEvaluator, QueryMode};
use crate::tokenizer;

/// One ranked document with display metadata attached
#[derive(Clone, Debug, Serialize)]
pub struct RankedDoc {
    pub rank: usize,
    pub doc_id: u32,
    pub score: f64,
    pub original_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Full response for one query
#[derive(Clone, Debug, Serialize)]
pub struct QueryResponse {
    pub query_terms: Vec<String>,
    pub mode: QueryMode,
    pub query_time_ms: u64,
    pub num_results: usize,
    pub results: Vec<RankedDoc>,
}

pub struct SearchEngine {
    evaluator: QueryEvaluator,
    stats: Arc<IndexStats>,
    lexicon: Arc<Lexicon>,
    doc_table: Option<DocTable>,
    content: Option<DocContentStore>,
}

impl SearchEngine {
    /// Load an index directory. When `docs_dir` is given, the document table
    /// and content store from the Phase-1 output are loaded as well, enabling
    /// original ids and snippets in results.
    pub fn open(index_dir: &Path, docs_dir: Option<&Path>) -> Result<Self> {
        let paths = IndexPaths::new(index_dir);

        info!("loading index from {}", index_dir.display());
        let lexicon = Arc::new(Lexicon::load(paths.lexicon())?);
        let stats = Arc::new(IndexStats::load(paths.stats())?);
        let doc_lengths = Arc::new(DocLengths::load(paths.doc_len())?);

        let (doc_table, content) = match docs_dir {
            Some(dir) => {
                let docs = CollectionPaths::new(dir);
                let table = DocTable::load(docs.doc_table())?;
                let content = DocContentStore::open(docs.doc_offset(), docs.doc_content())?;
                (Some(table), Some(content))
            }
            None => (None, None),
        };

        let evaluator = QueryEvaluator::new(
            Arc::clone(&lexicon),
            Arc::clone(&stats),
            doc_lengths,
            paths,
        );

        Ok(Self {
            evaluator,
            stats,
            lexicon,
            doc_table,
            content,
        })
    }

    /// Tokenize free text into query terms with the indexer's rules.
    pub fn query_terms(&self, query: &str) -> Vec<String> {
        tokenizer::tokenize(query)
    }

    /// Run a query end to end: tokenize, evaluate, attach metadata.
    pub fn search(
        &self,
        query: &str,
        mode: QueryMode,
        k: usize,
        params: &Bm25Params,
    ) -> Result<QueryResponse> {
        let start = Instant::now();
        let query_terms = self.query_terms(query);
        let hits = self
            .evaluator
            .process_query(&query_terms, mode, k, params)?;

        let mut results = Vec::with_capacity(hits.len());
        for (i, hit) in hits.iter().enumerate() {
            let original_id = self
                .doc_table
                .as_ref()
                .map(|t| t.original_id(hit.doc_id).to_string())
                .unwrap_or_default();

            let snippet = match &self.content {
                Some(store) => store
                    .read(hit.doc_id)?
                    .map(|text| snippet::generate(&text, &query_terms)),
                None => None,
            };

            results.push(RankedDoc {
                rank: i + 1,
                doc_id: hit.doc_id,
                score: hit.score,
                original_id,
                snippet,
            });
        }

        Ok(QueryResponse {
            query_terms,
            mode,
            query_time_ms: start.elapsed().as_millis() as u64,
            num_results: results.len(),
            results,
        })
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn term_count(&self) -> usize {
        self.lexicon.len()
    }

    /// Whether snippets can be served
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}
