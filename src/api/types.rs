use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_TOP_K;

/// Query parameters accepted by GET /search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// Free-text query
    pub q: String,
    /// "and" or "or"
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Number of results
    #[serde(default = "default_top_k")]
    pub k: usize,
    /// BM25 k1 override
    #[serde(default)]
    pub k1: Option<f64>,
    /// BM25 b override
    #[serde(default)]
    pub b: Option<f64>,
}

fn default_mode() -> String {
    "or".to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Body of GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub doc_count: u64,
    pub avgdl: f64,
    pub total_terms: u64,
    pub total_postings: u64,
    pub total_doc_length: u64,
    pub lexicon_terms: usize,
}

/// Error body returned for rejected or failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
