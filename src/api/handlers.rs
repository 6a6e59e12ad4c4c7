use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::error::CuttleError;
use crate::search::{Bm25Params, QueryMode};

use super::router::AppState;
use super::types::{ErrorResponse, SearchParams, StatsResponse};

/// Error wrapper for API handlers
pub enum ApiError {
    BadRequest(String),
    Engine(CuttleError),
}

impl From<CuttleError> for ApiError {
    fn from(e: CuttleError) -> Self {
        ApiError::Engine(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Engine(e) => {
                let error_type = match &e {
                    CuttleError::Corrupt(_) | CuttleError::InvalidIndexFile { .. } => {
                        "index_corruption"
                    }
                    CuttleError::InvalidRequest(_) => "invalid_request",
                    CuttleError::Io(_) => "io_error",
                    CuttleError::Internal(_) => "internal_error",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, error_type, e.to_string())
            }
        };

        let body = ErrorResponse::new(error_type, message);
        (status, Json(body)).into_response()
    }
}

/// GET /search: run one query
///
/// BM25 parameters are validated here and passed by value into the
/// evaluator; there is no server-global parameter state to update.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let mode: QueryMode = params
        .mode
        .parse()
        .map_err(|e: CuttleError| ApiError::BadRequest(e.to_string()))?;

    if params.k == 0 || params.k > 1000 {
        return Err(ApiError::BadRequest(format!(
            "k must be between 1 and 1000, got {}",
            params.k
        )));
    }

    let defaults = Bm25Params::default();
    let k1 = params.k1.unwrap_or(defaults.k1);
    let b = params.b.unwrap_or(defaults.b);
    if !k1.is_finite() || k1 < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "k1 must be non-negative, got {}",
            k1
        )));
    }
    if !b.is_finite() || !(0.0..=1.0).contains(&b) {
        return Err(ApiError::BadRequest(format!("b must be in [0, 1], got {}", b)));
    }

    let bm25 = Bm25Params::new(k1, b);
    let response = state.engine.search(&params.q, mode, params.k, &bm25)?;
    Ok(Json(response))
}

/// GET /stats: collection statistics
pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let s = state.engine.stats();
    Json(StatsResponse {
        doc_count: s.doc_count,
        avgdl: s.avgdl,
        total_terms: s.total_terms,
        total_postings: s.total_postings,
        total_doc_length: s.total_doc_length,
        lexicon_terms: state.engine.term_count(),
    })
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
