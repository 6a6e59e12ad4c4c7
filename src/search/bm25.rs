//! BM25 ranking function
//!
//! Reference: Robertson & Zaragoza, "The Probabilistic Relevance Framework:
//! BM25 and Beyond".

use serde::{Deserialize, Serialize};

/// BM25 parameters, carried per request by value.
///
/// `k1` saturates term frequency (sensible range 0.8..1.2), `b` controls
/// document length normalization (sensible range 0.3..0.7).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 0.9, b: 0.4 }
    }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Self {
        Self { k1, b }
    }
}

/// Inverse document frequency with Robertson/Spärck Jones +0.5 smoothing.
///
/// The `+ 1` inside the log keeps the value non-negative even for terms
/// appearing in more than half the collection.
pub fn idf(doc_count: u64, df: u32) -> f64 {
    if df == 0 || doc_count == 0 {
        return 0.0;
    }
    ((doc_count as f64 - df as f64 + 0.5) / (df as f64 + 0.5) + 1.0).ln()
}

/// Per-(term, document) BM25 contribution.
pub fn score(idf: f64, tf: u32, dl: u32, avgdl: f64, params: &Bm25Params) -> f64 {
    if tf == 0 || dl == 0 || avgdl == 0.0 {
        return 0.0;
    }

    let tf = tf as f64;
    let numerator = tf * (params.k1 + 1.0);
    let denominator = tf + params.k1 * (1.0 - params.b + params.b * dl as f64 / avgdl);
    idf * (numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idf_monotone_in_rarity() {
        // Rarer terms score higher
        let common = idf(1000, 500);
        let rare = idf(1000, 5);
        assert!(rare > common);
        assert!(common > 0.0);
    }

    #[test]
    fn test_idf_guards() {
        assert_eq!(idf(0, 5), 0.0);
        assert_eq!(idf(1000, 0), 0.0);
    }

    #[test]
    fn test_idf_non_negative_for_frequent_terms() {
        // df close to N: the +1 smoothing keeps idf above zero
        assert!(idf(100, 99) > 0.0);
        assert!(idf(100, 100) > 0.0);
    }

    #[test]
    fn test_score_basic_shape() {
        let params = Bm25Params::default();
        let idf_val = idf(1000, 10);

        let low_tf = score(idf_val, 1, 100, 100.0, &params);
        let high_tf = score(idf_val, 5, 100, 100.0, &params);
        assert!(high_tf > low_tf);
        assert!(low_tf > 0.0);

        // Longer documents are normalized down
        let short_doc = score(idf_val, 2, 50, 100.0, &params);
        let long_doc = score(idf_val, 2, 200, 100.0, &params);
        assert!(short_doc > long_doc);
    }

    #[test]
    fn test_score_guards() {
        let params = Bm25Params::default();
        assert_eq!(score(1.0, 0, 10, 10.0, &params), 0.0);
        assert_eq!(score(1.0, 3, 0, 10.0, &params), 0.0);
        assert_eq!(score(1.0, 3, 10, 0.0, &params), 0.0);
    }

    #[test]
    fn test_score_saturates_with_tf() {
        // Each additional occurrence is worth less than the one before it
        let params = Bm25Params::default();
        let idf_val = idf(1000, 10);
        let s1 = score(idf_val, 1, 100, 100.0, &params);
        let s2 = score(idf_val, 2, 100, 100.0, &params);
        let s3 = score(idf_val, 3, 100, 100.0, &params);
        assert!(s2 - s1 > s3 - s2);
    }
}
