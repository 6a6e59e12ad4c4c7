pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod indexer;
pub mod search;
pub mod tokenizer;

pub use api::{create_router, AppState};
pub use config::{CollectionPaths, IndexPaths, IndexerConfig, BLOCK_SIZE, DEFAULT_TOP_K};
pub use engine::{QueryResponse, RankedDoc, SearchEngine};
pub use error::{CuttleError, Result};
pub use index::{IndexMerger, IndexStats, Lexicon, PostingCursor, TermMeta};
pub use indexer::CollectionIndexer;
pub use search::{Bm25Params, QueryEvaluator, QueryMode, SearchHit};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
