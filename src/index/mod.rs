//! On-disk inverted index: construction and read access
//!
//! The merger turns a globally-sorted postings stream into four immutable
//! artifacts (two block-compressed posting files, the lexicon, and the
//! statistics/doc-length sidecars); the loaders and the cursor give the
//! query process read access to them.

pub mod cursor;
pub mod docs;
pub mod lexicon;
pub mod merger;
pub mod stats;
pub mod varbyte;
pub mod writer;

pub use cursor::PostingCursor;
pub use docs::{DocContentStore, DocLengths, DocTable};
pub use lexicon::{Lexicon, TermMeta};
pub use merger::IndexMerger;
pub use stats::IndexStats;
pub use writer::{Posting, PostingsWriter};
