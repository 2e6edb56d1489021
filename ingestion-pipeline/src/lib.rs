#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod builder;
pub mod chunker;
pub mod normalize;

pub use builder::{BuildSummary, VectorStoreBuilder};
pub use chunker::{TokenChunker, TokenCodec};
pub use normalize::normalize_whitespace;
