pub mod config;
pub mod embedding;
pub mod vector_ops;
