pub mod metadata;
pub mod types;
pub mod vector_index;
