use std::path::PathBuf;
use thiserror::Error;

use crate::Collection;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Index on collection {collection} has an empty name")]
    EmptyName { collection: Collection },

    #[error("Index {name} on collection {collection} has an empty key pattern")]
    EmptyKeyPattern { collection: Collection, name: String },

    #[error("Duplicate index name {name} on collection {collection}")]
    DuplicateName { collection: Collection, name: String },

    #[error("Indexes {first} and {second} on collection {collection} share the same key pattern")]
    DuplicateKeyPattern { collection: Collection, first: String, second: String },

    #[error("TTL index {name} on collection {collection} must index a single ascending field")]
    InvalidTtl { collection: Collection, name: String },

    #[error("Failed to parse index layout: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to read index layout {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}
