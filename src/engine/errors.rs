use std::io;
use thiserror::Error;
use tracing::{debug, error};

/// Errors raised by the durable block queue store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Bucket not found: {0}")]
    BucketNotFound(&'static str),

    #[error("Malformed entry key: expected at least 8 bytes, got {0}")]
    MalformedKey(usize),

    #[error("Entry serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Block ID is not valid UTF-8: {0}")]
    InvalidBlockId(#[from] std::string::FromUtf8Error),
}

/// Errors surfaced by the compactor entry points driven from the raft apply loop.
#[derive(Debug, Error)]
pub enum CompactionError {
    #[error("Block queue store error: {0}")]
    Store(#[from] StoreError),
}

impl CompactionError {
    pub fn log_error(&self) {
        match self {
            CompactionError::Store(e) => {
                error!(target: "compaction::compactor", "Block queue store failed: {}", e);
                debug!(target: "compaction::compactor", "Block queue store error details: {:?}", e);
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid compaction config: {0}")]
    Invalid(String),
}
