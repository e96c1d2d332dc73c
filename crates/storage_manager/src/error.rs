//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
