use thiserror::Error;

#[derive(Error, Debug)]
pub enum DropInError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Selection rejected while {0}")]
    SelectionRejected(String),
    #[error("Cancel rejected while {0}")]
    CancelRejected(String),
    #[error("Resume context lost: {0}")]
    LostContext(String),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, DropInError>;
