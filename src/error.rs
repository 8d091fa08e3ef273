//! Error types for model query operations

use thiserror::Error;

/// Main error type for earth model grid operations
#[derive(Error, Debug)]
pub enum GridError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Storage(String),

    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("attribute type mismatch: {0}")]
    AttributeType(String),

    #[error("missing metadata:\n{0}")]
    MissingMetadata(String),

    #[error("coordinate system error: {0}")]
    Crs(String),

    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("no block contains elevation {0} (depth coverage of model violated)")]
    BlockNotFound(f64),

    #[error("invalid operation: {0}")]
    Usage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Specialized Result type for model query operations
pub type Result<T> = std::result::Result<T, GridError>;

impl From<bincode::Error> for GridError {
    fn from(err: bincode::Error) -> Self {
        GridError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Serialization(err.to_string())
    }
}

/// Accumulator for metadata validation problems.
///
/// Metadata loading reads everything it can and records every missing or
/// malformed item here, so the caller sees the complete list in a single
/// [`GridError::MissingMetadata`] instead of only the first failure.
#[derive(Debug, Default)]
pub struct MetadataErrors {
    missing: Vec<String>,
}

impl MetadataErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a missing or invalid metadata item by its container path.
    pub fn add(&mut self, item: impl Into<String>) {
        self.missing.push(item.into());
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }

    /// Finish collecting: `Ok(())` if nothing was recorded, otherwise one
    /// error naming every item, one per line.
    pub fn into_result(self) -> Result<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(GridError::MissingMetadata(self.missing.join("\n")))
        }
    }
}
