use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Feed {feed} unavailable at {location}: {reason}")]
    FeedUnavailable {
        feed: String,
        location: String,
        reason: String,
    },

    #[error("Store temporarily unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store corrupted: {0}")]
    StoreCorrupted(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ProcessingError {
    /// Transient failures abandon the current key; anything else stops the run.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProcessingError::StoreUnavailable(_))
    }

    pub fn feed_unavailable(
        feed: impl Into<String>,
        location: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        ProcessingError::FeedUnavailable {
            feed: feed.into(),
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}
