use thiserror::Error;

/// Errors that can occur while crawling a drive and building a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Not found in remote store: {id}")]
    NotFound { id: String },

    #[error("Access denied by remote store for {id}: {message}")]
    Forbidden { id: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited by remote store: {message}")]
    RateLimited { message: String },

    #[error("Invalid remote response: {message}")]
    InvalidStructure { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Crawl deadline of {seconds}s exceeded")]
    DeadlineExceeded { seconds: u64 },
}

impl CatalogError {
    /// Whether retrying the same request later could plausibly succeed.
    ///
    /// Missing or forbidden entries are permanent; network failures and
    /// rate limiting are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CatalogError::Network(_) | CatalogError::RateLimited { .. }
        )
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
