use thiserror::Error;

/// Shared error type used across all poolwatch crates.
#[derive(Debug, Error)]
pub enum AppError {
    /// The snapshot store could not be reached, even after one reconnect.
    #[error("Snapshot store unavailable: {0}")]
    StoreUnavailable(String),

    /// The scraper has not recorded any fetch round yet.
    #[error("No pool fetch has been recorded yet")]
    NoRecentFetch,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] eyre::Error),
}
