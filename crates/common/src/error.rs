use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A price or trend source could not be fetched. Non-fatal: the fetch
    /// layer degrades the source to an empty series and continues.
    #[error("Provider fetch error: {0}")]
    ProviderFetch(String),

    /// The requested keyword column is absent from the trend data. Local to
    /// the correlator; the pipeline maps it to an undefined correlation.
    #[error("Column '{0}' not found in trend data")]
    MissingColumn(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
