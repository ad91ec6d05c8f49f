use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A uniqueness claim held by the store rejected the write
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Invalid document identifier: {0}")]
    InvalidId(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether the error comes from the store rather than the request
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Error::JsonSerialization(_) | Error::Redis(_) | Error::Other(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
