use thiserror::Error;

#[derive(Error, Debug)]
pub enum KagamiError {
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("Invalid sidx box: {0}")]
    InvalidSidx(String),

    #[error("No sidx box found in {0} bytes")]
    SidxNotFound(usize),

    #[error("Invalid cache key: {0}")]
    InvalidCacheKey(String),

    #[error("Format provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[cfg(feature = "opendal")]
    #[error(transparent)]
    OpendalError(#[from] opendal::Error),
}

pub type KagamiResult<T> = Result<T, KagamiError>;
