use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrtvError {
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("Access denied, likely due to geoblocking. Ensure your IP is recognized as being in Denmark by using a proxy or a VPN.")]
    Geoblocked,

    #[error("Couldn't retrieve anonymous token")]
    TokenRetrieval,

    #[error("Invalid DR TV URL: {0}")]
    InvalidUrl(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    #[error("Could not find {0} MAP URI")]
    MapSegmentNotFound(String),

    #[error("Container format '{0}' not supported with subtitles")]
    ContainerNotSupported(String),

    #[error("Failed to merge streams: {0}")]
    MergeError(String),

    #[error("Naming template key '{0}' is unknown or has no value")]
    TemplateKey(String),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    MissingExecutable(#[from] which::Error),
}

pub type DrtvResult<T> = Result<T, DrtvError>;
