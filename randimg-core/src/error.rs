use thiserror::Error;

/// Errors raised while fetching a random image from an external source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image source returned status: {0}")]
    Status(u16),

    #[error("Failed to parse image source response: {0}")]
    Parse(String),

    #[error("Image source unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;
