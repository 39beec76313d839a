use thiserror::Error;

/// LINE Messaging API errors
#[derive(Error, Debug)]
pub enum LineError {
    #[error("Request Error: {0}")]
    RequestError(String),

    #[error("Response Error: {0}")]
    ResponseError(String),

    #[error("HTTP Error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
}

/// Result type for LINE Messaging API operations
pub type LineResult<T> = Result<T, LineError>;
