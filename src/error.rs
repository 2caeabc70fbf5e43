use thiserror::Error;

use crate::protocol::ResponseError;

/// Errors raised while decoding the wire framing or the JSON inside it.
#[derive(Error, Debug)]
pub enum FramingError {
    #[error("no Content-Length header found")]
    MissingContentLength,

    #[error("invalid Content-Length header: {0:?}")]
    InvalidContentLength(String),

    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    #[error("header line longer than {max} bytes")]
    HeaderLineTooLong { max: usize },

    #[error("header block is not valid UTF-8")]
    NonUtf8Header,

    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("message body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open the child's {0} stream")]
    StreamUnavailable(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("server returned error {0}")]
    Protocol(ResponseError),

    #[error("deadline exceeded while waiting for {operation}")]
    DeadlineExceeded { operation: String },

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("session stream is desynchronized after an abandoned or failed read or write")]
    Desynchronized,

    #[error("session is closed")]
    Closed,
}

impl ClientError {
    pub(crate) fn deadline(operation: impl Into<String>) -> Self {
        ClientError::DeadlineExceeded {
            operation: operation.into(),
        }
    }

    /// True when the error leaves either stream at an unknown position.
    pub fn desynchronizes(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_) | ClientError::Framing(_) | ClientError::DeadlineExceeded { .. }
        )
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
