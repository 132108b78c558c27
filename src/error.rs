use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid path `{0}`")]
    InvalidPath(String),

    #[error("failed to start search worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("search worker is not running")]
    WorkerStopped,

    #[error("configuration error: {0}")]
    Config(#[from] confique::Error),

    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A syntax error reported by the JSON decoder.
///
/// `line` and `column` are 1-based and point at the character where decoding
/// stopped. They are zero when the decoder could not attribute a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<&serde_json::Error> for DecodeError {
    fn from(e: &serde_json::Error) -> Self {
        // serde_json appends " at line X column Y" to its Display output
        let full = e.to_string();
        let message = match full.rfind(" at line ") {
            Some(idx) if e.line() > 0 => full[..idx].to_string(),
            _ => full,
        };
        Self {
            message,
            line: e.line(),
            column: e.column(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (line {}, column {})", self.message, self.line, self.column)
        }
    }
}

impl std::error::Error for DecodeError {}
