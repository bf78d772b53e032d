//! Error types for tightloop.

use thiserror::Error;

/// Error type for stream and configuration operations.
///
/// Caller contract violations (misaligned offsets, unsupported seeks, odd
/// window sizes) are not represented here: those panic.
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying source has no more bytes to give.
    #[error("End of stream")]
    EndOfStream,

    /// Error reported by the underlying byte source, passed through unchanged.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid loop range: start={start}, end={end}")]
    InvalidLoopRange { start: u64, end: u64 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Error::EndOfStream)
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(inner) => inner,
            Error::EndOfStream => {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, Error::EndOfStream)
            }
            other => std::io::Error::new(std::io::ErrorKind::InvalidInput, other),
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
