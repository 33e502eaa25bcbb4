//! Error types for the permessage-deflate transform.

use thiserror::Error;

/// Main error type for all transform operations.
#[derive(Debug, Error)]
pub enum DeflateError {
    /// The deflate encoder rejected its input.
    #[error("compression failed: {0}")]
    Compress(#[from] flate2::CompressError),

    /// The inbound payload is not a valid deflate stream.
    ///
    /// The frame must be rejected by the caller; this is typically a
    /// connection-level protocol violation.
    #[error("malformed deflate stream: {0}")]
    Decompress(#[from] flate2::DecompressError),

    /// The codec reported a state that cannot occur on a sync-flushed
    /// message stream (e.g. a premature stream end while compressing).
    #[error("corrupt deflate stream")]
    CorruptStream,

    /// A text payload is not valid UTF-8.
    #[error("invalid UTF-8 in text payload: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The buffer pool refused to rent another segment.
    ///
    /// Fatal to the current operation; not retried.
    #[error("buffer pool exhausted: {outstanding} segments outstanding (limit {limit})")]
    PoolExhausted {
        /// Segments currently rented out.
        outstanding: usize,
        /// Configured outstanding-segment limit.
        limit: usize,
    },
}

/// Result type alias using [`DeflateError`].
pub type Result<T> = std::result::Result<T, DeflateError>;
