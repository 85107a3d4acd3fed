//! Error types for frame encoding and decoding.

use std::io;

/// Alias for `Result<T, vmproxy_proto::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the frame codec.
///
/// Every error is terminal for the call that produced it. A failed read never
/// yields a frame and a failed write never emits a byte.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The source ended before a complete header or payload was read.
    #[error("frame truncated")]
    Truncated,

    /// The header carries a version this implementation does not speak.
    #[error("frame: unsupported version {0:#06x}")]
    InvalidVersion(u16),

    /// The header length is below the minimum, unaligned, or too large.
    #[error("frame: invalid header length {0}")]
    InvalidHeaderLength(usize),

    /// The type ordinal is outside [`FrameType`](crate::FrameType).
    #[error("frame: invalid type {0}")]
    InvalidType(u8),

    /// The declared payload length disagrees with the payload.
    #[error("frame: bad payload length {declared} (payload is {actual} bytes)")]
    InvalidPayloadLength {
        /// Length recorded in the header.
        declared: u32,
        /// Number of payload bytes actually present.
        actual: usize,
    },

    /// A JSON payload could not be serialized or parsed.
    #[error("frame: payload serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A decoded payload is well-formed JSON but semantically invalid.
    #[error("frame: invalid payload: {0}")]
    InvalidPayload(String),

    /// Any other failure of the underlying source or sink.
    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(e)
        }
    }
}

impl Error {
    /// Returns `true` if the error was caused by the peer closing the stream.
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated)
    }
}
