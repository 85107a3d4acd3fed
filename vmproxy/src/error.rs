//! Error types for proxy client operations.

use vmproxy_proto::FrameType;

/// Alias for `Result<T, vmproxy::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] vmproxy_proto::Error),

    /// The proxy answered with an in-error response.
    #[error("proxy: {0}")]
    Proxy(String),

    /// The proxy sent a frame the client was not waiting for.
    #[error("unexpected {frame_type} frame with opcode {opcode}")]
    UnexpectedFrame {
        /// Type of the offending frame.
        frame_type: FrameType,
        /// Its raw opcode.
        opcode: u8,
    },

    /// Connecting to the proxy socket failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Protocol(e.into())
    }
}
