//! Wire protocol between a VM proxy and its clients (runtimes and shims).
//!
//! Every message is a [`Frame`]: a big-endian header carrying a version,
//! header length, [`FrameType`], type-scoped opcode, flags and payload
//! length, followed by the raw payload. Command and response payloads are
//! JSON documents described in [`payload`]; stream payloads are raw bytes.
//!
//! The codec works over any blocking [`std::io::Read`] / [`std::io::Write`]
//! pair (Unix socket, serial port, pipe) and never returns or emits a
//! partially valid frame.

mod codec;
mod error;
mod frame;
pub mod header;
pub mod payload;
mod types;

pub use codec::{
    read_frame, write_command, write_frame, write_notification, write_response, write_stream,
};
pub use error::{Error, Result};
pub use frame::Frame;
pub use header::{FLAG_IN_ERROR, Header, MAX_HEADER_LENGTH, MIN_HEADER_LENGTH, VERSION};
pub use types::{Command, FrameType, Notification, Stream, UNKNOWN};

/// Default path of the proxy's listening socket.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/clear-containers/proxy.sock";
