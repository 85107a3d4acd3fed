//! Frame header layout and validation.
//!
//! ```text
//! 0       2    3         6         7        8               12
//! ┌───────┬────┬─────────┬─────────┬────────┬───────────────┬─────────────┐
//! │version│hl/4│reserved │flags|typ│ opcode │ payload length│ extension … │
//! │u16 BE │ u8 │ 3 bytes │ 4b | 4b │   u8   │    u32 BE     │ hl-12 bytes │
//! └───────┴────┴─────────┴─────────┴────────┴───────────────┴─────────────┘
//! ```
//!
//! Reserved bytes and the extension area are zero on write and ignored on
//! read, so an older decoder can consume headers from a newer peer.

use crate::error::{Error, Result};
use crate::types::{Command, FrameType, Notification, Stream};

/// The only protocol version this implementation speaks.
pub const VERSION: u16 = 2;

/// Size of the fixed part of the header, in bytes.
pub const MIN_HEADER_LENGTH: usize = 12;

/// Largest header length expressible by the one-byte `hl/4` field.
pub const MAX_HEADER_LENGTH: usize = 4 * u8::MAX as usize;

/// Flag bit set on responses that carry an error.
pub const FLAG_IN_ERROR: u8 = 0x10;

/// Low nibble of byte 6.
const TYPE_MASK: u8 = 0x0f;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Header {
    /// Protocol version, always [`VERSION`] once decoded.
    pub version: u16,
    /// Total header size in bytes, including any extension area.
    pub header_length: usize,
    /// Message kind.
    pub frame_type: FrameType,
    /// Type-scoped opcode; see [`Header::command`] and friends.
    pub opcode: u8,
    /// Number of payload bytes following the header.
    pub payload_length: u32,
    /// Whether a response reports a failure.
    pub in_error: bool,
}

impl Header {
    /// Creates a minimum-length header for the current protocol version.
    pub const fn new(frame_type: FrameType, opcode: u8, payload_length: u32) -> Self {
        Self {
            version: VERSION,
            header_length: MIN_HEADER_LENGTH,
            frame_type,
            opcode,
            payload_length,
            in_error: false,
        }
    }

    /// Flag nibble as it appears in the high bits of byte 6.
    pub const fn flags(&self) -> u8 {
        if self.in_error { FLAG_IN_ERROR } else { 0 }
    }

    /// The command this frame carries, for command and response frames.
    pub fn command(&self) -> Option<Command> {
        match self.frame_type {
            FrameType::Command | FrameType::Response => Command::try_from(self.opcode).ok(),
            _ => None,
        }
    }

    /// The stream this frame belongs to, for stream frames.
    pub fn stream(&self) -> Option<Stream> {
        match self.frame_type {
            FrameType::Stream => Stream::try_from(self.opcode).ok(),
            _ => None,
        }
    }

    /// The notification this frame carries, for notification frames.
    pub fn notification(&self) -> Option<Notification> {
        match self.frame_type {
            FrameType::Notification => Notification::try_from(self.opcode).ok(),
            _ => None,
        }
    }

    /// Human-readable opcode name, scoped to the frame type.
    pub fn opcode_name(&self) -> &'static str {
        match self.frame_type {
            FrameType::Command | FrameType::Response => Command::name_of(self.opcode),
            FrameType::Stream => Stream::name_of(self.opcode),
            FrameType::Notification => Notification::name_of(self.opcode),
            FrameType::Max => crate::types::UNKNOWN,
        }
    }

    /// Appends exactly `header_length` encoded bytes to `buf`.
    ///
    /// Nothing is appended if the header length cannot be represented.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let hl = self.header_length;
        if hl < MIN_HEADER_LENGTH || hl > MAX_HEADER_LENGTH || hl % 4 != 0 {
            return Err(Error::InvalidHeaderLength(hl));
        }

        let start = buf.len();
        buf.resize(start + hl, 0);
        let out = &mut buf[start..];
        out[0..2].copy_from_slice(&self.version.to_be_bytes());
        out[2] = (hl / 4) as u8;
        out[6] = self.flags() | (self.frame_type.ordinal() & TYPE_MASK);
        out[7] = self.opcode;
        out[8..12].copy_from_slice(&self.payload_length.to_be_bytes());
        Ok(())
    }

    /// Parses and validates the fixed part of a header.
    ///
    /// Checks, in order: version, header length, type. The caller is
    /// responsible for consuming `header_length - MIN_HEADER_LENGTH`
    /// extension bytes afterwards.
    pub fn decode(buf: &[u8; MIN_HEADER_LENGTH]) -> Result<Self> {
        let version = u16::from_be_bytes([buf[0], buf[1]]);
        if version != VERSION {
            return Err(Error::InvalidVersion(version));
        }

        let header_length = usize::from(buf[2]) * 4;
        if header_length < MIN_HEADER_LENGTH {
            return Err(Error::InvalidHeaderLength(header_length));
        }

        let raw_type = buf[6] & TYPE_MASK;
        let frame_type = FrameType::try_from(raw_type).map_err(Error::InvalidType)?;

        Ok(Self {
            version,
            header_length,
            frame_type,
            opcode: buf[7],
            payload_length: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
            in_error: buf[6] & FLAG_IN_ERROR != 0,
        })
    }
}
