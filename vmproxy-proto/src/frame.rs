//! Frames: a header plus its raw payload.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::payload::ErrorResponse;
use crate::types::FrameType;

/// One complete protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Frame {
    /// Routing and length information.
    pub header: Header,
    /// Exactly `header.payload_length` bytes once decoded.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Builds a minimum-header frame around `payload`.
    ///
    /// Payloads longer than `u32::MAX` get a saturated length and are
    /// rejected by [`write_frame`](crate::write_frame).
    pub fn new(frame_type: FrameType, opcode: impl Into<u8>, payload: impl Into<Vec<u8>>) -> Self {
        let payload = payload.into();
        let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        Self {
            header: Header::new(frame_type, opcode.into(), len),
            payload,
        }
    }

    /// Builds a frame whose payload is `payload` serialized as JSON.
    ///
    /// `None` produces an empty payload.
    pub fn new_json<T: Serialize + ?Sized>(
        frame_type: FrameType,
        opcode: impl Into<u8>,
        payload: Option<&T>,
    ) -> Result<Self> {
        let data = match payload {
            Some(value) => serde_json::to_vec(value)?,
            None => Vec::new(),
        };
        Ok(Self::new(frame_type, opcode, data))
    }

    /// Builds an in-error response carrying an [`ErrorResponse`] body.
    ///
    /// Falls back to an empty in-error response if the body cannot be
    /// serialized.
    pub fn error_response(opcode: impl Into<u8>, message: impl Into<String>) -> Self {
        let opcode = opcode.into();
        let body = ErrorResponse {
            message: message.into(),
        };
        let mut frame = Self::new_json(FrameType::Response, opcode, Some(&body))
            .unwrap_or_else(|_| Self::new(FrameType::Response, opcode, Vec::new()));
        frame.header.in_error = true;
        frame
    }

    /// Parses the payload as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Checks that the payload matches the declared length.
    pub(crate) fn check_payload_length(&self) -> Result<()> {
        let declared = self.header.payload_length;
        let actual = self.payload.len();
        if u32::try_from(actual).ok() == Some(declared) {
            Ok(())
        } else {
            Err(Error::InvalidPayloadLength { declared, actual })
        }
    }
}
