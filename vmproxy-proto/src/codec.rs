//! Frame codec over any `Read`/`Write` stream.
//!
//! Each frame is: `[header (header_length bytes)][payload]`. See
//! [`header`](crate::header) for the header layout.

use std::io::{self, Read, Write};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::header::{Header, MIN_HEADER_LENGTH};
use crate::types::{Command, FrameType, Notification, Stream};

/// Initial payload buffer capacity; the buffer grows with the bytes received.
const PAYLOAD_PREALLOC: usize = 64 * 1024;

/// Reads one complete frame from `r`.
///
/// Returns [`Error::Truncated`] if the source ends before the header or the
/// payload is complete. No frame is returned unless every field is valid.
pub fn read_frame(r: &mut impl Read) -> Result<Frame> {
    let mut fixed = [0u8; MIN_HEADER_LENGTH];
    r.read_exact(&mut fixed)?;
    let header = Header::decode(&fixed)?;

    let extension = (header.header_length - MIN_HEADER_LENGTH) as u64;
    if extension > 0 {
        let skipped = io::copy(&mut r.by_ref().take(extension), &mut io::sink())?;
        if skipped != extension {
            return Err(Error::Truncated);
        }
    }

    let len = header.payload_length as usize;
    let mut payload = Vec::with_capacity(len.min(PAYLOAD_PREALLOC));
    r.by_ref()
        .take(u64::from(header.payload_length))
        .read_to_end(&mut payload)?;
    if payload.len() != len {
        return Err(Error::Truncated);
    }

    Ok(Frame { header, payload })
}

/// Writes `frame` to `w` as a single contiguous buffer.
///
/// The frame is validated first; on error nothing is written.
pub fn write_frame(w: &mut impl Write, frame: &Frame) -> Result<()> {
    frame.check_payload_length()?;

    let mut buf = Vec::with_capacity(frame.header.header_length + frame.payload.len());
    frame.header.encode_into(&mut buf)?;
    buf.extend_from_slice(&frame.payload);

    w.write_all(&buf)?;
    w.flush()?;
    Ok(())
}

/// Writes a command frame.
pub fn write_command(w: &mut impl Write, cmd: Command, payload: &[u8]) -> Result<()> {
    write_frame(w, &Frame::new(FrameType::Command, cmd, payload))
}

/// Writes a response frame, optionally flagged as an error.
pub fn write_response(
    w: &mut impl Write,
    cmd: Command,
    in_error: bool,
    payload: &[u8],
) -> Result<()> {
    let mut frame = Frame::new(FrameType::Response, cmd, payload);
    frame.header.in_error = in_error;
    write_frame(w, &frame)
}

/// Writes a stream data frame.
pub fn write_stream(w: &mut impl Write, stream: Stream, payload: &[u8]) -> Result<()> {
    write_frame(w, &Frame::new(FrameType::Stream, stream, payload))
}

/// Writes a notification frame.
pub fn write_notification(
    w: &mut impl Write,
    notification: Notification,
    payload: &[u8],
) -> Result<()> {
    write_frame(w, &Frame::new(FrameType::Notification, notification, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{FLAG_IN_ERROR, VERSION};

    /// Builds raw frame bytes by hand, bypassing the encoder. `hl` is in bytes.
    fn make_frame(v: u16, hl: usize, t: u8, op: u8, pl: usize) -> Vec<u8> {
        let mut buf = vec![0u8; hl + pl];
        buf[0..2].copy_from_slice(&v.to_be_bytes());
        buf[2] = (hl / 4) as u8;
        buf[6] = t;
        buf[7] = op;
        buf[8..12].copy_from_slice(&(pl as u32).to_be_bytes());
        buf
    }

    fn make_stream_frame(v: u16, hl: usize, op: Stream, pl: usize) -> Vec<u8> {
        make_frame(v, hl, FrameType::Stream.ordinal(), op.ordinal(), pl)
    }

    fn test_frame(t: FrameType, op: u8, pl: usize) -> Frame {
        Frame::new(t, op, vec![0xaa; pl])
    }

    #[test]
    fn read_frame_parses_header() {
        let buf = make_stream_frame(VERSION, MIN_HEADER_LENGTH, Stream::Stderr, 1024);
        let frame = read_frame(&mut io::Cursor::new(buf)).unwrap();

        let h = &frame.header;
        assert_eq!(h.version, VERSION);
        assert_eq!(h.header_length, MIN_HEADER_LENGTH);
        assert_eq!(h.frame_type, FrameType::Stream);
        assert_eq!(h.stream(), Some(Stream::Stderr));
        assert_eq!(h.payload_length, 1024);
        assert_eq!(frame.payload.len(), 1024);
    }

    #[test]
    fn read_frame_flags() {
        let mut buf = make_frame(
            VERSION,
            MIN_HEADER_LENGTH,
            FrameType::Response.ordinal(),
            Command::Signal.ordinal(),
            16,
        );
        buf[6] |= FLAG_IN_ERROR;

        let frame = read_frame(&mut io::Cursor::new(buf)).unwrap();
        assert!(frame.header.in_error);
        assert_eq!(frame.header.frame_type, FrameType::Response);
    }

    #[test]
    fn read_frame_truncated() {
        // Empty source.
        let res = read_frame(&mut io::Cursor::new(Vec::new()));
        assert!(matches!(res, Err(Error::Truncated)));

        // Header too short.
        let buf = make_stream_frame(VERSION, MIN_HEADER_LENGTH, Stream::Stderr, 1024);
        let res = read_frame(&mut io::Cursor::new(&buf[..10]));
        assert!(matches!(res, Err(Error::Truncated)));

        // Payload too short.
        let res = read_frame(&mut io::Cursor::new(&buf[..512]));
        assert!(matches!(res, Err(Error::Truncated)));

        // Extension area too short.
        let buf = make_stream_frame(VERSION, MIN_HEADER_LENGTH + 12, Stream::Stderr, 0);
        let res = read_frame(&mut io::Cursor::new(&buf[..MIN_HEADER_LENGTH + 4]));
        assert!(matches!(res, Err(Error::Truncated)));
    }

    #[test]
    fn read_frame_bad_version() {
        for v in [0x8fff, 0] {
            let buf = make_stream_frame(v, MIN_HEADER_LENGTH, Stream::Stderr, 1024);
            let res = read_frame(&mut io::Cursor::new(buf));
            assert!(matches!(res, Err(Error::InvalidVersion(got)) if got == v));
        }
    }

    #[test]
    fn read_frame_bad_type() {
        let buf = make_frame(VERSION, MIN_HEADER_LENGTH, FrameType::Max.ordinal(), 0, 1024);
        let res = read_frame(&mut io::Cursor::new(buf));
        assert!(matches!(res, Err(Error::InvalidType(4))));
    }

    #[test]
    fn read_frame_short_header_length() {
        let mut buf = make_stream_frame(VERSION, MIN_HEADER_LENGTH, Stream::Stdout, 0);
        buf[2] = 2;
        let res = read_frame(&mut io::Cursor::new(buf));
        assert!(matches!(res, Err(Error::InvalidHeaderLength(8))));
    }

    #[test]
    fn read_frame_larger_header() {
        let mut buf = make_stream_frame(VERSION, MIN_HEADER_LENGTH + 12, Stream::Stderr, 1024);
        // Extension bytes are never interpreted.
        buf[MIN_HEADER_LENGTH..MIN_HEADER_LENGTH + 12].fill(0x55);

        let frame = read_frame(&mut io::Cursor::new(buf)).unwrap();
        let h = &frame.header;
        assert_eq!(h.version, VERSION);
        assert_eq!(h.header_length, MIN_HEADER_LENGTH + 12);
        assert_eq!(h.stream(), Some(Stream::Stderr));
        assert_eq!(h.payload_length, 1024);
        assert_eq!(frame.payload, vec![0u8; 1024]);
    }

    #[test]
    fn read_frame_leaves_following_frame() {
        let mut buf = Vec::new();
        write_stream(&mut buf, Stream::Stdout, b"one").unwrap();
        write_stream(&mut buf, Stream::Stderr, b"two").unwrap();

        let mut cursor = io::Cursor::new(buf);
        let first = read_frame(&mut cursor).unwrap();
        let second = read_frame(&mut cursor).unwrap();
        assert_eq!(first.payload, b"one");
        assert_eq!(second.header.stream(), Some(Stream::Stderr));
        assert_eq!(second.payload, b"two");
        assert!(matches!(read_frame(&mut cursor), Err(Error::Truncated)));
    }

    #[test]
    fn write_frame_layout() {
        let mut w = Vec::new();
        let frame = test_frame(FrameType::Stream, Stream::Stderr.ordinal(), 1024);
        write_frame(&mut w, &frame).unwrap();

        assert_eq!(u16::from_be_bytes([w[0], w[1]]), VERSION);
        assert_eq!(usize::from(w[2]), MIN_HEADER_LENGTH / 4);
        assert_eq!(w[6] & 0x0f, FrameType::Stream.ordinal());
        assert_eq!(w[7], Stream::Stderr.ordinal());
        assert_eq!(u32::from_be_bytes([w[8], w[9], w[10], w[11]]), 1024);
        assert_eq!(w.len(), MIN_HEADER_LENGTH + 1024);
        assert!(w[MIN_HEADER_LENGTH..].iter().all(|&b| b == 0xaa));
    }

    #[test]
    fn write_frame_flags() {
        let mut frame = test_frame(FrameType::Stream, Stream::Stderr.ordinal(), 1024);
        frame.header.in_error = true;

        let mut w = Vec::new();
        write_frame(&mut w, &frame).unwrap();
        assert_eq!(w[6] & 0xf0, FLAG_IN_ERROR);
    }

    #[test]
    fn write_frame_payload_mismatch_writes_nothing() {
        let mut frame = test_frame(FrameType::Stream, Stream::Stderr.ordinal(), 1024);
        frame.header.payload_length = 1025;

        let mut w = Vec::new();
        let res = write_frame(&mut w, &frame);
        assert!(matches!(
            res,
            Err(Error::InvalidPayloadLength {
                declared: 1025,
                actual: 1024
            })
        ));
        assert!(w.is_empty());
    }

    #[test]
    fn write_frame_bad_header_length_writes_nothing() {
        let mut frame = test_frame(FrameType::Command, 0, 4);
        frame.header.header_length = 14;

        let mut w = Vec::new();
        assert!(matches!(
            write_frame(&mut w, &frame),
            Err(Error::InvalidHeaderLength(14))
        ));
        assert!(w.is_empty());
    }

    #[test]
    fn typed_writers_set_type() {
        let mut w = Vec::new();
        write_command(&mut w, Command::Signal, &[]).unwrap();
        assert_eq!(w[6] & 0x0f, FrameType::Command.ordinal());

        let mut w = Vec::new();
        write_response(&mut w, Command::Signal, false, &[]).unwrap();
        assert_eq!(w[6] & 0x0f, FrameType::Response.ordinal());
        assert_eq!(w[6] & 0xf0, 0);

        let mut w = Vec::new();
        write_stream(&mut w, Stream::Stderr, &[]).unwrap();
        assert_eq!(w[6] & 0x0f, FrameType::Stream.ordinal());

        let mut w = Vec::new();
        write_notification(&mut w, Notification::ProcessExited, &[]).unwrap();
        assert_eq!(w[6] & 0x0f, FrameType::Notification.ordinal());
    }

    #[test]
    fn roundtrip_all_types() {
        for t in FrameType::ALL.iter().copied() {
            for in_error in [false, true] {
                let mut frame = Frame::new(t, 0x7fu8, b"payload".to_vec());
                frame.header.in_error = in_error;

                let mut buf = Vec::new();
                write_frame(&mut buf, &frame).unwrap();
                let decoded = read_frame(&mut io::Cursor::new(buf)).unwrap();
                assert_eq!(decoded, frame);
            }
        }
    }

    #[test]
    fn roundtrip_extended_header() {
        let mut frame = Frame::new(FrameType::Response, Command::AttachVM, b"{}".to_vec());
        frame.header.header_length = MIN_HEADER_LENGTH + 12;

        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).unwrap();
        assert_eq!(buf.len(), MIN_HEADER_LENGTH + 12 + 2);

        let decoded = read_frame(&mut io::Cursor::new(buf)).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn response_error_flag_roundtrip() {
        for in_error in [true, false] {
            let mut buf = Vec::new();
            write_response(&mut buf, Command::RegisterVM, in_error, b"{}").unwrap();
            let frame = read_frame(&mut io::Cursor::new(buf)).unwrap();
            assert_eq!(frame.header.in_error, in_error);
        }
    }
}
