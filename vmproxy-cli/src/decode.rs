//! `vmproxy decode`: print the frames of a captured byte stream.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use vmproxy::{Frame, FrameType};

use crate::OutputFormat;

/// Arguments for `vmproxy decode`.
#[derive(Args)]
pub struct DecodeArgs {
    /// File holding raw frames, or `-` for stdin.
    input: PathBuf,

    /// Only show frames of this type (`command`, `response`, `stream`, `notification`).
    #[arg(long = "type")]
    frame_type: Option<FrameType>,

    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

pub fn run(args: DecodeArgs) -> Result<()> {
    let frames = if args.input.as_os_str() == "-" {
        read_all(io::stdin().lock())?
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("opening {}", args.input.display()))?;
        read_all(BufReader::new(file))?
    };
    let frames: Vec<_> = frames
        .into_iter()
        .filter(|f| args.frame_type.is_none_or(|t| f.header.frame_type == t))
        .collect();

    if matches!(args.format, OutputFormat::Json) {
        let list: Vec<_> = frames.iter().map(summarize).collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("{:<14} {:<16} {:<6} {:>8}", "TYPE", "OPCODE", "ERROR", "LENGTH");
    for f in &frames {
        let h = &f.header;
        println!(
            "{:<14} {:<16} {:<6} {:>8}",
            h.frame_type.to_string(),
            h.opcode_name(),
            if h.in_error { "yes" } else { "-" },
            h.payload_length
        );
    }
    Ok(())
}

/// Reads frames until the stream ends on a frame boundary.
///
/// A stream ending in the middle of a frame is an error.
fn read_all(mut r: impl BufRead) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    loop {
        if r.fill_buf()?.is_empty() {
            return Ok(frames);
        }
        let frame = vmproxy_proto::read_frame(&mut r)
            .with_context(|| format!("frame #{}", frames.len()))?;
        tracing::trace!(index = frames.len(), len = frame.payload.len(), "decoded frame");
        frames.push(frame);
    }
}

/// JSON view of a frame; payloads that are not JSON are shown as text.
fn summarize(frame: &Frame) -> serde_json::Value {
    let h = &frame.header;
    let payload = if frame.payload.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&frame.payload).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&frame.payload).into_owned())
        })
    };
    serde_json::json!({
        "type": h.frame_type.as_str(),
        "opcode": h.opcode_name(),
        "inError": h.in_error,
        "headerLength": h.header_length,
        "payloadLength": h.payload_length,
        "payload": payload,
    })
}
