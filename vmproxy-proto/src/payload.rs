//! JSON bodies carried by command, response, stream and notification frames.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Body of [`Command::RegisterVM`](crate::Command::RegisterVM).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct RegisterVM {
    /// Container the VM belongs to.
    pub container_id: String,
    /// Path of the hyperstart control serial port.
    pub ctl_serial: String,
    /// Path of the hyperstart I/O serial port.
    pub io_serial: String,
    /// Path of the VM console, if it should be logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console: Option<String>,
    /// Number of I/O tokens to allocate.
    #[serde(rename = "numIOStreams", default, skip_serializing_if = "Option::is_none")]
    pub num_io_streams: Option<u32>,
}

impl RegisterVM {
    /// Creates a registration body with no console and no I/O streams.
    pub fn new(
        container_id: impl Into<String>,
        ctl_serial: impl Into<String>,
        io_serial: impl Into<String>,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            ctl_serial: ctl_serial.into(),
            io_serial: io_serial.into(),
            console: None,
            num_io_streams: None,
        }
    }
}

/// Body of [`Command::AttachVM`](crate::Command::AttachVM).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct AttachVM {
    /// Container the VM belongs to.
    pub container_id: String,
    /// Number of I/O tokens to allocate.
    #[serde(rename = "numIOStreams", default, skip_serializing_if = "Option::is_none")]
    pub num_io_streams: Option<u32>,
}

impl AttachVM {
    /// Creates an attach body with no I/O streams.
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            num_io_streams: None,
        }
    }
}

/// Body of [`Command::UnregisterVM`](crate::Command::UnregisterVM).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct UnregisterVM {
    /// Container the VM belongs to.
    pub container_id: String,
}

impl UnregisterVM {
    /// Creates an unregister body.
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
        }
    }
}

/// Where shims connect for I/O, and the tokens they present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct IOResponse {
    /// URL of the proxy socket (`unix:///…`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// One token per requested I/O stream.
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// Result of [`Command::RegisterVM`](crate::Command::RegisterVM).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RegisterVMResponse {
    /// I/O session details.
    #[serde(default)]
    pub io: IOResponse,
}

/// Result of [`Command::AttachVM`](crate::Command::AttachVM).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AttachVMResponse {
    /// I/O session details.
    #[serde(default)]
    pub io: IOResponse,
}

/// Body of [`Command::Hyper`](crate::Command::Hyper).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Hyper {
    /// hyperstart command name (e.g. `"newcontainer"`).
    pub hyper_name: String,
    /// I/O tokens to associate with the new process, if any.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Command-specific hyperstart message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Hyper {
    /// Creates a hyperstart command with no tokens and no data.
    pub fn new(hyper_name: impl Into<String>) -> Self {
        Self {
            hyper_name: hyper_name.into(),
            tokens: Vec::new(),
            data: None,
        }
    }
}

/// Body of [`Command::ConnectShim`](crate::Command::ConnectShim).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ConnectShim {
    /// Token handed out in an [`IOResponse`].
    pub token: String,
}

impl ConnectShim {
    /// Creates a connect body for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// Body of [`Command::Signal`](crate::Command::Signal).
///
/// A non-zero `columns`/`rows` pair turns the signal into a terminal resize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Signal {
    /// POSIX signal number.
    pub signal_number: i32,
    /// New terminal width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u16>,
    /// New terminal height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u16>,
}

impl Signal {
    /// A plain signal delivery.
    pub const fn kill(signal_number: i32) -> Self {
        Self {
            signal_number,
            columns: None,
            rows: None,
        }
    }

    /// A terminal resize, delivered as `SIGWINCH`.
    pub const fn window_size(signal_number: i32, columns: u16, rows: u16) -> Self {
        Self {
            signal_number,
            columns: Some(columns),
            rows: Some(rows),
        }
    }
}

/// Body of an in-error response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ErrorResponse {
    /// Human-readable failure description.
    #[serde(rename = "msg", default)]
    pub message: String,
}

/// Origin of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum LogSource {
    /// A shim process.
    Shim,
    /// The container runtime.
    Runtime,
}

/// Severity of a [`LogEntry`].
///
/// Levels that would terminate the proxy (`fatal`, `panic`) are not
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum LogLevel {
    /// Debug detail.
    Debug,
    /// Informational.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// A failure.
    Error,
}

/// Body of a [`Stream::Log`](crate::Stream::Log) frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct LogEntry {
    /// Who produced the entry.
    pub source: LogSource,
    /// Severity.
    pub level: LogLevel,
    /// Container the entry relates to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    /// Log message.
    #[serde(rename = "msg")]
    pub message: String,
}

impl LogEntry {
    /// Creates an entry not tied to any container.
    pub fn new(source: LogSource, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            source,
            level,
            container_id: None,
            message: message.into(),
        }
    }

    /// Rejects entries the proxy would refuse to log.
    pub fn validate(&self) -> Result<()> {
        if self.message.is_empty() {
            return Err(Error::InvalidPayload("no message specified".into()));
        }
        Ok(())
    }
}

/// Body of a [`Notification::ProcessExited`](crate::Notification::ProcessExited)
/// frame: a single byte holding the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct ProcessExited {
    /// Exit status of the process.
    pub status: u8,
}

impl ProcessExited {
    /// Creates a notification body for `status`.
    pub const fn new(status: u8) -> Self {
        Self { status }
    }

    /// Parses the one-byte payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        match payload {
            [status] => Ok(Self { status: *status }),
            _ => Err(Error::InvalidPayload(format!(
                "exit notification must be 1 byte, got {}",
                payload.len()
            ))),
        }
    }

    /// Encodes the one-byte payload.
    pub const fn to_payload(self) -> [u8; 1] {
        [self.status]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_vm_wire_names() {
        let mut p = RegisterVM::new("c1", "/tmp/ctl", "/tmp/io");
        p.num_io_streams = Some(2);

        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "containerId": "c1",
                "ctlSerial": "/tmp/ctl",
                "ioSerial": "/tmp/io",
                "numIOStreams": 2,
            })
        );
    }

    #[test]
    fn register_vm_response_tolerates_missing_tokens() {
        let r: RegisterVMResponse =
            serde_json::from_str(r#"{"io":{"url":"unix:///run/proxy.sock"}}"#).unwrap();
        assert_eq!(r.io.url, "unix:///run/proxy.sock");
        assert!(r.io.tokens.is_empty());
    }

    #[test]
    fn signal_omits_unset_window_size() {
        let v = serde_json::to_value(Signal::kill(15)).unwrap();
        assert_eq!(v, serde_json::json!({ "signalNumber": 15 }));

        let v = serde_json::to_value(Signal::window_size(28, 80, 24)).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "signalNumber": 28, "columns": 80, "rows": 24 })
        );
    }

    #[test]
    fn error_response_uses_msg_key() {
        let e: ErrorResponse = serde_json::from_str(r#"{"msg":"boom"}"#).unwrap();
        assert_eq!(e.message, "boom");
    }

    #[test]
    fn log_entry_rejects_unknown_level_and_empty_message() {
        let bad = r#"{"source":"shim","level":"fatal","msg":"x"}"#;
        assert!(serde_json::from_str::<LogEntry>(bad).is_err());

        let bad = r#"{"source":"kernel","level":"info","msg":"x"}"#;
        assert!(serde_json::from_str::<LogEntry>(bad).is_err());

        let entry = LogEntry::new(LogSource::Runtime, LogLevel::Warn, "");
        assert!(matches!(entry.validate(), Err(Error::InvalidPayload(_))));

        let entry: LogEntry = serde_json::from_str(
            r#"{"source":"shim","level":"info","containerId":"c1","msg":"hello"}"#,
        )
        .unwrap();
        assert_eq!(entry.container_id.as_deref(), Some("c1"));
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn process_exited_is_one_byte() {
        assert_eq!(ProcessExited::from_payload(&[3]).unwrap().status, 3);
        assert!(ProcessExited::from_payload(&[]).is_err());
        assert!(ProcessExited::from_payload(&[0, 1]).is_err());
        assert_eq!(ProcessExited::new(7).to_payload(), [7]);
    }
}
