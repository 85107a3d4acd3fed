//! Synchronous client for the proxy API.
//!
//! Runtimes use it to register VMs and forward hyperstart commands; shims use
//! it to claim an I/O token, push stdin and receive output and the exit
//! status of their process.

use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use vmproxy_proto::payload::{
    AttachVM, AttachVMResponse, ConnectShim, ErrorResponse, Hyper, LogEntry, ProcessExited,
    RegisterVM, RegisterVMResponse, Signal, UnregisterVM,
};
use vmproxy_proto::{Command, Frame, FrameType, Notification, Stream};

use crate::error::{Error, Result};

/// Output or lifecycle event delivered to a shim.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
    /// A chunk of the process's stdout.
    Stdout(Vec<u8>),
    /// A chunk of the process's stderr.
    Stderr(Vec<u8>),
    /// The process exited with the given status.
    ProcessExited(u8),
}

/// A client connection to the proxy.
///
/// One client owns one connection; requests are strictly sequential.
#[derive(Debug)]
pub struct Client<S> {
    /// The underlying byte stream.
    stream: S,
}

#[cfg(unix)]
impl Client<std::os::unix::net::UnixStream> {
    /// Connects to the proxy's Unix socket.
    pub fn connect(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = std::os::unix::net::UnixStream::connect(path)?;
        debug!(path = %path.display(), "connected to proxy");
        Ok(Self::new(stream))
    }
}

impl<S: Read + Write> Client<S> {
    /// Wraps an already connected stream.
    pub const fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Registers a new VM; returns the I/O tokens allocated for it.
    pub fn register_vm(&mut self, payload: &RegisterVM) -> Result<RegisterVMResponse> {
        self.call_json(Command::RegisterVM, Some(payload))
    }

    /// Attaches to a VM registered by another client.
    pub fn attach_vm(&mut self, payload: &AttachVM) -> Result<AttachVMResponse> {
        self.call_json(Command::AttachVM, Some(payload))
    }

    /// Unregisters a VM.
    pub fn unregister_vm(&mut self, container_id: &str) -> Result<()> {
        self.call(Command::UnregisterVM, Some(&UnregisterVM::new(container_id)))
            .map(drop)
    }

    /// Forwards a hyperstart command.
    pub fn hyper<T: Serialize + ?Sized>(&mut self, name: &str, message: Option<&T>) -> Result<()> {
        self.hyper_with_tokens(name, Vec::new(), message)
    }

    /// Forwards a hyperstart command, associating I/O tokens with it.
    pub fn hyper_with_tokens<T: Serialize + ?Sized>(
        &mut self,
        name: &str,
        tokens: Vec<String>,
        message: Option<&T>,
    ) -> Result<()> {
        let mut payload = Hyper::new(name);
        payload.tokens = tokens;
        payload.data = message.map(serde_json::to_value).transpose()?;
        self.call(Command::Hyper, Some(&payload)).map(drop)
    }

    /// Claims an I/O token, turning this connection into a shim session.
    pub fn connect_shim(&mut self, token: &str) -> Result<()> {
        self.call(Command::ConnectShim, Some(&ConnectShim::new(token)))
            .map(drop)
    }

    /// Ends the shim session. The proxy does not answer.
    pub fn disconnect_shim(&mut self) -> Result<()> {
        self.send::<()>(Command::DisconnectShim, None)
    }

    /// Delivers `signal` to the process behind the shim session.
    pub fn kill(&mut self, signal: i32) -> Result<()> {
        self.call(Command::Signal, Some(&Signal::kill(signal)))
            .map(drop)
    }

    /// Resizes the process's terminal.
    #[cfg(unix)]
    pub fn send_terminal_size(&mut self, columns: u16, rows: u16) -> Result<()> {
        let payload = Signal::window_size(libc::SIGWINCH, columns, rows);
        self.call(Command::Signal, Some(&payload)).map(drop)
    }

    /// Sends input to the process behind the shim session.
    pub fn send_stdin(&mut self, data: &[u8]) -> Result<()> {
        debug!(len = data.len(), "sending stdin");
        vmproxy_proto::write_stream(&mut self.stream, Stream::Stdin, data)?;
        Ok(())
    }

    /// Asks the proxy to log `entry` on behalf of this client.
    pub fn log(&mut self, entry: &LogEntry) -> Result<()> {
        entry.validate()?;
        let frame = Frame::new_json(FrameType::Stream, Stream::Log, Some(entry))?;
        vmproxy_proto::write_frame(&mut self.stream, &frame)?;
        Ok(())
    }

    /// Blocks until the next output chunk or exit notification.
    pub fn next_event(&mut self) -> Result<Event> {
        let frame = vmproxy_proto::read_frame(&mut self.stream)?;
        let header = frame.header;
        debug!(
            frame_type = %header.frame_type,
            opcode = header.opcode_name(),
            len = frame.payload.len(),
            "received frame"
        );

        match (header.stream(), header.notification()) {
            (Some(Stream::Stdout), _) => Ok(Event::Stdout(frame.payload)),
            (Some(Stream::Stderr), _) => Ok(Event::Stderr(frame.payload)),
            (_, Some(Notification::ProcessExited)) => {
                let exited = ProcessExited::from_payload(&frame.payload)?;
                Ok(Event::ProcessExited(exited.status))
            }
            _ => Err(unexpected(&frame)),
        }
    }

    /// Writes a command frame without waiting for a response.
    fn send<T: Serialize + ?Sized>(&mut self, cmd: Command, payload: Option<&T>) -> Result<()> {
        let frame = Frame::new_json(FrameType::Command, cmd, payload)?;
        debug!(%cmd, len = frame.payload.len(), "sending command");
        vmproxy_proto::write_frame(&mut self.stream, &frame)?;
        Ok(())
    }

    /// Sends a command and returns its successful response.
    fn call<T: Serialize + ?Sized>(&mut self, cmd: Command, payload: Option<&T>) -> Result<Frame> {
        self.send(cmd, payload)?;

        let resp = vmproxy_proto::read_frame(&mut self.stream)?;
        if resp.header.frame_type != FrameType::Response
            || resp.header.command() != Some(cmd)
        {
            return Err(unexpected(&resp));
        }

        if resp.header.in_error {
            let message = error_message(&resp)?;
            warn!(%cmd, %message, "proxy returned an error");
            return Err(Error::Proxy(message));
        }

        debug!(%cmd, len = resp.payload.len(), "received response");
        Ok(resp)
    }

    /// Sends a command and decodes its result body.
    ///
    /// An empty body decodes as `R::default()`.
    fn call_json<T, R>(&mut self, cmd: Command, payload: Option<&T>) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned + Default,
    {
        let resp = self.call(cmd, payload)?;
        if resp.payload.is_empty() {
            return Ok(R::default());
        }
        Ok(resp.json()?)
    }
}

/// Extracts the message of an in-error response.
fn error_message(resp: &Frame) -> Result<String> {
    if resp.payload.is_empty() {
        return Ok("unknown error".into());
    }
    let body: ErrorResponse = resp.json()?;
    if body.message.is_empty() {
        Ok("unknown error".into())
    } else {
        Ok(body.message)
    }
}

/// Builds the error for a frame that does not fit the current exchange.
fn unexpected(frame: &Frame) -> Error {
    Error::UnexpectedFrame {
        frame_type: frame.header.frame_type,
        opcode: frame.header.opcode,
    }
}
