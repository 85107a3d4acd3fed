//! Client for the VM proxy API.
//!
//! `vmproxy` wraps the [`vmproxy_proto`] frame codec into a request/response
//! API for the two kinds of proxy clients: container runtimes, which register
//! VMs and forward hyperstart commands, and shims, which own the I/O of a
//! single container process.
//!
//! # Quick start — register a VM
//!
//! ```no_run
//! use vmproxy::Client;
//! use vmproxy::payload::RegisterVM;
//!
//! let mut client = Client::connect(vmproxy::DEFAULT_SOCKET_PATH)?;
//! let mut req = RegisterVM::new("c1", "/run/vm/ctl.sock", "/run/vm/io.sock");
//! req.num_io_streams = Some(1);
//!
//! let resp = client.register_vm(&req)?;
//! for token in &resp.io.tokens {
//!     println!("shim token: {token}");
//! }
//! # Ok::<(), vmproxy::Error>(())
//! ```

mod client;
mod error;

pub use client::{Client, Event};
pub use error::{Error, Result};
pub use vmproxy_proto::{
    Command, DEFAULT_SOCKET_PATH, Frame, FrameType, Header, Notification, Stream, payload,
};
