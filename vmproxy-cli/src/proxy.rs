//! Subcommands that talk to a running proxy.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use nix::sys::signal::Signal;
use vmproxy::Client;
use vmproxy::payload::{AttachVM, RegisterVM};

/// Arguments for `vmproxy register`.
#[derive(Args)]
pub struct RegisterArgs {
    /// Container the VM belongs to.
    container_id: String,

    /// Path of the hyperstart control serial port.
    #[arg(long)]
    ctl_serial: String,

    /// Path of the hyperstart I/O serial port.
    #[arg(long)]
    io_serial: String,

    /// Path of the VM console to log.
    #[arg(long)]
    console: Option<String>,

    /// Number of I/O tokens to allocate.
    #[arg(long)]
    io_streams: Option<u32>,
}

/// Arguments for `vmproxy attach`.
#[derive(Args)]
pub struct AttachArgs {
    /// Container the VM belongs to.
    container_id: String,

    /// Number of I/O tokens to allocate.
    #[arg(long)]
    io_streams: Option<u32>,
}

/// Arguments for `vmproxy hyper`.
#[derive(Args)]
pub struct HyperArgs {
    /// hyperstart command name (e.g. `newcontainer`).
    name: String,

    /// I/O token to associate with the command (repeatable).
    #[arg(long = "token")]
    tokens: Vec<String>,

    /// Command data as a JSON document.
    #[arg(long, value_parser = parse_json)]
    data: Option<serde_json::Value>,
}

/// Arguments for `vmproxy kill`.
#[derive(Args)]
pub struct KillArgs {
    /// I/O token of the target process.
    #[arg(long)]
    token: String,

    /// Signal name (`SIGTERM`, `term`) or number.
    #[arg(default_value = "SIGTERM", value_parser = parse_signal)]
    signal: i32,
}

/// Arguments for `vmproxy winsize`.
#[derive(Args)]
pub struct WinsizeArgs {
    /// I/O token of the target process.
    #[arg(long)]
    token: String,

    /// Terminal width.
    columns: u16,

    /// Terminal height.
    rows: u16,
}

pub fn register(socket: &Path, args: RegisterArgs) -> Result<()> {
    let mut req = RegisterVM::new(args.container_id, args.ctl_serial, args.io_serial);
    req.console = args.console;
    req.num_io_streams = args.io_streams;

    let resp = connect(socket)?.register_vm(&req)?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}

pub fn attach(socket: &Path, args: AttachArgs) -> Result<()> {
    let mut req = AttachVM::new(args.container_id);
    req.num_io_streams = args.io_streams;

    let resp = connect(socket)?.attach_vm(&req)?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}

pub fn unregister(socket: &Path, container_id: &str) -> Result<()> {
    connect(socket)?.unregister_vm(container_id)?;
    println!("{container_id}");
    Ok(())
}

pub fn hyper(socket: &Path, args: HyperArgs) -> Result<()> {
    connect(socket)?.hyper_with_tokens(&args.name, args.tokens, args.data.as_ref())?;
    Ok(())
}

pub fn kill(socket: &Path, args: KillArgs) -> Result<()> {
    let mut client = shim_session(socket, &args.token)?;
    client.kill(args.signal)?;
    client.disconnect_shim()?;
    Ok(())
}

pub fn winsize(socket: &Path, args: WinsizeArgs) -> Result<()> {
    let mut client = shim_session(socket, &args.token)?;
    client.send_terminal_size(args.columns, args.rows)?;
    client.disconnect_shim()?;
    Ok(())
}

type UnixClient = Client<std::os::unix::net::UnixStream>;

fn connect(socket: &Path) -> Result<UnixClient> {
    Client::connect(socket).with_context(|| format!("connecting to {}", socket.display()))
}

fn shim_session(socket: &Path, token: &str) -> Result<UnixClient> {
    let mut client = connect(socket)?;
    client
        .connect_shim(token)
        .with_context(|| format!("claiming token {token}"))?;
    Ok(client)
}

fn parse_json(s: &str) -> std::result::Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

/// Accepts `9`, `KILL`, `sigkill` and `SIGKILL`.
fn parse_signal(s: &str) -> std::result::Result<i32, String> {
    if let Ok(n) = s.parse::<i32>() {
        return Ok(n);
    }
    let upper = s.to_ascii_uppercase();
    let name = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{upper}")
    };
    name.parse::<Signal>()
        .map(|sig| sig as i32)
        .map_err(|_| format!("unknown signal: {s}"))
}
