//! CLI for the VM proxy.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod decode;
mod proxy;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "vmproxy", version, about = "Talk to a VM proxy over its Unix socket")]
struct Cli {
    /// Path of the proxy socket.
    #[arg(
        long,
        short,
        global = true,
        env = "VMPROXY_SOCKET",
        default_value = vmproxy::DEFAULT_SOCKET_PATH
    )]
    socket: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a VM with the proxy.
    Register(proxy::RegisterArgs),

    /// Attach to a VM registered by another client.
    Attach(proxy::AttachArgs),

    /// Unregister a VM.
    Unregister {
        /// Container the VM belongs to.
        container_id: String,
    },

    /// Forward a hyperstart command.
    Hyper(proxy::HyperArgs),

    /// Send a signal to the process behind an I/O token.
    Kill(proxy::KillArgs),

    /// Resize the terminal of the process behind an I/O token.
    Winsize(proxy::WinsizeArgs),

    /// Print the frames of a captured byte stream.
    Decode(decode::DecodeArgs),

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

/// Output format for commands that print data.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = cli.dispatch() {
        eprintln!("vmproxy: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        let socket = self.socket;
        match self.command {
            Command::Register(args) => proxy::register(&socket, args),
            Command::Attach(args) => proxy::attach(&socket, args),
            Command::Unregister { container_id } => proxy::unregister(&socket, &container_id),
            Command::Hyper(args) => proxy::hyper(&socket, args),
            Command::Kill(args) => proxy::kill(&socket, args),
            Command::Winsize(args) => proxy::winsize(&socket, args),
            Command::Decode(args) => decode::run(args),
            Command::Completion { shell } => {
                clap_complete::generate(shell, &mut Self::command(), "vmproxy", &mut std::io::stdout());
                Ok(())
            }
        }
    }
}

/// Installs the stderr log subscriber.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
