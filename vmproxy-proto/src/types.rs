//! Frame types and the per-type opcode catalogs.
//!
//! Every catalog is a contiguous, zero-based `#[repr(u8)]` enum that ends in
//! a `Max` sentinel. Names come from a table indexed by ordinal; anything at
//! or beyond `Max` renders as [`UNKNOWN`].

use std::fmt;
use std::str::FromStr;

/// Display name for ordinals outside a catalog.
pub const UNKNOWN: &str = "unknown";

/// Defines a wire catalog enum with its name table and conversions.
macro_rules! catalog {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(clippy::exhaustive_enums)] // closed wire catalog
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// One past the last valid member. Never valid on the wire.
            Max,
        }

        impl $name {
            /// Every valid member, in ordinal order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical names, indexed by ordinal.
            const NAMES: &'static [&'static str] = &[$($label),+];

            /// Wire ordinal of this value.
            pub const fn ordinal(self) -> u8 {
                self as u8
            }

            /// Name for a raw wire ordinal, or [`UNKNOWN`] if out of range.
            pub fn name_of(ordinal: u8) -> &'static str {
                Self::NAMES
                    .get(usize::from(ordinal))
                    .copied()
                    .unwrap_or(UNKNOWN)
            }

            /// Canonical name of this value.
            pub fn as_str(self) -> &'static str {
                Self::name_of(self.ordinal())
            }
        }

        impl TryFrom<u8> for $name {
            /// The rejected ordinal.
            type Error = u8;

            fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
                Self::ALL.get(usize::from(ordinal)).copied().ok_or(ordinal)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value.ordinal()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| format!(concat!("unknown ", stringify!($name), ": {}"), s))
            }
        }
    };
}

catalog! {
    /// Top-level message kind, carried in the low nibble of header byte 6.
    FrameType {
        /// Request from a client to the proxy.
        Command => "command",
        /// Reply to a [`FrameType::Command`], echoing its opcode.
        Response => "response",
        /// Raw I/O data for one of the [`Stream`]s.
        Stream => "stream",
        /// Unsolicited event from the proxy.
        Notification => "notification",
    }
}

catalog! {
    /// Opcodes for [`FrameType::Command`] and [`FrameType::Response`] frames.
    Command {
        /// Announce a new VM and its hyperstart serial ports.
        RegisterVM => "RegisterVM",
        /// Forget a previously registered VM.
        UnregisterVM => "UnregisterVM",
        /// Attach to an already registered VM.
        AttachVM => "AttachVM",
        /// Forward a hyperstart command to the agent.
        Hyper => "Hyper",
        /// Claim an I/O token as a shim.
        ConnectShim => "ConnectShim",
        /// Release the shim connection.
        DisconnectShim => "DisconnectShim",
        /// Deliver a signal or terminal resize to the process.
        Signal => "Signal",
    }
}

catalog! {
    /// Opcodes for [`FrameType::Stream`] frames.
    Stream {
        /// Input towards the container process.
        Stdin => "stdin",
        /// Standard output of the container process.
        Stdout => "stdout",
        /// Standard error of the container process.
        Stderr => "stderr",
        /// Structured log entries from shims and runtimes.
        Log => "log",
    }
}

catalog! {
    /// Opcodes for [`FrameType::Notification`] frames.
    Notification {
        /// The process behind an I/O session has exited.
        ProcessExited => "ProcessExited",
    }
}
