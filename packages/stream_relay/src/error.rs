use std::io;
use std::net::SocketAddr;

use cancellable::Terminated;
use thiserror::Error;

/// Errors that can occur when setting up listeners and relays.
///
/// Faults that happen while bytes are being forwarded are not errors: they end the affected
/// direction and are reported through [`DirectionOutcome`][crate::DirectionOutcome].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The outbound connection to the relay target could not be established.
    #[error("failed to connect to target {target}")]
    Connect {
        /// The target that refused or failed the connection.
        target: SocketAddr,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// The listening socket could not be bound.
    #[error("failed to listen on {addr}")]
    Bind {
        /// The address we attempted to bind.
        addr: SocketAddr,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// The local address of a bound socket could not be determined.
    #[error("failed to determine the local address of the listening socket")]
    LocalAddress {
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A `host:port` string could not be resolved to a socket address.
    #[error("failed to resolve '{input}'")]
    Resolve {
        /// The string that was being resolved.
        input: String,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// A string was not a valid `host:port` address.
    #[error("invalid address '{input}': {problem}")]
    InvalidAddress {
        /// The string that was rejected.
        input: String,

        /// A human-readable description of the problem.
        problem: String,
    },

    /// The relay task was terminated before the relay was established.
    #[error("relay setup was interrupted")]
    Interrupted(#[from] Terminated),
}

/// A specialized `Result` type for relay operations, returning the crate's [`Error`] type as the
/// error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
