use std::io;
use std::net::SocketAddr;

use tokio::net::lookup_host;
use tracing::debug;

use crate::{Error, Result};

/// Resolves a `host:port` string to a socket address.
///
/// The host may be a name, an IPv4 address or a bracketed IPv6 address. If the name resolves to
/// several addresses, the first one is used.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] if `input` is not of the form `host:port` and
/// [`Error::Resolve`] if the host name cannot be resolved.
pub async fn resolve(input: &str) -> Result<SocketAddr> {
    validate(input)?;

    let mut addresses = lookup_host(input)
        .await
        .map_err(|source| Error::Resolve {
            input: input.to_string(),
            source,
        })?;

    let address = addresses.next().ok_or_else(|| Error::Resolve {
        input: input.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "host has no addresses"),
    })?;

    debug!(input, %address, "resolved address");

    Ok(address)
}

fn validate(input: &str) -> Result<()> {
    let invalid = |problem: &str| Error::InvalidAddress {
        input: input.to_string(),
        problem: problem.to_string(),
    };

    let (host, port) = input
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port"))?;

    if host.is_empty() {
        return Err(invalid("missing host"));
    }

    port.parse::<u16>()
        .map_err(|error| invalid(&format!("invalid port '{port}': {error}")))?;

    Ok(())
}
