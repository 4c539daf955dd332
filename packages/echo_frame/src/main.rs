//! Binary entry point for the echo server. Framing and echoing live in the library.

use std::pin::pin;
use std::process::ExitCode;

use argh::FromArgs;
use echo_frame::{DEFAULT_PORT, EchoServer};
use futures::future::{Either, select};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Echoes every length-prefixed frame it receives back to its sender.
#[derive(FromArgs)]
struct Args {
    /// address to listen on, as host[:port] (default localhost:8000)
    #[argh(positional, default = "String::from(\"localhost\")")]
    address: String,
}

#[cfg_attr(test, mutants::skip)] // Process entry point.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Args = argh::from_env();

    let Some((host, port)) = split_host_port(&args.address) else {
        eprintln!("Error: invalid address '{}'", args.address);
        eprintln!("Usage: echo_server [host[:port]]");
        return ExitCode::FAILURE;
    };

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async {
        let server = match EchoServer::bind(host, port).await {
            Ok(server) => server,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        };

        match select(pin!(server.run()), pin!(tokio::signal::ctrl_c())).await {
            Either::Left(((), _)) => ExitCode::FAILURE,
            Either::Right(_) => {
                info!("interrupt received, shutting down");
                ExitCode::SUCCESS
            }
        }
    })
}

/// Splits `host[:port]`, falling back to the default port. Bare IPv6 addresses must be
/// bracketed to carry a port.
fn split_host_port(address: &str) -> Option<(&str, u16)> {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') || host.starts_with('[') => {
            let host = host.trim_start_matches('[').trim_end_matches(']');
            Some((host, port.parse().ok()?))
        }
        _ => Some((address, DEFAULT_PORT)),
    }
}
