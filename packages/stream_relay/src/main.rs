//! Binary entry point for the TCP relay.
//!
//! Argument handling and process exit codes are skipped by mutation testing; the relaying itself
//! is covered through the library.

use std::error::Error as StdError;
use std::num::NonZero;
use std::process::ExitCode;
use std::time::Duration;

use argh::{EarlyExit, FromArgs};
use stream_relay::{Error, Listener, RelayConfig, resolve};
use tokio::runtime::Runtime;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: relay <listen_host:listen_port> <target_host:target_port>";

/// Relays TCP connections accepted on one address to a fixed target address, closing each
/// direction after it has been idle for a while.
#[derive(FromArgs)]
struct Args {
    /// address to accept connections on, as host:port
    #[argh(positional)]
    listen: String,

    /// address to relay connections to, as host:port
    #[argh(positional)]
    target: String,

    /// seconds a direction may stay idle before it is closed (default 5)
    #[argh(option, default = "5")]
    idle_grace_secs: u64,

    /// maximum number of bytes forwarded per read (default 1024)
    #[argh(option)]
    buffer_size: Option<NonZero<usize>>,
}

#[cfg_attr(test, mutants::skip)] // Process entry point.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let str_args: Vec<&str> = args.iter().map(String::as_str).collect();

    let program_name = str_args.first().copied().unwrap_or("relay");

    let args = match Args::from_args(&[program_name], str_args.get(1..).unwrap_or(&[])) {
        Ok(args) => args,
        Err(early_exit) => {
            // Help was requested explicitly.
            if early_exit.status.is_ok() {
                println!("{}", early_exit.output);
                return ExitCode::SUCCESS;
            }

            eprintln!("{}", argument_error(&early_exit));
            return ExitCode::FAILURE;
        }
    };

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(args))
}

/// The message for arguments that could not be parsed, ending with the usage line.
fn argument_error(early_exit: &EarlyExit) -> String {
    format!("{}\n{USAGE}", early_exit.output.trim_end())
}

#[cfg_attr(test, mutants::skip)] // See main().
async fn run(args: Args) -> ExitCode {
    let mut config = RelayConfig::builder().idle_grace(Duration::from_secs(args.idle_grace_secs));

    if let Some(buffer_size) = args.buffer_size {
        config = config.buffer_size(buffer_size);
    }

    let listener = match bind(&args, config.build()).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: {e}");

            if let Some(source) = StdError::source(&e) {
                eprintln!("Caused by: {source}");
            }

            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = listener.shutdown_handle();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                shutdown.shutdown();
            }
            Err(e) => error!(error = %e, "cannot listen for interrupt signal"),
        }
    });

    listener.run().await;

    ExitCode::SUCCESS
}

async fn bind(args: &Args, config: RelayConfig) -> Result<Listener, Error> {
    let listen = resolve(&args.listen).await?;
    let target = resolve(&args.target).await?;

    Listener::bind(listen, target, config).await
}
