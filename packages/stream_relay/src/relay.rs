use std::net::SocketAddr;

use cancellable::{RaceOutcome, TaskContext, race};
use tokio::io::{AsyncRead, AsyncWrite, split};
use tokio::net::TcpStream;
use tracing::{Instrument, debug, debug_span};

use crate::{Direction, Error, RelayConfig, Result, transfer, watchdog};

/// How one direction of a relay came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DirectionOutcome {
    /// The source reached end of stream. The destination was told that no more data is coming.
    Eof,

    /// Reading from the source failed.
    ReadFault,

    /// Writing to the destination failed.
    WriteFault,

    /// Nothing arrived from the source for a full idle grace period.
    IdleExpired,

    /// The relay was terminated from the outside.
    Cancelled,
}

/// What happened in one direction of a relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct DirectionReport {
    /// How the direction ended.
    pub outcome: DirectionOutcome,

    /// How many bytes were forwarded in this direction.
    pub bytes_forwarded: u64,
}

/// What happened in a relay, once both of its directions have ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct RelayReport {
    /// Bytes read from the client and written to the server.
    pub client_to_server: DirectionReport,

    /// Bytes read from the server and written to the client.
    pub server_to_client: DirectionReport,
}

/// Relays bytes between two connected streams until both directions have ended.
///
/// Each direction runs a transfer raced against an idle watchdog: the direction ends when the
/// source reaches end of stream, a read or write fails, or no data arrives for a full idle grace
/// period. Whatever ends one direction does not directly affect the other one.
///
/// Both directions are driven by the calling task. If the task is terminated through `context`
/// while the relay is running, both directions stop forwarding and are reported as
/// [`DirectionOutcome::Cancelled`].
pub async fn relay_streams<C, S>(
    context: &TaskContext,
    client: C,
    server: S,
    config: &RelayConfig,
) -> RelayReport
where
    C: AsyncRead + AsyncWrite,
    S: AsyncRead + AsyncWrite,
{
    let (client_read, client_write) = split(client);
    let (server_read, server_write) = split(server);

    let upstream = Direction::new("client_to_server", config.idle_grace());
    let downstream = Direction::new("server_to_client", config.idle_grace());

    let directions = async {
        futures::join!(
            run_direction(client_read, server_write, &upstream, config),
            run_direction(server_read, client_write, &downstream, config),
        )
    };

    let (upstream_outcome, downstream_outcome) = match context.interruptible(directions).await {
        Ok(outcomes) => outcomes,
        Err(terminated) => {
            debug!(reason = %terminated.reason(), "relay terminated");
            (DirectionOutcome::Cancelled, DirectionOutcome::Cancelled)
        }
    };

    RelayReport {
        client_to_server: DirectionReport {
            outcome: upstream_outcome,
            bytes_forwarded: upstream.forwarded(),
        },
        server_to_client: DirectionReport {
            outcome: downstream_outcome,
            bytes_forwarded: downstream.forwarded(),
        },
    }
}

/// Connects to `target` and relays bytes between `client` and the new connection.
///
/// Both connections are closed when the relay ends.
///
/// # Errors
///
/// Returns [`Error::Connect`] if the target cannot be reached; `client` is closed without any
/// data being forwarded and no retry is attempted. Returns [`Error::Interrupted`] if the task is
/// terminated while still connecting.
pub async fn relay_connection(
    context: &TaskContext,
    client: TcpStream,
    target: SocketAddr,
    config: &RelayConfig,
) -> Result<RelayReport> {
    let server = context
        .interruptible(TcpStream::connect(target))
        .await?
        .map_err(|source| Error::Connect { target, source })?;

    debug!(%target, "connected to target");

    Ok(relay_streams(context, client, server, config).await)
}

async fn run_direction<R, W>(
    source: R,
    destination: W,
    direction: &Direction,
    config: &RelayConfig,
) -> DirectionOutcome
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let span = debug_span!("direction", name = direction.name());

    let outcome = race(
        |context| transfer(context, source, destination, direction, config.buffer_size()),
        |context| watchdog(context, direction),
    )
    .instrument(span)
    .await;

    let outcome = match outcome {
        RaceOutcome::First(outcome) | RaceOutcome::Second(outcome) => outcome,
    };

    debug!(
        direction = direction.name(),
        ?outcome,
        bytes_forwarded = direction.forwarded(),
        "direction finished"
    );

    outcome
}
