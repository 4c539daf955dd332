use std::any::type_name;
use std::fmt;
use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use broadcast_event::Event;
use cancellable::{RaceOutcome, TaskHandle, TerminateReason, race, spawn};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{Instrument, error, info, info_span, warn};

use crate::{Error, RelayConfig, Result, relay_connection};

/// How often shutdown is repeated for a relay that has not finished yet.
const SHUTDOWN_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Accepts inbound connections and relays each of them to a fixed target.
///
/// Every accepted connection gets its own relay task. The listener keeps running until accepting
/// a connection fails or shutdown is requested through a [`ShutdownHandle`].
pub struct Listener {
    listener: TcpListener,
    target: SocketAddr,
    config: RelayConfig,
    shutdown: Arc<Event>,
}

impl Listener {
    /// Binds a listening socket on `listen` that will relay connections to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the socket cannot be bound.
    pub async fn bind(listen: SocketAddr, target: SocketAddr, config: RelayConfig) -> Result<Self> {
        let listener = TcpListener::bind(listen)
            .await
            .map_err(|source| Error::Bind {
                addr: listen,
                source,
            })?;

        Ok(Self {
            listener,
            target,
            config,
            shutdown: Arc::new(Event::new()),
        })
    }

    /// The address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocalAddress`] if the operating system cannot report the address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|source| Error::LocalAddress { source })
    }

    /// The address relayed connections are forwarded to.
    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Creates a handle that can stop the listener from another task or thread.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            event: Arc::clone(&self.shutdown),
        }
    }

    /// Accepts connections until accepting fails or shutdown is requested.
    ///
    /// On shutdown, relays that are still connecting or forwarding are terminated and this
    /// waits for them to wind down before returning.
    pub async fn run(self) {
        let target = self.target;
        let mut relays: Vec<TaskHandle<()>> = Vec::new();

        info!(listen = ?self.listener.local_addr().ok(), %target, "listening");

        let mut shutdown_requested = pin!(self.shutdown.wait());

        loop {
            let listener = &self.listener;
            let shutdown_wait = &mut shutdown_requested;

            let accepted = race(
                move |context| async move { context.interruptible(listener.accept()).await },
                move |context| async move {
                    context.interruptible(shutdown_wait.as_mut()).await
                },
            )
            .await;

            match accepted {
                RaceOutcome::First(Ok(Ok((client, peer)))) => {
                    info!(%peer, "new connection");

                    relays.retain(|relay| !relay.is_finished());
                    relays.push(spawn_relay(client, peer, target, self.config));
                }
                RaceOutcome::First(Ok(Err(error))) => {
                    error!(%error, "failed to accept connection");
                    break;
                }
                RaceOutcome::First(Err(_)) | RaceOutcome::Second(_) => {
                    info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        for relay in &relays {
            relay.terminate(TerminateReason::Shutdown);
        }

        for relay in relays {
            wind_down(relay).await;
        }

        info!("listener stopped");
    }
}

/// Waits for a relay to finish, terminating it again for as long as it keeps running.
///
/// A relay that has not reached a suspension point yet (or is between two of them) has nothing
/// that could be terminated, so a single request is not enough.
async fn wind_down(mut relay: TaskHandle<()>) {
    loop {
        relay.terminate(TerminateReason::Shutdown);

        if let Ok(result) = timeout(SHUTDOWN_RETRY_INTERVAL, &mut relay).await {
            if let Err(error) = result {
                warn!(%error, "relay task did not finish cleanly");
            }

            return;
        }
    }
}

fn spawn_relay(
    client: TcpStream,
    peer: SocketAddr,
    target: SocketAddr,
    config: RelayConfig,
) -> TaskHandle<()> {
    let span = info_span!("relay", %peer, %target);

    spawn(move |context| {
        async move {
            match relay_connection(&context, client, target, &config).await {
                Ok(report) => info!(
                    client_to_server = ?report.client_to_server.outcome,
                    server_to_client = ?report.server_to_client.outcome,
                    bytes_up = report.client_to_server.bytes_forwarded,
                    bytes_down = report.server_to_client.bytes_forwarded,
                    "relay finished"
                ),
                Err(error) => warn!(%error, "relay failed"),
            }
        }
        .instrument(span)
    })
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("local_addr", &self.listener.local_addr().ok())
            .field("target", &self.target)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Stops a [`Listener`]; see [`Listener::shutdown_handle()`].
///
/// The handle can be cloned and used from any task or thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    event: Arc<Event>,
}

impl ShutdownHandle {
    /// Stops the listener from accepting new connections and terminates its relays.
    ///
    /// Requesting shutdown more than once has no additional effect.
    pub fn shutdown(&self) {
        self.event.set();
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.event.is_set()
    }
}

impl fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("is_shutdown_requested", &self.is_shutdown_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(ShutdownHandle: Send, Sync, Clone, fmt::Debug);
    assert_impl_all!(Listener: Send, Sync, fmt::Debug);

    #[tokio::test]
    async fn shutdown_before_run_returns_immediately() {
        let listener = Listener::bind(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            SocketAddr::from(([127, 0, 0, 1], 9)),
            RelayConfig::default(),
        )
        .await
        .unwrap();

        let handle = listener.shutdown_handle();
        handle.shutdown();
        assert!(handle.is_shutdown_requested());

        listener.run().await;
    }

    #[tokio::test]
    async fn bind_failure_reports_address() {
        let occupied = testing::loopback_listener().await.unwrap();
        let addr = occupied.local_addr().unwrap();

        let error = Listener::bind(addr, addr, RelayConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Bind { addr: failed, .. } if failed == addr));
    }
}
