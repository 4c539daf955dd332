//! End-to-end relays over loopback TCP connections.

use std::net::SocketAddr;
use std::time::Duration;

use cancellable::TaskContext;
use stream_relay::{DirectionOutcome, Listener, RelayConfig, ShutdownHandle, relay_streams};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn start_relay(target: SocketAddr) -> (SocketAddr, ShutdownHandle, JoinHandle<()>) {
    let listener = Listener::bind(
        SocketAddr::from(([127, 0, 0, 1], 0)),
        target,
        RelayConfig::default(),
    )
    .await
    .unwrap();

    let address = listener.local_addr().unwrap();
    let shutdown = listener.shutdown_handle();
    let running = tokio::spawn(listener.run());

    (address, shutdown, running)
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn bytes_are_relayed_unmodified_both_ways() {
    timeout(TEST_TIMEOUT, async {
        let target = testing::loopback_listener().await.unwrap();
        let (relay_address, shutdown, running) = start_relay(target.local_addr().unwrap()).await;

        let mut client = TcpStream::connect(relay_address).await.unwrap();
        let (mut upstream, _) = target.accept().await.unwrap();

        client.write_all(&[0x61, 0x62, 0x63]).await.unwrap();

        let mut request = [0_u8; 3];
        upstream.read_exact(&mut request).await.unwrap();
        assert_eq!(request, [0x61, 0x62, 0x63]);

        upstream.write_all(&[0x78, 0x79, 0x7a]).await.unwrap();

        let mut response = [0_u8; 3];
        client.read_exact(&mut response).await.unwrap();
        assert_eq!(response, [0x78, 0x79, 0x7a]);

        shutdown.shutdown();
        running.await.unwrap();
    })
    .await
    .unwrap();
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn unreachable_target_closes_client() {
    timeout(TEST_TIMEOUT, async {
        let target = testing::unused_loopback_address().await.unwrap();
        let (relay_address, shutdown, running) = start_relay(target).await;

        let mut client = TcpStream::connect(relay_address).await.unwrap();

        // The relay drops the client as soon as its own connection attempt fails. Depending on
        // timing, the closure shows up as end of stream or as a reset.
        let mut received = Vec::new();
        let result = client.read_to_end(&mut received).await;

        assert!(received.is_empty());
        if let Ok(read) = result {
            assert_eq!(read, 0);
        }

        shutdown.shutdown();
        running.await.unwrap();
    })
    .await
    .unwrap();
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn target_closing_ends_relay() {
    timeout(TEST_TIMEOUT, async {
        let target = testing::loopback_listener().await.unwrap();
        let (relay_address, shutdown, running) = start_relay(target.local_addr().unwrap()).await;

        let mut client = TcpStream::connect(relay_address).await.unwrap();
        let (mut upstream, _) = target.accept().await.unwrap();

        upstream.write_all(b"bye").await.unwrap();
        drop(upstream);

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"bye");

        shutdown.shutdown();
        running.await.unwrap();
    })
    .await
    .unwrap();
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn shutdown_terminates_active_relays() {
    timeout(TEST_TIMEOUT, async {
        let target = testing::loopback_listener().await.unwrap();
        let (relay_address, shutdown, running) = start_relay(target.local_addr().unwrap()).await;

        let mut client = TcpStream::connect(relay_address).await.unwrap();
        let (_upstream, _) = target.accept().await.unwrap();

        shutdown.shutdown();
        running.await.unwrap();

        // The relay has been torn down, so the client sees its connection closing.
        let mut received = Vec::new();
        let result = client.read_to_end(&mut received).await;
        assert!(received.is_empty());
        if let Ok(read) = result {
            assert_eq!(read, 0);
        }
    })
    .await
    .unwrap();
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn shutdown_stops_relay_that_has_not_started_yet() {
    timeout(TEST_TIMEOUT, async {
        let target = testing::loopback_listener().await.unwrap();
        let listener = Listener::bind(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            target.local_addr().unwrap(),
            RelayConfig::default(),
        )
        .await
        .unwrap();

        let mut client = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();

        // The connection is already waiting to be accepted, so the listener accepts it and
        // spawns its relay before it notices the shutdown. On this single-threaded runtime the
        // relay task cannot run before the listener has asked it to stop.
        listener.shutdown_handle().shutdown();

        // Steady traffic keeps the client direction from ever going idle.
        let traffic = tokio::spawn(async move {
            while client.write_all(b"x").await.is_ok() {
                sleep(Duration::from_millis(100)).await;
            }
        });

        let sink = tokio::spawn(async move {
            if let Ok((mut upstream, _)) = target.accept().await {
                let mut buffer = [0_u8; 64];
                while matches!(upstream.read(&mut buffer).await, Ok(read) if read > 0) {}
            }
        });

        listener.run().await;

        traffic.abort();
        sink.abort();
    })
    .await
    .unwrap();
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn relay_streams_forwards_over_tcp_until_both_sides_close() {
    timeout(TEST_TIMEOUT, async {
        let (mut client, client_side) = testing::connected_pair().await.unwrap();
        let (server_side, mut server) = testing::connected_pair().await.unwrap();
        let context = TaskContext::new();

        let client_peer = async move {
            client.write_all(b"hello").await.unwrap();
            client.shutdown().await.unwrap();

            let mut received = Vec::new();
            client.read_to_end(&mut received).await.unwrap();
            received
        };

        let server_peer = async move {
            let mut received = Vec::new();
            server.read_to_end(&mut received).await.unwrap();

            server.write_all(b"goodbye").await.unwrap();
            server.shutdown().await.unwrap();
            received
        };

        let config = RelayConfig::default();
        let (report, client_received, server_received) = tokio::join!(
            relay_streams(&context, client_side, server_side, &config),
            client_peer,
            server_peer
        );

        assert_eq!(server_received, b"hello");
        assert_eq!(client_received, b"goodbye");

        assert_eq!(report.client_to_server.outcome, DirectionOutcome::Eof);
        assert_eq!(report.client_to_server.bytes_forwarded, 5);
        assert_eq!(report.server_to_client.outcome, DirectionOutcome::Eof);
        assert_eq!(report.server_to_client.bytes_forwarded, 7);
    })
    .await
    .unwrap();
}
