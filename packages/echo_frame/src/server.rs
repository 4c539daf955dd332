use std::any::type_name;
use std::fmt;
use std::io;
use std::net::SocketAddr;

use futures::future::join_all;
use tokio::io::{AsyncRead, AsyncWrite, split};
use tokio::net::{TcpListener, lookup_host};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{FrameError, frames, write_frame};

/// Port the echo server listens on when none is given.
pub const DEFAULT_PORT: u16 = 8000;

/// Echoes every frame received on `stream` back as a frame, until the stream ends.
///
/// Returns the number of frames echoed.
///
/// # Errors
///
/// Returns the first error that ends the conversation: a failed read or write, or a frame cut
/// short by the end of the stream. The connection is not retried.
pub async fn echo_frames<S>(stream: S) -> Result<u64, FrameError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, mut writer) = split(stream);
    let mut frames = frames(reader);
    let mut echoed: u64 = 0;

    while let Some(payload) = frames.next().await? {
        debug!(len = payload.len(), "echoing frame");

        write_frame(&mut writer, &payload).await?;
        echoed = echoed.saturating_add(1);
    }

    Ok(echoed)
}

/// Accepts connections on one or more sockets and echoes frames on each connection.
pub struct EchoServer {
    listeners: Vec<TcpListener>,
}

impl EchoServer {
    /// Binds every address `host` resolves to, on `port`.
    ///
    /// Addresses that cannot be bound are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` cannot be resolved or no address could be bound.
    pub async fn bind(host: &str, port: u16) -> io::Result<Self> {
        let mut listeners = Vec::new();

        for address in lookup_host((host, port)).await? {
            match TcpListener::bind(address).await {
                Ok(listener) => {
                    info!(%address, "listening");
                    listeners.push(listener);
                }
                Err(error) => warn!(%address, %error, "cannot listen on address"),
            }
        }

        if listeners.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no address of '{host}' could be bound"),
            ));
        }

        Ok(Self { listeners })
    }

    /// The addresses the server is listening on.
    #[must_use]
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.listeners
            .iter()
            .filter_map(|listener| listener.local_addr().ok())
            .collect()
    }

    /// Serves connections until accepting fails on every socket.
    pub async fn run(self) {
        join_all(self.listeners.into_iter().map(accept_loop)).await;
    }
}

async fn accept_loop(listener: TcpListener) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                warn!(%error, "failed to accept connection");
                return;
            }
        };

        info!(%peer, "new connection");

        tokio::spawn(
            async move {
                match echo_frames(stream).await {
                    Ok(echoed) => info!(echoed, "connection closed"),
                    Err(error) => info!(%error, "connection dropped"),
                }
            }
            .instrument(info_span!("echo", %peer)),
        );
    }
}

impl fmt::Debug for EchoServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("local_addrs", &self.local_addrs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    use super::*;
    use crate::read_frame;

    #[tokio::test]
    async fn echoes_frames_until_end_of_stream() {
        let (mut client, server) = duplex(256);

        let echo = tokio::spawn(echo_frames(server));

        write_frame(&mut client, b"little").await.unwrap();
        write_frame(&mut client, b"lamb").await.unwrap();

        assert_eq!(read_frame(&mut client).await.unwrap(), Some(b"little".to_vec()));
        assert_eq!(read_frame(&mut client).await.unwrap(), Some(b"lamb".to_vec()));

        client.shutdown().await.unwrap();

        assert_eq!(echo.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn truncated_frame_ends_conversation() {
        let (mut client, server) = duplex(256);

        let echo = tokio::spawn(echo_frames(server));

        client.write_all(&[0, 10, b'a']).await.unwrap();
        client.shutdown().await.unwrap();

        let result = echo.await.unwrap();
        assert!(matches!(
            result,
            Err(FrameError::Truncated {
                expected: 10,
                got: 1
            })
        ));

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }
}
