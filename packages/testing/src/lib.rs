#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples in the relay packages.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

/// Runs a test with a timeout to prevent infinite hangs.
///
/// If the test takes longer than the timeout to complete, the test fails instead of hanging the
/// build. The timeout is 10 seconds under normal conditions and 60 seconds under Miri, where
/// thread synchronization primitives are significantly slower.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled and
/// the test function is executed directly, so mutation testing can detect hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode).
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver has timed out.
        drop(tx.send(result));
    });

    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_handle.join().expect("Test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("Test exceeded {} second timeout", timeout.as_secs());
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_handle.join() {
            Ok(()) => panic!("Test thread disconnected unexpectedly"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

/// Binds a listener to an ephemeral port on the IPv4 loopback interface.
///
/// # Errors
///
/// Returns the I/O error if the operating system refuses to bind the socket.
pub async fn loopback_listener() -> io::Result<TcpListener> {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await
}

/// Creates a pair of TCP streams connected to each other over the loopback interface.
///
/// # Errors
///
/// Returns the I/O error if binding, connecting or accepting fails.
pub async fn connected_pair() -> io::Result<(TcpStream, TcpStream)> {
    let listener = loopback_listener().await?;
    let address = listener.local_addr()?;

    let (connected, accepted) = tokio::join!(TcpStream::connect(address), listener.accept());

    Ok((connected?, accepted?.0))
}

/// An address on the loopback interface that nobody is listening on.
///
/// The port was bound and released again, so connecting to it is refused unless something
/// else grabbed the port in the meantime.
///
/// # Errors
///
/// Returns the I/O error if binding the temporary listener fails.
pub async fn unused_loopback_address() -> io::Result<SocketAddr> {
    let listener = loopback_listener().await?;
    listener.local_addr()
}
