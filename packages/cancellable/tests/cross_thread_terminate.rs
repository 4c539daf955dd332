//! Terminates tasks from threads other than the ones driving them.
//!
//! These tests are ignored under Miri because they use a multithreaded runtime.

use std::thread;
use std::time::Duration;

use cancellable::{TerminateReason, spawn};
use testing::with_watchdog;
use tokio::sync::oneshot;

#[cfg_attr(miri, ignore)]
#[test]
fn terminate_from_plain_thread() {
    with_watchdog(|| {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .unwrap();

        let (ready_tx, ready_rx) = oneshot::channel();

        let handle = runtime.block_on(async move {
            spawn(|context| async move {
                let pending = context.interruptible(tokio::time::sleep(Duration::from_secs(60)));
                let mut pending = std::pin::pin!(pending);

                // Poll once so the operation is registered, then report readiness.
                assert!(futures::poll!(pending.as_mut()).is_pending());
                ready_tx.send(()).unwrap();

                pending.await
            })
        });

        runtime.block_on(ready_rx).unwrap();

        let terminator = handle.terminator();
        let terminated = thread::spawn(move || terminator.terminate(TerminateReason::Shutdown))
            .join()
            .unwrap();

        assert!(terminated);

        let result = runtime.block_on(handle).unwrap();
        assert_eq!(result.unwrap_err().reason(), TerminateReason::Shutdown);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn concurrent_terminations_fire_once() {
    with_watchdog(|| {
        const THREAD_COUNT: usize = 8;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .unwrap();

        let (ready_tx, ready_rx) = oneshot::channel();

        let handle = runtime.block_on(async move {
            spawn(|context| async move {
                let pending = context.interruptible(tokio::time::sleep(Duration::from_secs(60)));
                let mut pending = std::pin::pin!(pending);

                assert!(futures::poll!(pending.as_mut()).is_pending());
                ready_tx.send(()).unwrap();

                pending.await
            })
        });

        runtime.block_on(ready_rx).unwrap();

        let fired: usize = (0..THREAD_COUNT)
            .map(|_| {
                let terminator = handle.terminator();
                thread::spawn(move || terminator.interrupt())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|thread| usize::from(thread.join().unwrap()))
            .sum();

        assert_eq!(fired, 1);
        assert!(runtime.block_on(handle).unwrap().is_err());
    });
}
