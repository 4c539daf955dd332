//! Sleeps twice for ten seconds. Pressing Ctrl+C during the first sleep cuts it short; during
//! the second sleep it has no effect, because that sleep is protected.

use std::time::Duration;

use cancellable::{TerminateReason, spawn};
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    let task = spawn(|context| async move {
        println!("sleeping for 10 seconds, press Ctrl+C to interrupt");

        match context.interruptible(sleep(Duration::from_secs(10))).await {
            Ok(()) => println!("woke up on time"),
            Err(terminated) => println!("sleep was cut short: {terminated}"),
        }

        println!("sleeping for 10 more seconds, Ctrl+C will be ignored");

        let protected = context
            .protected(context.interruptible(sleep(Duration::from_secs(10))))
            .await;

        println!("protected sleep finished: {protected:?}");
    });

    let terminator = task.terminator();

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            let interrupted = terminator.terminate(TerminateReason::Custom("Ctrl+C pressed"));
            println!("Ctrl+C pressed, interrupted: {interrupted}");
        }
    });

    if let Err(error) = task.await {
        eprintln!("task failed: {error}");
    }
}
