//! Greets once per second until a five second timer runs out, at which point the greeter loses
//! the race and is terminated.

use std::time::Duration;

use cancellable::{RaceOutcome, race};
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    let outcome = race(
        |context| async move {
            let mut greetings = 0_u32;

            loop {
                if let Err(terminated) = context.interruptible(sleep(Duration::from_secs(1))).await
                {
                    println!("greeter stopped: {terminated}");
                    return greetings;
                }

                println!("Hello");
                greetings = greetings.wrapping_add(1);
            }
        },
        |context| async move {
            context
                .interruptible(sleep(Duration::from_millis(5_500)))
                .await
        },
    )
    .await;

    match outcome {
        RaceOutcome::First(greetings) => println!("greeter finished after {greetings} greetings"),
        RaceOutcome::Second(_) => println!("timer ran out"),
    }
}
