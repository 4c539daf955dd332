//! Pulls values out of a few different producers: a word list, a computed series and a
//! producer that fails halfway.

use std::convert::Infallible;

use futures::executor::block_on;
use pull_sequence::PullSequence;

fn main() {
    block_on(async {
        let mut words = PullSequence::<_, Infallible>::from_source(
            "little Mary had a little lamb".split(' ').collect::<Vec<_>>(),
        );

        while let Ok(Some(word)) = words.next().await {
            println!("{word}");
        }

        let mut powers = PullSequence::<u32, Infallible>::new(|yielder| async move {
            yielder.yield_value(0).await;

            let mut value = 2;
            while value <= 512 {
                yielder.yield_value(value).await;
                value *= 2;
            }

            Ok(())
        });

        while let Ok(Some(value)) = powers.next().await {
            println!("{value}");
        }

        let mut failing = PullSequence::<&str, String>::new(|yielder| async move {
            yielder.yield_value("first").await;
            Err("something went wrong in the producer".to_string())
        });

        loop {
            match failing.next().await {
                Ok(Some(value)) => println!("got {value}"),
                Ok(None) => {
                    println!("sequence exhausted");
                    break;
                }
                Err(error) => println!("producer failed: {error}"),
            }
        }
    });
}
