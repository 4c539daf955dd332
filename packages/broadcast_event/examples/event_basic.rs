//! Two tasks wait for a signal that a third task raises.
//!
//! The event is reset afterwards and awaited again, showing that a reset event suspends
//! its waiters until it is set anew.

use broadcast_event::Event;
use futures::executor::block_on;
use futures::join;

fn main() {
    let event = Event::new();

    block_on(async {
        join!(
            async {
                println!("first waiter: waiting");
                event.wait().await;
                println!("first waiter: resumed");
            },
            async {
                println!("second waiter: waiting");
                event.wait().await;
                println!("second waiter: resumed");
            },
            async {
                println!("setter: setting the event");
                event.set();
            },
        );
    });

    // A set event does not suspend anyone.
    block_on(event.wait());
    println!("late waiter: did not suspend");

    event.reset();
    println!("event reset, is_set = {}", event.is_set());

    block_on(async {
        join!(event.wait(), async { event.set() });
    });

    println!("event set again, is_set = {}", event.is_set());
}
