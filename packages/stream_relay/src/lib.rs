//! A TCP relay that forwards bytes between a client and a fixed target.
//!
//! Every accepted connection is paired with an outbound connection to the target and bytes are
//! forwarded verbatim in both directions. Each direction has its own idle watchdog: if nothing
//! arrives from the source of a direction for a full grace period, that direction is torn down.
//! The other direction carries on until it ends on its own, typically because the peer noticed
//! the closure.
//!
//! The building blocks are:
//!
//! * [`Listener`] accepts connections and spawns one relay task per connection.
//! * [`relay_connection()`] connects to the target and relays one accepted connection.
//! * [`relay_streams()`] relays between any two already connected streams.
//!
//! ```rust no_run
//! use stream_relay::{Listener, RelayConfig, resolve};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), stream_relay::Error> {
//! let listen = resolve("127.0.0.1:8080").await?;
//! let target = resolve("example.com:80").await?;
//!
//! let listener = Listener::bind(listen, target, RelayConfig::default()).await?;
//! listener.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The relay emits `tracing` events: connections and relay summaries at `info`, direction
//! endings at `debug` and every forwarded chunk at `trace` (rendered via [`printable()`]).

mod address;
mod config;
mod direction;
mod error;
mod listener;
mod printable;
mod relay;
mod transfer;
mod watchdog;

pub use address::*;
pub use config::*;
pub(crate) use direction::*;
pub use error::*;
pub use listener::*;
pub use printable::*;
pub use relay::*;
pub(crate) use transfer::*;
pub(crate) use watchdog::*;
