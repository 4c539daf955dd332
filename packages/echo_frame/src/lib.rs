//! Length-prefixed message framing and an echo server built on it.
//!
//! Every message on the wire is a frame: the payload length as a big-endian `u16`, followed by
//! that many bytes of payload. A payload can therefore carry at most [`MAX_PAYLOAD_LEN`] bytes.
//!
//! [`frames()`] exposes the incoming side of a connection as a
//! [`PullSequence`][pull_sequence::PullSequence] that reads one frame per pull, and
//! [`write_frame()`] sends one frame. [`echo_frames()`] combines the two to send every frame
//! straight back to its sender.
//!
//! ```rust
//! use echo_frame::{frames, write_frame};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut wire = Vec::new();
//! write_frame(&mut wire, b"hello").await.unwrap();
//! write_frame(&mut wire, b"world").await.unwrap();
//!
//! let mut incoming = frames(std::io::Cursor::new(wire));
//!
//! assert_eq!(incoming.next().await.unwrap(), Some(b"hello".to_vec()));
//! assert_eq!(incoming.next().await.unwrap(), Some(b"world".to_vec()));
//! assert_eq!(incoming.next().await.unwrap(), None);
//! # }
//! ```

mod error;
mod frame;
mod reader;
mod server;

pub use error::*;
pub use frame::*;
pub use reader::*;
pub use server::*;
