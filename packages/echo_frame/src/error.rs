use std::io;

use thiserror::Error;

/// Errors that end a framed conversation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameError {
    /// The underlying stream failed.
    #[error("I/O error on framed stream")]
    Io(#[from] io::Error),

    /// A payload was too long to describe with the two-byte length prefix.
    #[error("payload of {len} bytes does not fit in a frame")]
    TooLarge {
        /// Length of the rejected payload.
        len: usize,
    },

    /// The stream ended in the middle of a frame.
    #[error("stream ended after {got} of {expected} bytes")]
    Truncated {
        /// How many bytes the frame part should have had.
        expected: usize,

        /// How many bytes arrived before the stream ended.
        got: usize,
    },
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(FrameError: Send, Sync, Debug);

    #[test]
    fn truncated_describes_progress() {
        let error = FrameError::Truncated {
            expected: 10,
            got: 4,
        };

        assert_eq!(error.to_string(), "stream ended after 4 of 10 bytes");
    }
}
