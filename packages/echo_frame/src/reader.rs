use pull_sequence::PullSequence;
use tokio::io::AsyncRead;

use crate::{FrameError, read_frame};

/// Turns a byte stream into a sequence of frame payloads.
///
/// Every pull reads exactly one frame. The sequence ends when the stream ends cleanly between
/// frames; if the stream fails or ends in the middle of a frame, the error is returned once and
/// the sequence ends.
pub fn frames<R>(mut reader: R) -> PullSequence<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    PullSequence::new(|yielder| async move {
        while let Some(payload) = read_frame(&mut reader).await? {
            yielder.yield_value(payload).await;
        }

        Ok(())
    })
}
