use std::num::NonZero;

use cancellable::TaskContext;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::{Direction, DirectionOutcome, printable};

/// Forwards bytes from `source` to `destination` until end of stream, a fault or termination.
///
/// The idle deadline of the direction is pushed out before every read. Bytes are forwarded as
/// read, with no framing and no guarantee that chunk boundaries survive.
///
/// On end of stream, the write side of `destination` is shut down so the peer learns that no
/// more data is coming. Faults and termination leave `destination` as it is.
pub(crate) async fn transfer<R, W>(
    context: TaskContext,
    mut source: R,
    mut destination: W,
    direction: &Direction,
    buffer_size: NonZero<usize>,
) -> DirectionOutcome
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0_u8; buffer_size.get()];

    loop {
        direction.extend_deadline();

        let read = match context.interruptible(source.read(&mut buffer)).await {
            Ok(Ok(0)) => {
                debug!(direction = direction.name(), "end of stream");

                if let Err(error) = destination.shutdown().await {
                    debug!(direction = direction.name(), %error, "failed to shut down destination");
                }

                return DirectionOutcome::Eof;
            }
            Ok(Ok(read)) => read,
            Ok(Err(error)) => {
                debug!(direction = direction.name(), %error, "read failed");
                return DirectionOutcome::ReadFault;
            }
            Err(_) => return DirectionOutcome::Cancelled,
        };

        let Some(chunk) = buffer.get(..read) else {
            // A reader claiming to have read more than we gave it is broken.
            return DirectionOutcome::ReadFault;
        };

        trace!(
            direction = direction.name(),
            bytes = read,
            payload = %printable(chunk),
            "forwarding"
        );

        match context.interruptible(destination.write_all(chunk)).await {
            Ok(Ok(())) => direction.record_forwarded(read),
            Ok(Err(error)) => {
                debug!(direction = direction.name(), %error, "write failed");
                return DirectionOutcome::WriteFault;
            }
            Err(_) => return DirectionOutcome::Cancelled,
        }
    }
}
