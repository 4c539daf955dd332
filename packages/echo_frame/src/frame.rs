use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::FrameError;

/// The largest payload a single frame can carry.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

const HEADER_LEN: usize = size_of::<u16>();

/// Writes `payload` as one frame: its length as a big-endian `u16`, followed by the payload.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] without writing anything if the payload is longer than
/// [`MAX_PAYLOAD_LEN`], or [`FrameError::Io`] if writing fails.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let Ok(len) = u16::try_from(payload.len()) else {
        return Err(FrameError::TooLarge { len: payload.len() });
    };

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;

    Ok(())
}

/// Reads one frame and returns its payload.
///
/// Returns `Ok(None)` if the stream ends cleanly before the first byte of a frame.
///
/// # Errors
///
/// Returns [`FrameError::Truncated`] if the stream ends in the middle of a frame, or
/// [`FrameError::Io`] if reading fails.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0_u8; HEADER_LEN];
    let got = read_full(reader, &mut header).await?;

    if got == 0 {
        return Ok(None);
    }

    if got < HEADER_LEN {
        return Err(FrameError::Truncated {
            expected: HEADER_LEN,
            got,
        });
    }

    let expected = usize::from(u16::from_be_bytes(header));
    let mut payload = vec![0_u8; expected];
    let got = read_full(reader, &mut payload).await?;

    if got < expected {
        return Err(FrameError::Truncated { expected, got });
    }

    Ok(Some(payload))
}

/// Fills `buffer` unless the stream ends first. Returns how many bytes were read.
async fn read_full<R>(reader: &mut R, buffer: &mut [u8]) -> Result<usize, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;

    while let Some(remaining) = buffer.get_mut(filled..) {
        if remaining.is_empty() {
            break;
        }

        let read = reader.read(remaining).await?;

        if read == 0 {
            break;
        }

        filled = filled.saturating_add(read);
    }

    Ok(filled)
}
