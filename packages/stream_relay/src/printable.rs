use std::fmt;

/// Renders bytes for logging, keeping printable ASCII as is and escaping everything else as
/// `\xNN`.
///
/// ```rust
/// use stream_relay::printable;
///
/// assert_eq!(printable(b"GET /\r\n").to_string(), r"GET /\x0d\x0a");
/// ```
pub fn printable(bytes: &[u8]) -> Printable<'_> {
    Printable { bytes }
}

/// Display adapter returned by [`printable()`].
#[derive(Clone, Copy, Debug)]
pub struct Printable<'a> {
    bytes: &'a [u8],
}

impl fmt::Display for Printable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.bytes {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", char::from(byte))?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }

        Ok(())
    }
}
