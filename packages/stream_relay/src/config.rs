use std::num::NonZero;
use std::time::Duration;

const DEFAULT_IDLE_GRACE: Duration = Duration::from_secs(5);
const DEFAULT_BUFFER_SIZE: NonZero<usize> = NonZero::new(1024).expect("1024 is not zero");

/// Tuning parameters shared by every relay of a listener.
///
/// # Example
///
/// ```rust
/// use std::num::NonZero;
/// use std::time::Duration;
///
/// use stream_relay::RelayConfig;
///
/// let config = RelayConfig::builder()
///     .idle_grace(Duration::from_secs(30))
///     .buffer_size(NonZero::new(16 * 1024).unwrap())
///     .build();
///
/// assert_eq!(config.idle_grace(), Duration::from_secs(30));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    idle_grace: Duration,
    buffer_size: NonZero<usize>,
}

impl RelayConfig {
    /// Creates a builder for configuring a relay.
    #[must_use]
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::new()
    }

    /// How long a direction may go without activity before its watchdog tears it down.
    #[must_use]
    pub fn idle_grace(&self) -> Duration {
        self.idle_grace
    }

    /// The maximum number of bytes forwarded per read.
    #[must_use]
    pub fn buffer_size(&self) -> NonZero<usize> {
        self.buffer_size
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`RelayConfig`].
#[derive(Debug)]
pub struct RelayConfigBuilder {
    idle_grace: Duration,
    buffer_size: NonZero<usize>,
}

impl RelayConfigBuilder {
    fn new() -> Self {
        Self {
            idle_grace: DEFAULT_IDLE_GRACE,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Sets how long a direction may go without activity before it is torn down.
    ///
    /// Default is 5 seconds.
    #[must_use]
    pub fn idle_grace(mut self, idle_grace: Duration) -> Self {
        self.idle_grace = idle_grace;
        self
    }

    /// Sets the maximum number of bytes forwarded per read.
    ///
    /// Default is 1024.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: NonZero<usize>) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> RelayConfig {
        RelayConfig {
            idle_grace: self.idle_grace,
            buffer_size: self.buffer_size,
        }
    }
}
