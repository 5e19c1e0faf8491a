//! Dedup window configuration.
//!
//! A window is not stored anywhere. It exists only as the TTL attached to each
//! tracked identifier and as the cadence of the aggregator. The two run
//! independently, so the window is approximate: an identifier may expire by
//! TTL before the next cycle clears it, or survive slightly past one window if
//! it arrives just before a snapshot.

use std::fmt;
use std::time::Duration;

/// Default window length and aggregation period.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Longest accepted window or aggregation period (one year).
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Default namespace prefix for tracked identifier keys.
pub const DEFAULT_KEY_PREFIX: &str = "request_id:";

/// Error returned when a window duration is unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// Window must last at least one millisecond
    TooShort(Duration),
    /// Window must not exceed `MAX_WINDOW`
    TooLong(Duration),
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowError::TooShort(d) => {
                write!(f, "window must be at least 1ms, got {:?}", d)
            }
            WindowError::TooLong(d) => {
                write!(f, "window must be at most {:?}, got {:?}", MAX_WINDOW, d)
            }
        }
    }
}

impl std::error::Error for WindowError {}

/// The lifetime of a tracked identifier record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    ttl: Duration,
}

impl Window {
    /// Create a window with the given TTL.
    ///
    /// # Errors
    /// Returns `WindowError::TooShort` if `ttl` is below one millisecond, since
    /// stores express expiry in whole milliseconds, or `WindowError::TooLong`
    /// if it exceeds `MAX_WINDOW`.
    pub fn new(ttl: Duration) -> Result<Self, WindowError> {
        if ttl < Duration::from_millis(1) {
            return Err(WindowError::TooShort(ttl));
        }
        if ttl > MAX_WINDOW {
            return Err(WindowError::TooLong(ttl));
        }
        Ok(Self { ttl })
    }

    /// TTL applied to each tracked identifier.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_WINDOW,
        }
    }
}
