//! Timeout constants for activation attempts
//!
//! The callback from the KWin script is awaited with a single bounded deadline.
//! The wait ends as soon as the callback arrives, so the deadline only costs
//! time when no callback ever shows up.

use std::time::Duration;

/// Default wait for the WindowFound/WindowNotFound callback (500ms)
/// KWin runs the script on its own event loop, so delivery is not instant
pub const SIGNAL_TIMEOUT_MS: u64 = 500;

/// Lower bound accepted from config and CLI (1ms)
/// Anything shorter cannot observe a real bus round trip at all
pub const MIN_SIGNAL_TIMEOUT_MS: u64 = 1;

/// Upper bound accepted from config and CLI (10s)
pub const MAX_SIGNAL_TIMEOUT_MS: u64 = 10_000;

/// Get the default signal deadline
pub fn signal_timeout() -> Duration {
    Duration::from_millis(SIGNAL_TIMEOUT_MS)
}

/// Clamp a user-supplied deadline into the accepted range
pub fn clamp_signal_timeout(ms: u64) -> Duration {
    Duration::from_millis(ms.clamp(MIN_SIGNAL_TIMEOUT_MS, MAX_SIGNAL_TIMEOUT_MS))
}
