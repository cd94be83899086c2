use std::time::{SystemTime, UNIX_EPOCH};

/// Time source used for timestamps, nonces, session expiry, and the
/// pointer-sample throttle.
///
/// Injected everywhere wall-clock time is read so tests can drive refresh
/// windows and trajectory cadences deterministically.
pub trait Clock: Send + Sync {
    /// Current time as milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time source backed by [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
