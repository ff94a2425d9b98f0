use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Owning side of a cooperative cancellation signal.
///
/// A `StopSource` hands out any number of [`StopToken`]s observing the same
/// flag. Requesting a stop never interrupts anything: running code only
/// notices it when it polls [`StopToken::stop_requested`].
#[derive(Clone, Default)]
pub struct StopSource {
    flag: Arc<AtomicBool>,
}

impl StopSource {
    /// Creates a source with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token observing this source.
    pub fn token(&self) -> StopToken {
        StopToken {
            flag: self.flag.clone(),
        }
    }

    /// Requests a stop.
    ///
    /// Returns `true` if this call flipped the flag, `false` if a stop had
    /// already been requested.
    pub fn request_stop(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    /// Whether a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Read-only view of a [`StopSource`], polled by running tasks.
#[derive(Clone)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// Whether the owning source has requested a stop.
    pub fn stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl fmt::Debug for StopSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopSource")
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

impl fmt::Debug for StopToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopToken")
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}
