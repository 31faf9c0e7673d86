use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Cooperative cancellation flag shared between a caller and the router or
/// reader it drives.
///
/// Cloning is cheap and every clone observes the same flag. Cancellation
/// is checked at operation entry, between events, and between sink writes
/// — never mid-write, so a cancelled `forward` may leave a truncated
/// entity behind. The format tolerates that: entity boundaries are
/// explicit separator bytes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that never fires until [`cancel`](Self::cancel) is called
    /// on it or one of its clones.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the flag. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether the flag has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the flag is tripped, `Ok` before.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
