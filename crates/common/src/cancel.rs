//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{StoryError, StoryResult};

/// Shared stop flag checked at every suspension point of an export.
///
/// Clones observe the same flag. Cancelling is sticky.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(StoryError::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> StoryResult<()> {
        if self.is_cancelled() {
            Err(StoryError::Cancelled)
        } else {
            Ok(())
        }
    }
}
