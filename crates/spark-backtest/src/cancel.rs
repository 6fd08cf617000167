//! Cooperative cancellation for long runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked by the simulator between bars.
///
/// Clones observe the same flag, so one handle can stop many runs.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_cancelled());

        handle.cancel();
        assert!(clone.is_cancelled());
    }
}
