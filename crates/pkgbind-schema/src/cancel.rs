//! Cooperative cancellation for schema loads
//!
//! Loads run on the caller's thread. A token is shared with whoever may want to
//! abort the load; loaders poll it between blocking steps.

use crate::errors::SchemaError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag passed to every package load
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone of this token observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `SchemaError::Cancelled` once cancellation was requested
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.is_cancelled() {
            return Err(SchemaError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cancel::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());

        other.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(SchemaError::Cancelled)));
    }
}
