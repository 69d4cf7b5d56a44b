//! Cooperative cancellation for storage operations.
//!
//! Every storage operation takes a [`CancelToken`]. Long-running work polls
//! the token at safe points: between rows during a scan and between chunks
//! during delete compaction. An operation that already holds the exclusive
//! lock finishes its in-flight positional write before surfacing the
//! cancellation, so the file never ends up with a size that disagrees with
//! the row count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use eyre::{bail, Result};

/// Cloneable cancellation handle shared between a caller and the storage
/// operations it issues. All clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that is never cancelled, for callers without a cancel path.
    pub fn never() -> Self {
        Self::default()
    }

    /// Requests cancellation. Operations notice at their next poll point.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns an error if cancellation has been requested.
    pub fn bail_if_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            bail!("operation cancelled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.bail_if_cancelled().is_ok());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let clone = token.clone();

        token.cancel();

        assert!(clone.is_cancelled());
        let err = clone.bail_if_cancelled().unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn never_token_stays_quiet() {
        assert!(!CancelToken::never().is_cancelled());
    }
}
