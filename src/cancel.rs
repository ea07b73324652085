use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{OptimizeError, Result};

/// Cooperative stop signal, polled between piece placements and between
/// genetic generations. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<(Instant, u64)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some((Instant::now() + Duration::from_millis(timeout_ms), timeout_ms)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(OptimizeError::Cancelled);
        }
        if let Some((deadline, ms)) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(OptimizeError::Timeout(ms));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(token.check().is_ok());
        handle.cancel();
        assert_eq!(token.check(), Err(OptimizeError::Cancelled));
    }

    #[test]
    fn test_zero_timeout_expires() {
        let token = CancelToken::with_timeout(0);
        assert_eq!(token.check(), Err(OptimizeError::Timeout(0)));
    }
}
