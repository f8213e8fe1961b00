use crate::error::{BlockchainError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How many nonces are tried between checks of the cancel flag and deadline.
pub const CHECK_INTERVAL: u64 = 1024;

/// Cancellation handle for a proof-of-work search.
///
/// Clones share one flag, so a clone handed to another thread can stop a
/// search running elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MiningControl {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl MiningControl {
    pub fn new() -> MiningControl {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> MiningControl {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> MiningControl {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn get_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Error out if the search should stop; `attempts` is reported back.
    pub fn check(&self, attempts: u64) -> Result<()> {
        if self.is_cancelled() {
            return Err(BlockchainError::MiningCancelled { attempts });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(BlockchainError::MiningDeadline { attempts });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_control_allows_mining() {
        assert!(MiningControl::new().check(0).is_ok());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let control = MiningControl::new();
        let remote = control.clone();
        remote.cancel();
        assert!(control.is_cancelled());
        assert!(matches!(
            control.check(7),
            Err(BlockchainError::MiningCancelled { attempts: 7 })
        ));
    }

    #[test]
    fn test_expired_deadline() {
        let control = MiningControl::new().with_deadline(Instant::now());
        assert!(matches!(
            control.check(1),
            Err(BlockchainError::MiningDeadline { attempts: 1 })
        ));
    }

    #[test]
    fn test_future_deadline() {
        let control = MiningControl::new().with_timeout(Duration::from_secs(3600));
        assert!(control.get_deadline().is_some());
        assert!(control.check(0).is_ok());
    }
}
