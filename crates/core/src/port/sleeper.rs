// Sleeper Port (for testability)
// Every suspension point of the polling loops goes through this trait.

use async_trait::async_trait;
use std::time::Duration;

/// Sleeper interface (allows instant sleeps in tests)
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Tokio timer sleeper (production)
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Returns immediately and records every requested duration
    #[derive(Default)]
    pub struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }

        pub fn count(&self) -> usize {
            self.sleeps.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::RecordingSleeper;
    use super::*;

    #[test]
    fn test_recording_sleeper_returns_immediately() {
        let sleeper = RecordingSleeper::new();
        tokio_test::block_on(async {
            sleeper.sleep(Duration::from_secs(3600)).await;
            sleeper.sleep(Duration::from_millis(250)).await;
        });

        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_secs(3600), Duration::from_millis(250)]
        );
    }
}
