/// Bounded fixed-interval polling
use crate::constants::{POLL_INTERVAL_SECONDS, POLL_MAX_ROUNDS};
use std::time::Duration;

/// Round budget and interval shared by every bounded wait (validation
/// records, DNS propagation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_rounds: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_rounds: POLL_MAX_ROUNDS,
            interval: Duration::from_secs(POLL_INTERVAL_SECONDS),
        }
    }
}

impl PollSettings {
    pub fn new(max_rounds: u32, interval: Duration) -> Self {
        Self {
            max_rounds,
            interval,
        }
    }

    /// Settings without any sleep between rounds
    pub fn immediate(max_rounds: u32) -> Self {
        Self::new(max_rounds, Duration::ZERO)
    }

    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poll_settings() {
        let settings = PollSettings::default();
        assert_eq!(settings.max_rounds, 60);
        assert_eq!(settings.interval, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_immediate_does_not_sleep() {
        let settings = PollSettings::immediate(5);
        let start = std::time::Instant::now();
        settings.pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
