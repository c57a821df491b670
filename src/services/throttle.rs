use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Per-identity cooldown between searches.
#[derive(Debug)]
pub struct Cooldown {
    window: Duration,
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl Cooldown {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request from `identity`. Returns the time left to wait when
    /// the previous accepted request was less than one window ago; rejected
    /// requests do not extend the wait.
    pub fn check(&self, identity: &str) -> Result<(), Duration> {
        if self.window.is_zero() {
            return Ok(());
        }

        let now = Instant::now();
        let mut last_seen = self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = last_seen.get(identity) {
            let elapsed = now.duration_since(*previous);
            if elapsed < self.window {
                return Err(self.window - elapsed);
            }
        }

        last_seen.retain(|_, seen| now.duration_since(*seen) < self.window);
        last_seen.insert(identity.to_string(), now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_second_request_within_window_is_rejected() {
        let cooldown = Cooldown::new(Duration::from_secs(2));
        assert!(cooldown.check("1").is_ok());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(cooldown.check("1"), Err(Duration::from_millis(1500)));
        assert!(cooldown.check("2").is_ok());

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(cooldown.check("1").is_ok());
    }

    #[test]
    fn test_zero_window_never_throttles() {
        let cooldown = Cooldown::new(Duration::ZERO);
        assert!(cooldown.check("1").is_ok());
        assert!(cooldown.check("1").is_ok());
    }
}
