//! Session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default statistics poll interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Tunables of a [`crate::SessionController`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Statistics poll interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl SessionConfig {
    pub fn with_poll_interval(interval: Duration) -> Self {
        Self {
            poll_interval_ms: interval.as_millis() as u64,
        }
    }

    /// Poll interval; zero is raised to one millisecond
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        assert_eq!(SessionConfig::default().poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = SessionConfig { poll_interval_ms: 0 };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }
}
