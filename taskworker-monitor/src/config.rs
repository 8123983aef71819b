//! Monitor configuration
//!
//! Defines the recent-history window and the bound placed on every call into
//! a backing store.

use std::time::Duration;

/// Default number of jobs beyond the first one returned by a recent query
pub const DEFAULT_RECENT_WINDOW: usize = 10;

/// Scheduling and monitoring configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Window used by recent queries that do not name one
    ///
    /// A window of `n` covers the `n + 1` most recently finished jobs.
    pub recent_window: usize,

    /// Maximum time a single store call may take
    pub store_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            recent_window: DEFAULT_RECENT_WINDOW,
            store_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MONITOR_RECENT_WINDOW (optional, default: 10)
    /// - MONITOR_STORE_TIMEOUT (optional, seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let recent_window = match lookup("MONITOR_RECENT_WINDOW") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("invalid MONITOR_RECENT_WINDOW {:?}: {}", raw, e))?,
            None => DEFAULT_RECENT_WINDOW,
        };

        let store_timeout = match lookup("MONITOR_STORE_TIMEOUT") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| anyhow::anyhow!("invalid MONITOR_STORE_TIMEOUT {:?}: {}", raw, e))?,
            None => Duration::from_secs(30),
        };

        let config = Self {
            recent_window,
            store_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_recent_window(mut self, recent_window: usize) -> Self {
        self.recent_window = recent_window;
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store_timeout.is_zero() {
            anyhow::bail!("store_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
