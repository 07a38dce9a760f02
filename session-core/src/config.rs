//! Core configuration
//!
//! All values can be overridden through environment variables:
//!
//! | Environment variable | Default | Meaning |
//! |----------------------|---------|---------|
//! | SYNC_DEBOUNCE_MS     | 500     | Reload coalescing window after a change signal |
//! | ARCHIVE_SUPPRESS_MS  | 2000    | "Recently archived" suppression window |
//! | CART_WRITE_RETRIES   | 3       | Attempts for idempotent cart-mutation writes |
//! | RETRY_BASE_MS        | 1000    | Base delay for exponential backoff |

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Reload debounce interval after change notifications (milliseconds)
    pub debounce_ms: u64,
    /// How long a table stays suppressed after archival (milliseconds)
    pub archive_suppress_ms: u64,
    /// Total attempts for idempotent cart-mutation writes (min 1)
    pub cart_write_retries: u32,
    /// Base delay between retries, doubled per attempt (milliseconds)
    pub retry_base_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            debounce_ms: env_or("SYNC_DEBOUNCE_MS", 500),
            archive_suppress_ms: env_or("ARCHIVE_SUPPRESS_MS", 2000),
            cart_write_retries: env_or("CART_WRITE_RETRIES", 3),
            retry_base_ms: env_or("RETRY_BASE_MS", 1000),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn suppress_window(&self) -> Duration {
        Duration::from_millis(self.archive_suppress_ms)
    }

    pub fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
