//! Query policy and environment configuration.
//!
//! Values come from environment variables with fallback to defaults.
//!
//! | Variable                     | Default          |
//! |------------------------------|------------------|
//! | `ORDERDESK_DB_PATH`          | `./orderdesk.db` |
//! | `ORDERDESK_MAX_CONNECTIONS`  | `5`              |
//! | `ORDERDESK_BUSY_TIMEOUT_MS`  | `5000`           |
//! | `ORDERDESK_MAX_RESULTS`      | `1000`           |
//! | `ORDERDESK_BATCH_SIZE`       | `1000`           |

use std::env;
use std::str::FromStr;

/// Default cap on rows returned by any unbounded search.
pub const DEFAULT_MAX_RESULTS: u32 = 1000;

/// Default number of order ids per batched line-item follow-up query.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Limits applied by the order query core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// Row cap for unbounded searches and the largest accepted page size.
    pub max_results: u32,

    /// Most order ids bound into one `IN (...)` follow-up query.
    pub batch_size: usize,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        QueryPolicy {
            max_results: DEFAULT_MAX_RESULTS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl QueryPolicy {
    /// Sets the row cap. Zero is raised to one.
    pub fn max_results(mut self, max: u32) -> Self {
        self.max_results = max.max(1);
        self
    }

    /// Sets the follow-up batch size. Zero is raised to one.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Loads the policy from `ORDERDESK_MAX_RESULTS` / `ORDERDESK_BATCH_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = QueryPolicy::default();
        let max_results: u32 = env_or("ORDERDESK_MAX_RESULTS", defaults.max_results)?;
        let batch_size: usize = env_or("ORDERDESK_BATCH_SIZE", defaults.batch_size)?;

        if max_results == 0 {
            return Err(ConfigError::InvalidValue("ORDERDESK_MAX_RESULTS".to_string()));
        }
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue("ORDERDESK_BATCH_SIZE".to_string()));
        }

        Ok(QueryPolicy {
            max_results,
            batch_size,
        })
    }
}

/// Reads `key` and parses it, or returns `default` when unset.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = QueryPolicy::default();
        assert_eq!(policy.max_results, 1000);
        assert_eq!(policy.batch_size, 1000);
    }

    #[test]
    fn test_builder_clamps_zero() {
        let policy = QueryPolicy::default().max_results(0).batch_size(0);
        assert_eq!(policy.max_results, 1);
        assert_eq!(policy.batch_size, 1);
    }

    #[test]
    fn test_env_or_parses_and_rejects() {
        assert_eq!(env_or("ORDERDESK_TEST_UNSET_KEY", 7u32).unwrap(), 7);

        env::set_var("ORDERDESK_TEST_BAD_NUMBER", "lots");
        let err = env_or::<u32>("ORDERDESK_TEST_BAD_NUMBER", 1).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for ORDERDESK_TEST_BAD_NUMBER");

        env::set_var("ORDERDESK_TEST_GOOD_NUMBER", " 25 ");
        assert_eq!(env_or("ORDERDESK_TEST_GOOD_NUMBER", 1u32).unwrap(), 25);
    }
}
