//! Runtime configuration for a todo client.
//!
//! Values come from the environment with built-in defaults:
//!
//! | variable                | default                 |
//! |-------------------------|-------------------------|
//! | `TODO_API_URL`          | `http://localhost:3000` |
//! | `TODO_USER_ID`          | `2042`                  |
//! | `TODO_ERROR_TIMEOUT_MS` | `3000` (`0` disables)   |

use std::time::Duration;

use crate::error::ConfigError;
use crate::types::UserId;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_USER_ID: UserId = 2042;
pub const DEFAULT_ERROR_TIMEOUT: Duration = Duration::from_millis(3000);

const ENV_BASE_URL: &str = "TODO_API_URL";
const ENV_USER_ID: &str = "TODO_USER_ID";
const ENV_ERROR_TIMEOUT: &str = "TODO_ERROR_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoConfig {
    /// Base address of the remote todo service.
    pub base_url: String,
    /// Fixed user scope for every list and create.
    pub user_id: UserId,
    /// How long an error stays on screen; `None` keeps it until dismissed.
    pub error_timeout: Option<Duration>,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID,
            error_timeout: Some(DEFAULT_ERROR_TIMEOUT),
        }
    }
}

impl TodoConfig {
    pub fn new(base_url: impl Into<String>, user_id: UserId) -> Self {
        Self {
            base_url: base_url.into(),
            user_id,
            ..Default::default()
        }
    }

    pub fn with_error_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.error_timeout = timeout;
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::EmptyValue { var: ENV_BASE_URL });
            }
            config.base_url = url.to_string();
        }

        if let Some(raw) = lookup(ENV_USER_ID) {
            config.user_id = parse_number(ENV_USER_ID, &raw)?;
        }

        if let Some(raw) = lookup(ENV_ERROR_TIMEOUT) {
            config.error_timeout = match parse_number(ENV_ERROR_TIMEOUT, &raw)? {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id == 0 {
            return Err(ConfigError::MissingUserId);
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyValue { var: ENV_BASE_URL });
        }
        Ok(())
    }
}

fn parse_number(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = TodoConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TodoConfig::default());
        assert_eq!(config.user_id, 2042);
        assert_eq!(config.error_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn overrides_from_environment() {
        let config = TodoConfig::from_lookup(lookup(&[
            ("TODO_API_URL", "http://todos.test/api"),
            ("TODO_USER_ID", "7"),
            ("TODO_ERROR_TIMEOUT_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://todos.test/api");
        assert_eq!(config.user_id, 7);
        assert_eq!(config.error_timeout, None);
    }

    #[test]
    fn zero_user_id_is_rejected() {
        let err = TodoConfig::from_lookup(lookup(&[("TODO_USER_ID", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingUserId);
    }

    #[test]
    fn garbage_number_is_rejected() {
        let err = TodoConfig::from_lookup(lookup(&[("TODO_USER_ID", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { var: "TODO_USER_ID", .. }));
    }

    #[test]
    fn blank_url_is_rejected() {
        let err = TodoConfig::from_lookup(lookup(&[("TODO_API_URL", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue { .. }));
    }
}
