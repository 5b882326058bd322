use busy_ref::Username;
use serde::Deserialize;
use std::time::Duration;

use crate::Error;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The signed-in account, if any.
    pub username: Option<Username>,
    pub feed_page_size: u32,
    pub draft_quiet_period_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: None,
            feed_page_size: 20,
            draft_quiet_period_ms: 2000,
        }
    }
}

impl ClientConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn draft_quiet_period(&self) -> Duration {
        Duration::from_millis(self.draft_quiet_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.draft_quiet_period(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_config() {
        let config =
            ClientConfig::from_json_str(r#"{ "username": "alice", "feed_page_size": 5 }"#).unwrap();
        assert_eq!(config.username, Some("alice".parse().unwrap()));
        assert_eq!(config.feed_page_size, 5);
        assert_eq!(config.draft_quiet_period_ms, 2000);
    }

    #[test]
    fn test_bad_username() {
        let result = ClientConfig::from_json_str(r#"{ "username": "Not Valid" }"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
