//! Queue configuration
//!
//! Retention of finished jobs, keeper cadence and deployment-specific
//! sensitive parameter keys.

use std::time::Duration;

use hashq_core::domain::sanitize::ParameterSanitizer;

/// Queue configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How long a job stays tracked after reaching a terminal state
    pub purge_after: Duration,

    /// How often the keeper looks for expired jobs
    pub keeper_interval: Duration,

    /// Parameter keys dropped from logs in addition to the default denylist
    pub extra_sensitive_params: Vec<String>,
}

impl QueueConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            purge_after: Duration::from_secs(24 * 60 * 60),
            keeper_interval: Duration::from_secs(60),
            extra_sensitive_params: Vec::new(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - HASHQ_PURGE_AFTER (optional, seconds, default: 86400)
    /// - HASHQ_KEEPER_INTERVAL (optional, seconds, default: 60)
    /// - HASHQ_SENSITIVE_PARAMS (optional, comma separated, default: none)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Builds configuration from any variable source
    pub fn from_source<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::new();

        let purge_after = match lookup("HASHQ_PURGE_AFTER") {
            Some(raw) => parse_secs("HASHQ_PURGE_AFTER", &raw)?,
            None => defaults.purge_after,
        };

        let keeper_interval = match lookup("HASHQ_KEEPER_INTERVAL") {
            Some(raw) => parse_secs("HASHQ_KEEPER_INTERVAL", &raw)?,
            None => defaults.keeper_interval,
        };

        let extra_sensitive_params = lookup("HASHQ_SENSITIVE_PARAMS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            purge_after,
            keeper_interval,
            extra_sensitive_params,
        };
        config.validate()?;
        Ok(config)
    }

    /// Adds a parameter key to drop from logs
    pub fn with_sensitive_param(mut self, key: impl Into<String>) -> Self {
        self.extra_sensitive_params.push(key.into());
        self
    }

    /// Sanitizer covering the default denylist plus the configured keys
    pub fn sanitizer(&self) -> ParameterSanitizer {
        self.extra_sensitive_params.iter().map(String::as_str).collect()
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.purge_after.is_zero() {
            anyhow::bail!("purge_after must be greater than 0");
        }

        if self.keeper_interval.is_zero() {
            anyhow::bail!("keeper_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_secs(name: &str, raw: &str) -> anyhow::Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| anyhow::anyhow!("{} must be a number of seconds: {}", name, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.purge_after, Duration::from_secs(86400));
        assert_eq!(config.keeper_interval, Duration::from_secs(60));
        assert!(config.extra_sensitive_params.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_source() {
        let config = QueueConfig::from_source(source(&[
            ("HASHQ_PURGE_AFTER", "3600"),
            ("HASHQ_KEEPER_INTERVAL", " 5 "),
            ("HASHQ_SENSITIVE_PARAMS", "api_token, ,session"),
        ]))
        .unwrap();

        assert_eq!(config.purge_after, Duration::from_secs(3600));
        assert_eq!(config.keeper_interval, Duration::from_secs(5));
        assert_eq!(config.extra_sensitive_params, vec!["api_token", "session"]);
    }

    #[test]
    fn test_from_source_uses_defaults_when_unset() {
        let config = QueueConfig::from_source(source(&[])).unwrap();
        assert_eq!(config.purge_after, QueueConfig::new().purge_after);
    }

    #[test]
    fn test_from_source_rejects_garbage() {
        assert!(QueueConfig::from_source(source(&[("HASHQ_PURGE_AFTER", "soon")])).is_err());
    }

    #[test]
    fn test_from_source_rejects_zero_durations() {
        let err = QueueConfig::from_source(source(&[("HASHQ_KEEPER_INTERVAL", "0")])).unwrap_err();
        assert!(err.to_string().contains("keeper_interval"));

        let err = QueueConfig::from_source(source(&[("HASHQ_PURGE_AFTER", "0")])).unwrap_err();
        assert!(err.to_string().contains("purge_after"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = QueueConfig::default();
        assert!(config.validate().is_ok());

        config.purge_after = Duration::ZERO;
        assert!(config.validate().is_err());

        config.purge_after = Duration::from_secs(1);
        config.keeper_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sanitizer_includes_extra_keys() {
        let sanitizer = QueueConfig::default()
            .with_sensitive_param("api_token")
            .sanitizer();

        assert!(sanitizer.is_sensitive("api_token"));
        assert!(sanitizer.is_sensitive("hashes_file_upload"));
        assert!(!sanitizer.is_sensitive("wordlist"));
    }
}
