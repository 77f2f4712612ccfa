//! Server configuration, read once from the environment at startup

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const PRECISION_VAR: &str = "FINPILOT_PRECISION";
pub const LOG_VAR: &str = "RUST_LOG";

pub const DEFAULT_PRECISION: u32 = 50;
pub const MIN_PRECISION: u32 = 10;
pub const MAX_PRECISION: u32 = 200;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FINPILOT_PRECISION must be a whole number of digits, got '{0}'")]
    InvalidPrecision(String),

    #[error("FINPILOT_PRECISION must be between 10 and 200, got {0}")]
    PrecisionOutOfRange(u32),

    #[error("RUST_LOG is not a valid log filter ('{filter}'): {reason}")]
    InvalidLogFilter { filter: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Working digits for ln, exp and fractional powers
    pub precision: u32,
    pub log_filter: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank keys take their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let precision = match read(PRECISION_VAR) {
            Some(raw) => {
                let digits: u32 = raw.parse().map_err(|_| ConfigError::InvalidPrecision(raw.clone()))?;
                if !(MIN_PRECISION..=MAX_PRECISION).contains(&digits) {
                    return Err(ConfigError::PrecisionOutOfRange(digits));
                }
                digits
            }
            None => DEFAULT_PRECISION,
        };

        let config = Self {
            precision,
            log_filter: read(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        };
        config.env_filter()?;
        Ok(config)
    }

    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.log_filter).map_err(|e| ConfigError::InvalidLogFilter {
            filter: self.log_filter.clone(),
            reason: e.to_string(),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c, ServerConfig::default());
        assert_eq!(c.precision, 50);
        assert_eq!(c.log_filter, "info");
    }

    #[test]
    fn test_precision_override() {
        assert_eq!(config(&[(PRECISION_VAR, " 80 ")]).unwrap().precision, 80);
        assert_eq!(config(&[(PRECISION_VAR, "")]).unwrap().precision, 50);
    }

    #[test]
    fn test_precision_rejected() {
        assert!(matches!(config(&[(PRECISION_VAR, "fifty")]), Err(ConfigError::InvalidPrecision(_))));
        assert!(matches!(config(&[(PRECISION_VAR, "-5")]), Err(ConfigError::InvalidPrecision(_))));
        assert!(matches!(config(&[(PRECISION_VAR, "5")]), Err(ConfigError::PrecisionOutOfRange(5))));
        assert!(matches!(config(&[(PRECISION_VAR, "500")]), Err(ConfigError::PrecisionOutOfRange(500))));
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(config(&[(LOG_VAR, "finpilot=debug")]).unwrap().log_filter, "finpilot=debug");
        let err = config(&[(LOG_VAR, "finpilot=notalevel")]).unwrap_err();
        assert!(err.to_string().contains(LOG_VAR));
    }
}
