//! Configuration
//!
//! `BotConfig` is read from an optional JSON5 file and then overridden from
//! the environment. Credentials are loaded separately and only required by
//! commands that talk to the live service.
//!
//! File resolution order: explicit `--config` path, `$ALOTBOT_CONFIG`, then
//! `<config dir>/alotbot/config.json5` if it exists. With no file, defaults
//! apply.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::autoreply::{AutoReplyConfig, ReplyRuleSet, RuleError};
use crate::logging::LoggingConfig;

/// Default liveness port
pub const DEFAULT_PORT: u16 = 5000;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "ALOTBOT_CONFIG";

/// Configuration errors; all of them are fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required credential {0}")]
    MissingCredential(&'static str),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Liveness endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Serve the liveness endpoint at all
    pub enabled: bool,
    /// Bind address
    pub bind: String,
    /// Port (`$PORT` overrides)
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub autoreply: AutoReplyConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl BotConfig {
    /// Load from file and process environment, then validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load using `env` to look up environment variables
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match resolve_config_path(path, &env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON5 config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        json5::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = non_empty(env("PORT")) {
            self.server.port = port
                .parse()
                .map_err(|e| ConfigError::invalid("PORT", format!("{}", e)))?;
        }
        if let Some(trigger) = non_empty(env("ALOTBOT_TRIGGER")) {
            self.autoreply.trigger_keyword = trigger;
        }
        if let Some(secs) = non_empty(env("ALOTBOT_MIN_INTERVAL_SECS")) {
            self.autoreply.min_interval_seconds = secs
                .parse()
                .map_err(|e| ConfigError::invalid("ALOTBOT_MIN_INTERVAL_SECS", format!("{}", e)))?;
        }
        if let Some(policy) = non_empty(env("ALOTBOT_POLICY")) {
            self.autoreply.policy = policy
                .parse()
                .map_err(|e: String| ConfigError::invalid("ALOTBOT_POLICY", e))?;
        }
        if let Some(level) = non_empty(env("ALOTBOT_LOG")) {
            self.logging.level = level;
        }
        if let Some(format) = non_empty(env("ALOTBOT_LOG_FORMAT")) {
            self.logging.format = format
                .parse()
                .map_err(|e: String| ConfigError::invalid("ALOTBOT_LOG_FORMAT", e))?;
        }
        Ok(())
    }

    /// Check every value the bot needs at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autoreply.trigger_keyword.trim().is_empty() {
            return Err(ConfigError::invalid(
                "autoreply.trigger_keyword",
                "must not be empty",
            ));
        }
        self.min_interval()?;
        self.rule_set()?;
        if self.server.enabled && self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "must be non-zero"));
        }
        Ok(())
    }

    /// Cooldown interval between replies
    pub fn min_interval(&self) -> Result<TimeDelta, ConfigError> {
        self.autoreply.min_interval().ok_or_else(|| {
            ConfigError::invalid(
                "autoreply.min_interval_seconds",
                format!(
                    "{} is not a usable interval",
                    self.autoreply.min_interval_seconds
                ),
            )
        })
    }

    /// Compiled reply rules
    pub fn rule_set(&self) -> Result<ReplyRuleSet, ConfigError> {
        Ok(self.autoreply.build_rule_set()?)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Default config file location, whether or not it exists
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("alotbot").join("config.json5"))
}

/// Resolve which config file (if any) to read
pub fn resolve_config_path<F>(explicit: Option<&Path>, env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(Path::to_path_buf)
        .or_else(|| non_empty(env(CONFIG_PATH_ENV)).map(PathBuf::from))
        .or_else(|| default_config_path().filter(|p| p.exists()))
}

/// API credentials for the posting account
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Credentials {
    pub const CONSUMER_KEY_ENV: &'static str = "TWITTER_CONSUMER_KEY";
    pub const CONSUMER_SECRET_ENV: &'static str = "TWITTER_CONSUMER_SECRET";
    pub const ACCESS_TOKEN_ENV: &'static str = "TWITTER_ACCESS_TOKEN";
    pub const ACCESS_TOKEN_SECRET_ENV: &'static str = "TWITTER_ACCESS_TOKEN_SECRET";

    /// Read all four credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials with a custom lookup; empty values count as missing
    pub fn from_lookup<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            non_empty(env(key)).ok_or(ConfigError::MissingCredential(key))
        };
        Ok(Self {
            consumer_key: require(Self::CONSUMER_KEY_ENV)?,
            consumer_secret: require(Self::CONSUMER_SECRET_ENV)?,
            access_token: require(Self::ACCESS_TOKEN_ENV)?,
            access_token_secret: require(Self::ACCESS_TOKEN_SECRET_ENV)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoreply::SelectionPolicy;
    use crate::logging::LogFormat;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json5").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = BotConfig::default();
        config.validate().unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.min_interval().unwrap(), TimeDelta::seconds(300));
    }

    #[test]
    fn test_load_json5_file() {
        let file = write_config(
            r#"{
                // comments and trailing commas are fine in JSON5
                autoreply: {
                    min_interval_seconds: 60,
                    policy: "single_cursor",
                    rules: [
                        { id: "wow", pattern: "(\\w+) alot", template: "%s alot!", case_insensitive: true },
                    ],
                },
                server: { port: 8080 },
            }"#,
        );

        let config = BotConfig::load_with(Some(file.path()), env_from(&[])).unwrap();
        assert_eq!(config.autoreply.min_interval_seconds, 60);
        assert_eq!(config.autoreply.policy, SelectionPolicy::SingleCursor);
        assert_eq!(config.autoreply.rules.len(), 1);
        assert_eq!(config.autoreply.trigger_keyword, "alot");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "0.0.0.0");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config(r#"{ server: { port: 8080 } }"#);
        let env = env_from(&[
            ("PORT", "9000"),
            ("ALOTBOT_MIN_INTERVAL_SECS", "60"),
            ("ALOTBOT_POLICY", "single_cursor"),
            ("ALOTBOT_TRIGGER", "ALOT"),
            ("ALOTBOT_LOG", "debug"),
            ("ALOTBOT_LOG_FORMAT", "json"),
        ]);

        let config = BotConfig::load_with(Some(file.path()), env).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.autoreply.min_interval_seconds, 60);
        assert_eq!(config.autoreply.policy, SelectionPolicy::SingleCursor);
        assert_eq!(config.autoreply.trigger_keyword, "ALOT");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_config_path_from_env() {
        let file = write_config(r#"{ server: { port: 7000 } }"#);
        let path = file.path().to_string_lossy().to_string();
        let config =
            BotConfig::load_with(None, env_from(&[(CONFIG_PATH_ENV, path.as_str())])).unwrap();
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_invalid_env_values_rejected() {
        let file = write_config("{}");
        let err = BotConfig::load_with(Some(file.path()), env_from(&[("PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = BotConfig::load_with(
            Some(file.path()),
            env_from(&[("ALOTBOT_POLICY", "whatever")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "ALOTBOT_POLICY"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let file = write_config("{ autoreply: { min_interval_seconds: 0 } }");
        let err = BotConfig::load_with(Some(file.path()), env_from(&[])).unwrap_err();
        assert!(err.to_string().contains("min_interval_seconds"));
    }

    #[test]
    fn test_empty_trigger_rejected() {
        let file = write_config(r#"{ autoreply: { trigger_keyword: "  " } }"#);
        assert!(BotConfig::load_with(Some(file.path()), env_from(&[])).is_err());
    }

    #[test]
    fn test_mismatched_rule_is_configuration_error() {
        let file = write_config(
            r#"{ autoreply: { rules: [ { id: "two", pattern: "(a)(b)", template: "%s" } ] } }"#,
        );
        let err = BotConfig::load_with(Some(file.path()), env_from(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Rule(RuleError::PlaceholderMismatch { groups: 2, slots: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = BotConfig::load_with(
            Some(Path::new("/nonexistent/alotbot/config.json5")),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let file = write_config("{ autoreply: ");
        let err = BotConfig::load_with(Some(file.path()), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_credentials_all_present() {
        let creds = Credentials::from_lookup(env_from(&[
            ("TWITTER_CONSUMER_KEY", "ck"),
            ("TWITTER_CONSUMER_SECRET", "cs"),
            ("TWITTER_ACCESS_TOKEN", "at"),
            ("TWITTER_ACCESS_TOKEN_SECRET", "ats"),
        ]))
        .unwrap();
        assert_eq!(creds.consumer_key, "ck");
        assert_eq!(creds.access_token_secret, "ats");
    }

    #[test]
    fn test_credentials_missing_or_empty_fail() {
        let err = Credentials::from_lookup(env_from(&[
            ("TWITTER_CONSUMER_KEY", "ck"),
            ("TWITTER_CONSUMER_SECRET", "cs"),
            ("TWITTER_ACCESS_TOKEN", ""),
            ("TWITTER_ACCESS_TOKEN_SECRET", "ats"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential("TWITTER_ACCESS_TOKEN")
        ));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials {
            consumer_key: "very-secret-key".to_string(),
            consumer_secret: "s".to_string(),
            access_token: "t".to_string(),
            access_token_secret: "ts".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("very-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
