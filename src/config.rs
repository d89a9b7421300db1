//! Configuration loading for passdeck
//!
//! Configuration is loaded from a TOML file, with defaults that work
//! out of the box when pass-cli is on the PATH.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::model::GeneratePasswordOptions;
use crate::PassCliError;

/// Default generated-password length when the caller provides no options.
pub const DEFAULT_PASSWORD_LENGTH: u32 = 20;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// pass-cli invocation configuration
    pub cli: CliConfig,
    /// Password generation defaults
    pub password: PasswordConfig,
}

/// pass-cli invocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Path override for the pass-cli binary. May carry surrounding
    /// quotes when pasted from a shell; the runner strips them.
    pub binary: Option<String>,
    /// Timeout for pass-cli commands in seconds
    pub timeout_secs: u64,
}

/// Default password type for generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordType {
    #[default]
    Random,
    Passphrase,
}

/// Password generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Default generated-password length
    pub default_length: u32,
    /// Default generated-password type
    pub default_type: PasswordType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cli: CliConfig::default(),
            password: PasswordConfig::default(),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            binary: None,
            timeout_secs: 60,
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            default_length: DEFAULT_PASSWORD_LENGTH,
            default_type: PasswordType::Random,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self, PassCliError> {
        let config_path = path.cloned().unwrap_or_else(|| {
            dirs::config_dir()
                .map(|d| d.join("passdeck").join("config.toml"))
                .unwrap_or_else(|| PathBuf::from("passdeck.toml"))
        });

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .map_err(|e| PassCliError::Unknown(format!("failed to read config: {e}")))?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| PassCliError::Unknown(format!("failed to parse config: {e}")))?;
            Ok(config)
        } else {
            tracing::info!(
                "no config file found at {}, using defaults",
                config_path.display()
            );
            Ok(Config::default())
        }
    }

    /// Command timeout as a Duration
    pub fn cli_timeout(&self) -> Duration {
        Duration::from_secs(self.cli.timeout_secs)
    }

    /// Generation options built from the configured defaults, used when
    /// the caller provides none.
    pub fn default_password_options(&self) -> GeneratePasswordOptions {
        match self.password.default_type {
            PasswordType::Random => GeneratePasswordOptions::Random {
                length: Some(self.password.default_length),
                numbers: None,
                uppercase: None,
                symbols: None,
            },
            PasswordType::Passphrase => GeneratePasswordOptions::Passphrase {
                words: None,
                separator: None,
                capitalize: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cli.timeout_secs, 60);
        assert!(config.cli.binary.is_none());
        assert_eq!(config.password.default_length, 20);
        assert_eq!(config.password.default_type, PasswordType::Random);
    }

    #[test]
    fn test_config_parsing() {
        let toml = r#"
[cli]
binary = "/usr/local/bin/pass-cli"
timeout_secs = 30

[password]
default_length = 32
default_type = "passphrase"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cli.binary.as_deref(), Some("/usr/local/bin/pass-cli"));
        assert_eq!(config.cli.timeout_secs, 30);
        assert_eq!(config.password.default_length, 32);
        assert_eq!(config.password.default_type, PasswordType::Passphrase);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: Config = toml::from_str("[password]\ndefault_length = 16\n").unwrap();
        assert_eq!(config.password.default_length, 16);
        assert_eq!(config.cli.timeout_secs, 60);
    }

    #[test]
    fn default_options_follow_configured_type() {
        let config = Config::default();
        match config.default_password_options() {
            GeneratePasswordOptions::Random { length, .. } => assert_eq!(length, Some(20)),
            other => panic!("unexpected options: {other:?}"),
        }
    }
}
