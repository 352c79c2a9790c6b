//! Engine configuration.
//!
//! # Responsibility
//! - Hold the timing and limit constants of the collections engine.
//! - Load them from TOML, falling back to defaults for missing keys.
//!
//! # Invariants
//! - A config returned by `from_toml_str`/`load` has passed `validate()`.
//! - Delays and limits are strictly positive.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Upper bound for every delay setting (one day).
pub const MAX_DELAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Configuration loading and validation error.
#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse(toml::de::Error),
    Invalid { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config toml: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay before a user message moves from sending to sent.
    #[serde(default = "default_sent_delay_ms")]
    pub sent_delay_ms: u64,
    /// Delay before the assistant reply (or regeneration) lands.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    /// Auto-save debounce window for note edits.
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    /// Note card preview length, in characters.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    #[serde(default = "default_untitled_note_title")]
    pub untitled_note_title: String,
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_sent_delay_ms() -> u64 {
    1_000
}

fn default_reply_delay_ms() -> u64 {
    2_000
}

fn default_autosave_delay_ms() -> u64 {
    2_000
}

fn default_max_message_chars() -> usize {
    2_000
}

fn default_preview_chars() -> usize {
    120
}

fn default_untitled_note_title() -> String {
    crate::model::note::DEFAULT_NOTE_TITLE.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sent_delay_ms: default_sent_delay_ms(),
            reply_delay_ms: default_reply_delay_ms(),
            autosave_delay_ms: default_autosave_delay_ms(),
            max_message_chars: default_max_message_chars(),
            preview_chars: default_preview_chars(),
            untitled_note_title: default_untitled_note_title(),
            log_level: None,
        }
    }
}

impl EngineConfig {
    /// Parses and validates TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("sent_delay_ms", self.sent_delay_ms),
            ("reply_delay_ms", self.reply_delay_ms),
            ("autosave_delay_ms", self.autosave_delay_ms),
            ("max_message_chars", self.max_message_chars as u64),
            ("preview_chars", self.preview_chars as u64),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        let delays = [
            ("sent_delay_ms", self.sent_delay_ms),
            ("reply_delay_ms", self.reply_delay_ms),
            ("autosave_delay_ms", self.autosave_delay_ms),
        ];
        for (field, value) in delays {
            if value > MAX_DELAY_MS {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be at most {MAX_DELAY_MS} ms"),
                });
            }
        }
        if self.untitled_note_title.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "untitled_note_title",
                reason: "cannot be blank".to_string(),
            });
        }
        Ok(())
    }

    pub fn sent_delay(&self) -> TimeDelta {
        millis(self.sent_delay_ms)
    }

    pub fn reply_delay(&self) -> TimeDelta {
        millis(self.reply_delay_ms)
    }

    pub fn autosave_delay(&self) -> TimeDelta {
        millis(self.autosave_delay_ms)
    }
}

fn millis(value: u64) -> TimeDelta {
    TimeDelta::milliseconds(value.min(MAX_DELAY_MS) as i64)
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};

    #[test]
    fn missing_keys_take_defaults() {
        let config = EngineConfig::from_toml_str("reply_delay_ms = 500\n").expect("valid toml");
        assert_eq!(config.reply_delay_ms, 500);
        assert_eq!(config.sent_delay_ms, 1_000);
        assert_eq!(config.max_message_chars, 2_000);
        assert_eq!(config.untitled_note_title, "Untitled Note");
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn zero_delay_is_rejected() {
        let err = EngineConfig::from_toml_str("autosave_delay_ms = 0").expect_err("zero delay");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "autosave_delay_ms",
                ..
            }
        ));
    }

    #[test]
    fn delays_longer_than_a_day_are_rejected() {
        let err = EngineConfig::from_toml_str("sent_delay_ms = 86400001").expect_err("too long");
        assert!(err.to_string().contains("sent_delay_ms"));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let err = EngineConfig::from_toml_str("sent_delay_ms = \"soon\"").expect_err("bad type");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
