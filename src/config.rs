//! # Configuration Management
//!
//! Centralized configuration for the DTA/DTB codec.
//!
//! Holds the defaults used by the text parser, the binary decoder and encoder,
//! and the logging setup. Every section has a `Default`, so callers only need
//! a config when they want to change something.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ```toml
//! [parse]
//! directives = true
//!
//! [encode]
//! version = 2
//! encrypt = true
//! ```

use crate::dtb::DtbVersion;
use crate::error::{DtxError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// First byte of every plain DTB stream
pub const DTB_MARKER: u8 = 0x01;

/// Size of the key stored in front of an encrypted DTB stream
pub const CRYPT_KEY_SIZE: usize = 4;

/// Default nesting limit for text and binary input
pub const MAX_NESTING_DEPTH: usize = 1024;

/// Version written when the caller does not choose one
pub const DEFAULT_DTB_VERSION: u8 = 3;

/// Root configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CodecConfig {
    /// Text parser settings
    #[serde(default)]
    pub parse: ParseConfig,

    /// Binary decoder settings
    #[serde(default)]
    pub decode: DecodeConfig,

    /// Binary encoder settings
    #[serde(default)]
    pub encode: EncodeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodecConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| DtxError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| DtxError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| DtxError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(version) = std::env::var("DTX_DTB_VERSION") {
            config.encode.version = version.parse::<u8>().map_err(|e| {
                DtxError::ConfigError(format!("Invalid DTX_DTB_VERSION '{version}': {e}"))
            })?;
        }

        if let Ok(encrypt) = std::env::var("DTX_ENCRYPT") {
            config.encode.encrypt = parse_flag("DTX_ENCRYPT", &encrypt)?;
        }

        if let Ok(directives) = std::env::var("DTX_PARSE_DIRECTIVES") {
            config.parse.directives = parse_flag("DTX_PARSE_DIRECTIVES", &directives)?;
        }

        if let Ok(depth) = std::env::var("DTX_MAX_DEPTH") {
            let depth = depth.parse::<usize>().map_err(|e| {
                DtxError::ConfigError(format!("Invalid DTX_MAX_DEPTH '{depth}': {e}"))
            })?;
            config.parse.max_depth = depth;
            config.decode.max_depth = depth;
        }

        if let Ok(level) = std::env::var("DTX_LOG_LEVEL") {
            config.logging.log_level = level
                .parse::<Level>()
                .map_err(|_| DtxError::ConfigError(format!("Invalid DTX_LOG_LEVEL '{level}'")))?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DtxError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| DtxError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.parse.validate());
        errors.extend(self.decode.validate());
        errors.extend(self.encode.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DtxError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DtxError::ConfigError(format!(
            "Invalid {name} '{value}' (expected true or false)"
        ))),
    }
}

/// Text parser configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Read `#define`, `#ifdef` and friends as directive nodes instead of symbols
    pub directives: bool,

    /// Maximum container nesting depth
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            directives: false,
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl ParseConfig {
    /// Parser settings with directive syntax enabled
    pub fn with_directives() -> Self {
        Self {
            directives: true,
            ..Self::default()
        }
    }

    /// Validate parser configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_depth == 0 {
            errors.push("Parse max depth must be greater than 0".to_string());
        }
        errors
    }
}

/// Binary decoder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Maximum container nesting depth
    pub max_depth: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl DecodeConfig {
    /// Validate decoder configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_depth == 0 {
            errors.push("Decode max depth must be greater than 0".to_string());
        }
        errors
    }
}

/// Binary encoder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// DTB layout version (1, 2 or 3)
    pub version: u8,

    /// Whether to wrap the output in the stream cipher
    pub encrypt: bool,

    /// Fixed cipher key; a random key is drawn when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<i32>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_DTB_VERSION,
            encrypt: false,
            key: None,
        }
    }
}

impl EncodeConfig {
    /// Encoder settings for a version, unencrypted
    pub fn new(version: DtbVersion) -> Self {
        Self {
            version: version.number(),
            ..Self::default()
        }
    }

    /// Same settings with encryption switched on
    pub fn encrypted(mut self) -> Self {
        self.encrypt = true;
        self
    }

    /// Same settings with a fixed cipher key
    pub fn with_key(mut self, key: i32) -> Self {
        self.key = Some(key);
        self
    }

    /// The configured version as a typed value
    pub fn dtb_version(&self) -> Result<DtbVersion> {
        DtbVersion::try_from(self.version)
    }

    /// Validate encoder configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if DtbVersion::try_from(self.version).is_err() {
            errors.push(format!(
                "Invalid DTB version: {} (valid versions: 1, 2, 3)",
                self.version
            ));
        }

        if let Some(key) = self.key {
            if key as u8 == DTB_MARKER {
                errors.push(format!(
                    "Encryption key {key:#010x} has the DTB marker as its low byte"
                ));
            }
            if !self.encrypt {
                errors.push("WARNING: Encryption key is set but encryption is disabled".to_string());
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to include the event target in each line
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("dtx-codec"),
            log_level: Level::INFO,
            log_to_console: true,
            show_target: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
