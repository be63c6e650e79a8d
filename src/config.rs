//! Filter configuration file handling.
//!
//! Loads `filters.toml` from `~/.config/camera-filters/` or a custom path. The file maps
//! filter names to an `enabled` flag and a free-form `parameters` table:
//!
//! ```toml
//! [filters.minimize_colors]
//! enabled = true
//! parameters = { color_levels = 64 }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Commented template written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# camera-filters configuration
#
# Every registered filter is enabled unless listed here with `enabled = false`.

[filters.horizontal_flip]
enabled = true

[filters.minimize_colors]
enabled = false
parameters = { color_levels = 64 }

[filters.triangulate_effect]
enabled = false
parameters = { triangulation_level = 1 }

[filters.zoom_in_effect]
enabled = true

[filters.zoom_in_effect.parameters]
trigger_key = "space"
max_snapshots = 10
scale_speed = 0.05
total_duration = 1.0
max_scale = 3.0
"#;

/// Free-form parameter table of one filter.
pub type Parameters = toml::Table;

/// Settings for a single filter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            parameters: Parameters::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Filter name to settings mapping, read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: BTreeMap<String, FilterSettings>,
}

impl FilterConfig {
    /// Load configuration from a file path (or the default path).
    ///
    /// Strict variant: a missing or malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| match e {
            ConfigError::InvalidToml { source, .. } => ConfigError::InvalidToml {
                path: path.clone(),
                source,
            },
            other => other,
        })
    }

    /// Load configuration, falling back to the empty config on any failure.
    ///
    /// The error (if any) is handed back so the caller can log it; the stream
    /// never depends on the config file being present or valid.
    pub fn load_or_default(path: Option<&Path>) -> (Self, Option<ConfigError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidToml {
            path: PathBuf::new(),
            source: e,
        })
    }

    /// Render the config back to TOML (used by `config show`).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Whether the named filter is enabled. Unlisted filters are enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.filters.get(name).map(|s| s.enabled).unwrap_or(true)
    }

    /// Parameters of the named filter (empty for unlisted filters).
    pub fn parameters_of(&self, name: &str) -> FilterParams<'_> {
        FilterParams(self.filters.get(name).map(|s| &s.parameters))
    }
}

/// Typed, defaulting view over a filter's parameter table.
///
/// Missing keys and values of the wrong type both fall back to the given default;
/// unknown keys are never looked at.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterParams<'a>(Option<&'a Parameters>);

impl<'a> FilterParams<'a> {
    fn get(&self, key: &str) -> Option<&'a toml::Value> {
        self.0.and_then(|table| table.get(key))
    }

    /// True when no parameters are configured.
    pub fn is_empty(&self) -> bool {
        self.0.map(|t| t.is_empty()).unwrap_or(true)
    }

    /// Floating point parameter; integers are accepted.
    pub fn f64(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(toml::Value::Float(v)) => *v,
            Some(toml::Value::Integer(v)) => *v as f64,
            Some(other) => {
                log::debug!("parameter '{}' has type {}, using {}", key, other.type_str(), default);
                default
            }
            None => default,
        }
    }

    /// Non-negative integer parameter.
    pub fn u32(&self, key: &str, default: u32) -> u32 {
        match self.get(key) {
            Some(toml::Value::Integer(v)) => u32::try_from(*v).unwrap_or_else(|_| {
                log::debug!("parameter '{}' = {} out of range, using {}", key, v, default);
                default
            }),
            Some(other) => {
                log::debug!("parameter '{}' has type {}, using {}", key, other.type_str(), default);
                default
            }
            None => default,
        }
    }

    /// String parameter.
    pub fn string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(toml::Value::String(v)) => v.clone(),
            _ => default.to_string(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file '{}' not found", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file '{}': {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    InvalidToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("camera-filters").join("filters.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/camera-filters/filters.toml")
        })
}

/// Write the commented default config to `path`, creating parent directories.
///
/// Refuses to overwrite an existing file.
pub fn write_default(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::IoError {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, "file already exists"),
        });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, DEFAULT_CONFIG).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}
