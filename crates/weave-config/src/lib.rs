//! Configuration management for Weave.
//!
//! Parses `weave.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. CLI settings can be
//! applied during load via [`CliSettings`].
//!
//! Render settings (network access, recursion depth, cache policy) live in a
//! separate flat snapshot managed by [`Settings`], because they change at
//! runtime through the settings surface while `weave.toml` is edited by hand.
//!
//! ## Path Expansion
//!
//! Path values support `${VAR}`, `${VAR:-default}` and a leading `~`.
//! Expanded fields:
//! - `store.base_dir`
//! - `settings.path`

mod expand;
mod settings;
mod store;

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use settings::{RenderSettings, SettingDescriptor};
pub use store::{MemorySettingsStore, Settings, SettingsStore, TomlSettingsStore};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the document store base directory.
    pub base_dir: Option<PathBuf>,
    /// Override the persistent cache flag.
    pub persistent_cache: Option<bool>,
    /// Override the settings snapshot location.
    pub settings_path: Option<PathBuf>,
    /// Allow network access for this run without persisting it.
    pub allow_network_access: Option<bool>,
    /// Allow the inline directive for this run without persisting it.
    pub allow_inline_html: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "weave.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document store configuration (paths are relative strings from TOML).
    store: StoreConfigRaw,
    /// Content cache configuration.
    pub cache: CacheConfig,
    /// Settings snapshot configuration.
    settings: SettingsConfigRaw,

    /// Resolved store configuration (set after loading).
    #[serde(skip)]
    pub store_resolved: StoreConfig,
    /// Resolved settings snapshot path (set after loading).
    #[serde(skip)]
    pub settings_path: PathBuf,
    /// Per-run render setting overrides from the command line.
    #[serde(skip)]
    pub overrides: RenderOverrides,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw store configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StoreConfigRaw {
    base_dir: Option<String>,
}

/// Resolved document store configuration with absolute paths.
#[derive(Debug, Default)]
pub struct StoreConfig {
    /// Base directory that rooted (`/x`) references resolve against.
    pub base_dir: PathBuf,
    /// Project directory for weave data (`.weave/`).
    pub project_dir: PathBuf,
}

impl StoreConfig {
    /// Persistent cache directory (`.weave/cache/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache")
    }
}

/// Content cache configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Keep fetched content on disk between runs.
    pub persistent: bool,
}

/// Raw settings configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SettingsConfigRaw {
    path: Option<String>,
}

/// Render settings forced for the current process.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderOverrides {
    /// Force `allow_network_access`.
    pub allow_network_access: Option<bool>,
    /// Force `allow_inline_html`.
    pub allow_inline_html: Option<bool>,
}

impl RenderOverrides {
    /// Apply the overrides to a settings snapshot.
    pub fn apply(&self, settings: &mut RenderSettings) {
        if let Some(allow) = self.allow_network_access {
            settings.allow_network_access = allow;
        }
        if let Some(allow) = self.allow_inline_html {
            settings.allow_inline_html = allow;
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`store.base_dir`").
        field: String,
        /// Error message (e.g., "${`NOTES_DIR`} not set").
        message: String,
    },
    /// Unknown render setting key.
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),
    /// Render setting value that does not parse.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Setting key.
        key: String,
        /// Rejected input.
        value: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `weave.toml` in current directory and parents.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Open the persisted render settings with CLI overrides applied.
    pub fn open_settings(&self) -> Result<Settings, ConfigError> {
        let settings = Settings::load(TomlSettingsStore::new(&self.settings_path))?;
        settings.override_current(|current| self.overrides.apply(current));
        Ok(settings)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(base_dir) = &settings.base_dir {
            self.store_resolved.base_dir.clone_from(base_dir);
        }
        if let Some(persistent) = settings.persistent_cache {
            self.cache.persistent = persistent;
        }
        if let Some(path) = &settings.settings_path {
            self.settings_path.clone_from(path);
        }
        self.overrides = RenderOverrides {
            allow_network_access: settings.allow_network_access,
            allow_inline_html: settings.allow_inline_html,
        };
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let project_dir = base.join(".weave");
        Self {
            store: StoreConfigRaw::default(),
            cache: CacheConfig::default(),
            settings: SettingsConfigRaw::default(),
            store_resolved: StoreConfig {
                base_dir: base.to_path_buf(),
                project_dir: project_dir.clone(),
            },
            settings_path: project_dir.join("settings.toml"),
            overrides: RenderOverrides::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_resolved.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "store.base_dir cannot be empty".to_owned(),
            ));
        }
        if self.settings_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "settings.path cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand and resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let base_dir = match self.store.base_dir.as_deref() {
            Some(raw) => config_dir.join(expand::expand_path(raw, "store.base_dir")?),
            None => config_dir.to_path_buf(),
        };
        let project_dir = config_dir.join(".weave");

        self.settings_path = match self.settings.path.as_deref() {
            Some(raw) => config_dir.join(expand::expand_path(raw, "settings.path")?),
            None => project_dir.join("settings.toml"),
        };
        self.store_resolved = StoreConfig {
            base_dir,
            project_dir,
        };

        Ok(())
    }
}
