//! Render settings: the user-tunable knobs of the embed engine.
//!
//! Settings are persisted as a flat key/value snapshot. Every field has a
//! default, a label and a description (see [`RenderSettings::descriptors`]) so
//! that a settings form can be generated from the table.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Upper bound accepted for `max_recursion_depth`.
const MAX_RECURSION_LIMIT: u32 = 1000;

/// Process-wide render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Permit fetching `http://` and `https://` targets.
    pub allow_network_access: bool,
    /// Permit the `inline` directive to insert raw HTML.
    pub allow_inline_html: bool,
    /// Maximum number of nested render passes.
    pub max_recursion_depth: u32,
    /// Cache local file reads (remote fetches are always cached).
    pub cache_local_files: bool,
    /// Cache freshness window in milliseconds.
    pub cache_refresh_ms: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            allow_network_access: false,
            allow_inline_html: false,
            max_recursion_depth: 20,
            cache_local_files: false,
            cache_refresh_ms: 30_000,
        }
    }
}

/// Describes one settings field for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDescriptor {
    /// Persisted key.
    pub key: &'static str,
    /// Short user-facing label.
    pub label: &'static str,
    /// One-sentence explanation.
    pub description: &'static str,
    /// Default value rendered as text.
    pub default: &'static str,
}

const DESCRIPTORS: &[SettingDescriptor] = &[
    SettingDescriptor {
        key: "allow_network_access",
        label: "Allow network access",
        description: "Fetch embeds that point at http:// or https:// locations.",
        default: "false",
    },
    SettingDescriptor {
        key: "allow_inline_html",
        label: "Allow inline HTML",
        description: "Let the inline directive insert the raw HTML of its target.",
        default: "false",
    },
    SettingDescriptor {
        key: "max_recursion_depth",
        label: "Maximum recursion depth",
        description: "How many levels of embeds inside embeds are rendered before falling back to text.",
        default: "20",
    },
    SettingDescriptor {
        key: "cache_local_files",
        label: "Cache local files",
        description: "Keep local file contents in the cache as well as remote ones.",
        default: "false",
    },
    SettingDescriptor {
        key: "cache_refresh_ms",
        label: "Cache refresh window (ms)",
        description: "Cached content older than this is fetched again.",
        default: "30000",
    },
];

impl RenderSettings {
    /// All settings fields in display order.
    #[must_use]
    pub fn descriptors() -> &'static [SettingDescriptor] {
        DESCRIPTORS
    }

    /// Current value of a field rendered as text.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "allow_network_access" => self.allow_network_access.to_string(),
            "allow_inline_html" => self.allow_inline_html.to_string(),
            "max_recursion_depth" => self.max_recursion_depth.to_string(),
            "cache_local_files" => self.cache_local_files.to_string(),
            "cache_refresh_ms" => self.cache_refresh_ms.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Parse `value` and assign it to the field named `key`.
    ///
    /// The snapshot is validated after assignment; on error `self` is left
    /// unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut next = *self;
        match key {
            "allow_network_access" => next.allow_network_access = parse_value(key, value)?,
            "allow_inline_html" => next.allow_inline_html = parse_value(key, value)?,
            "max_recursion_depth" => next.max_recursion_depth = parse_value(key, value)?,
            "cache_local_files" => next.cache_local_files = parse_value(key, value)?,
            "cache_refresh_ms" => next.cache_refresh_ms = parse_value(key, value)?,
            _ => return Err(ConfigError::UnknownSetting(key.to_owned())),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Check that numeric fields are within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_recursion_depth == 0 {
            return Err(ConfigError::Validation(
                "max_recursion_depth must be at least 1".to_owned(),
            ));
        }
        if self.max_recursion_depth > MAX_RECURSION_LIMIT {
            return Err(ConfigError::Validation(format!(
                "max_recursion_depth cannot exceed {MAX_RECURSION_LIMIT}"
            )));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        })
}
