//! Persistence for [`RenderSettings`].
//!
//! A [`SettingsStore`] reads and writes the full settings snapshot. [`Settings`]
//! owns the current snapshot, hands out copies to readers and persists the
//! whole snapshot on every change.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::{ConfigError, RenderSettings};

/// Backend that persists a settings snapshot.
pub trait SettingsStore: Send + Sync {
    /// Read the persisted snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<RenderSettings>, ConfigError>;

    /// Replace the persisted snapshot.
    fn save(&self, settings: &RenderSettings) -> Result<(), ConfigError>;
}

/// TOML file store.
///
/// Saves go through a temporary file in the same directory followed by a
/// rename, so readers never observe a half-written snapshot.
#[derive(Debug)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    /// Create a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<Option<RenderSettings>, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(toml::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, settings: &RenderSettings) -> Result<(), ConfigError> {
        let content = toml::to_string(settings)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.persist(&self.path).map_err(|e| e.error)?;

        tracing::info!(path = %self.path.display(), "Saved render settings");
        Ok(())
    }
}

/// In-memory store that records how many times it was saved.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    saved: Mutex<Option<RenderSettings>>,
    saves: Mutex<usize>,
}

impl MemorySettingsStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a snapshot.
    #[must_use]
    pub fn with_snapshot(settings: RenderSettings) -> Self {
        Self {
            saved: Mutex::new(Some(settings)),
            saves: Mutex::new(0),
        }
    }

    /// Number of completed saves.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<RenderSettings>, ConfigError> {
        Ok(*self.saved.lock().unwrap())
    }

    fn save(&self, settings: &RenderSettings) -> Result<(), ConfigError> {
        *self.saved.lock().unwrap() = Some(*settings);
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Owned settings state: current snapshot plus the store it persists to.
pub struct Settings {
    current: RwLock<RenderSettings>,
    store: Box<dyn SettingsStore>,
}

impl Settings {
    /// Load the persisted snapshot, falling back to defaults when none exists.
    pub fn load(store: impl SettingsStore + 'static) -> Result<Self, ConfigError> {
        let current = store.load()?.unwrap_or_default();
        current.validate()?;
        Ok(Self {
            current: RwLock::new(current),
            store: Box::new(store),
        })
    }

    /// Settings that are never persisted (tests, one-off renders).
    #[must_use]
    pub fn in_memory(settings: RenderSettings) -> Self {
        Self {
            current: RwLock::new(settings),
            store: Box::new(MemorySettingsStore::new()),
        }
    }

    /// Copy of the current snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn current(&self) -> RenderSettings {
        *self.current.read().unwrap()
    }

    /// Apply `change` to a copy of the snapshot, persist it, then publish it.
    ///
    /// The in-memory snapshot only changes if validation and the save succeed.
    pub fn update(
        &self,
        change: impl FnOnce(&mut RenderSettings) -> Result<(), ConfigError>,
    ) -> Result<RenderSettings, ConfigError> {
        let mut next = self.current();
        change(&mut next)?;
        next.validate()?;
        self.store.save(&next)?;
        *self.current.write().unwrap() = next;
        Ok(next)
    }

    /// Set one field from its textual value and persist.
    pub fn set(&self, key: &str, value: &str) -> Result<RenderSettings, ConfigError> {
        self.update(|settings| settings.set(key, value))
    }

    /// Restore defaults and persist.
    pub fn reset(&self) -> Result<RenderSettings, ConfigError> {
        self.update(|settings| {
            *settings = RenderSettings::default();
            Ok(())
        })
    }

    /// Replace the snapshot for this process only, without persisting.
    ///
    /// Used for command-line overrides.
    pub fn override_current(&self, change: impl FnOnce(&mut RenderSettings)) {
        let mut current = self.current.write().unwrap();
        change(&mut current);
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}
