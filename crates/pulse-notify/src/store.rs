//! Notification settings persistence

use parking_lot::Mutex;
use pulse_core::{NotificationSettings, SettingsError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Durable home of the user's notification settings
#[cfg_attr(test, mockall::automock)]
pub trait SettingsStore: Send + Sync {
    /// Stored settings, `None` when nothing was saved yet
    fn load(&self) -> Result<Option<NotificationSettings>, SettingsError>;

    /// Replace the stored settings
    fn save(&self, settings: &NotificationSettings) -> Result<(), SettingsError>;
}

/// Settings kept as a JSON object in one file
///
/// Writes go to a sibling temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    /// Store at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> Result<Option<NotificationSettings>, SettingsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let settings = serde_json::from_str(&text)?;
        debug!(path = %self.path.display(), "notification settings loaded");
        Ok(Some(settings))
    }

    fn save(&self, settings: &NotificationSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "notification settings saved");
        Ok(())
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<NotificationSettings>>,
    saves: AtomicUsize,
}

impl MemorySettingsStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `settings`
    #[must_use]
    pub fn with_settings(settings: NotificationSettings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful saves
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<NotificationSettings>, SettingsError> {
        Ok(self.settings.lock().clone())
    }

    fn save(&self, settings: &NotificationSettings) -> Result<(), SettingsError> {
        *self.settings.lock() = Some(settings.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
