//! Persisted configuration store.
//!
//! The configuration is kept as three independent string entries keyed by
//! [`ConfigField::storage_key`]. Loading never fails; every missing entry
//! reads as an empty string. Saving writes all three entries every time.
//!
//! The default backend is a JSON object file at
//! `~/.config/shelf-archiver/state.json` (or `$XDG_CONFIG_HOME/shelf-archiver/state.json`).

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use super::{ConfigField, Configuration, share};

const APP_DIR_NAME: &str = "shelf-archiver";
const STATE_FILE_NAME: &str = "state.json";

/// Errors for persisted state operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Minimal string key/value persistence used by [`ConfigStore`].
pub trait KeyValueStore: Send + Sync {
    /// Reads one entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes several entries at once.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot be written.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;
}

/// In-memory backend for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let map = entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    /// Returns a copy of the stored entries.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for (key, value) in entries {
            guard.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }
}

/// JSON-file backend with owner-only permissions on unix.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a backend that reads and writes `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a backend at the default state path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConfigDirUnavailable`] if no usable config dir is found.
    pub fn at_default_path() -> Result<Self, StorageError> {
        Ok(Self::new(default_state_path()?))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&self.path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        // A corrupt file is replaced rather than blocking every future save.
        let mut current = self.read_all().unwrap_or_else(|error| {
            warn!(path = %self.path.display(), error = %error, "Discarding unreadable state file");
            BTreeMap::new()
        });
        for (key, value) in entries {
            current.insert((*key).to_string(), (*value).to_string());
        }
        let payload = serde_json::to_vec_pretty(&current)?;
        write_owner_only(&self.path, &payload)
    }
}

fn write_owner_only(path: &Path, payload: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, payload)?;
    set_owner_only_permissions(path)?;
    Ok(())
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::Permissions::from_mode(0o600);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}

/// Returns the default persisted state path (`~/.config/shelf-archiver/state.json`).
///
/// # Errors
///
/// Returns [`StorageError::ConfigDirUnavailable`] if no usable config dir is found.
pub fn default_state_path() -> Result<PathBuf, StorageError> {
    Ok(default_config_dir()?.join(STATE_FILE_NAME))
}

/// Returns the application config directory.
///
/// # Errors
///
/// Returns [`StorageError::ConfigDirUnavailable`] if no usable config dir is found.
pub fn default_config_dir() -> Result<PathBuf, StorageError> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, StorageError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join(APP_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(APP_DIR_NAME));
    }

    Err(StorageError::ConfigDirUnavailable)
}

/// Owns the in-memory configuration and keeps it in sync with a [`KeyValueStore`].
#[derive(Debug)]
pub struct ConfigStore<S> {
    backend: S,
    current: Configuration,
}

impl<S: KeyValueStore> ConfigStore<S> {
    /// Opens the store and loads the persisted configuration.
    pub fn open(backend: S) -> Self {
        let current = load_from(&backend);
        Self { backend, current }
    }

    /// Re-reads the persisted configuration, replacing the in-memory copy.
    ///
    /// Never fails: unreadable or missing entries become empty strings.
    pub fn load(&mut self) -> Configuration {
        self.current = load_from(&self.backend);
        self.current.clone()
    }

    /// The active configuration.
    #[must_use]
    pub fn current(&self) -> &Configuration {
        &self.current
    }

    /// The persistence backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Replaces the active configuration and persists all three fields.
    ///
    /// The in-memory configuration is replaced even when persisting fails.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend write fails.
    pub fn save(&mut self, config: Configuration) -> Result<(), StorageError> {
        self.current = config;
        self.persist()
    }

    /// Updates one field and persists the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend write fails.
    pub fn set_field(
        &mut self,
        field: ConfigField,
        value: impl Into<String>,
    ) -> Result<(), StorageError> {
        self.current.set(field, value);
        debug!(field = field.storage_key(), "Configuration field updated");
        self.persist()
    }

    /// Applies a shared link when one is present and decodes cleanly.
    ///
    /// Returns the new configuration when it was applied. A missing or broken
    /// link leaves the current configuration untouched.
    pub fn apply_shared_if_present(&mut self, shared: Option<&str>) -> Option<Configuration> {
        let shared = shared.map(str::trim).filter(|value| !value.is_empty())?;
        match share::decode_shared_query(shared) {
            Ok(config) => {
                info!(
                    collection_id = %config.target_collection_id,
                    "Applying configuration from shared link"
                );
                if let Err(error) = self.save(config.clone()) {
                    warn!(error = %error, "Shared configuration applied but could not be persisted");
                }
                Some(config)
            }
            Err(error) => {
                warn!(error = %error, "Ignoring shared link; keeping stored configuration");
                None
            }
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        let entries: Vec<(&str, &str)> = ConfigField::ALL
            .iter()
            .map(|field| (field.storage_key(), self.current.get(*field)))
            .collect();
        self.backend.set_many(&entries)
    }
}

fn load_from<S: KeyValueStore>(backend: &S) -> Configuration {
    let mut config = Configuration::default();
    for field in ConfigField::ALL {
        match backend.get(field.storage_key()) {
            Ok(Some(value)) => config.set(field, value),
            Ok(None) => {}
            Err(error) => warn!(
                key = field.storage_key(),
                error = %error,
                "Could not read stored configuration entry; using empty value"
            ),
        }
    }
    config
}
