//! This module provides the key/value storage that the repositories persist their collections into
//!
//! A [`StorageService`] never fails: errors of the underlying [`Backend`] are logged, and callers see `None` or a no-op instead.

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::Error as StorageError;
use crate::mock_behaviour::MockBehaviour;

/// A raw key/value store
pub trait Backend: Send + Sync {
    /// Returns `Ok(None)` when there is no value for this key
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>>;
    fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
    /// Removing a key that does not exist is not an error
    fn remove(&self, key: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}


/// A backend that stores every key into its own JSON file inside a folder
#[derive(Debug, Clone, PartialEq)]
pub struct FolderBackend {
    backing_folder: PathBuf,
}

impl FolderBackend {
    /// Use a folder as a backend. The folder is created when the first value is written
    pub fn new(folder: &Path) -> Self {
        Self { backing_folder: PathBuf::from(folder) }
    }

    pub fn folder(&self) -> &Path {
        &self.backing_folder
    }

    fn file_for(&self, key: &str) -> PathBuf {
        let file_name = sanitize_filename::sanitize(key) + ".json";
        self.backing_folder.join(file_name)
    }
}

impl Backend for FolderBackend {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        let path = self.file_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(format!("Unable to read file {:?}: {}", path, err).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        std::fs::create_dir_all(&self.backing_folder)
            .map_err(|err| format!("Unable to create folder {:?}: {}", self.backing_folder, err))?;
        let path = self.file_for(key);
        std::fs::write(&path, value)
            .map_err(|err| format!("Unable to save file {:?}: {}", path, err))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let path = self.file_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(format!("Unable to remove file {:?}: {}", path, err).into()),
        }
    }
}


/// A backend that only lives in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that fails according to `behaviour`
    pub fn with_behaviour(behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        Self { values: Mutex::new(HashMap::new()), mock_behaviour: Some(behaviour) }
    }

    fn check<F>(&self, f: F) -> Result<(), Box<dyn Error + Send + Sync>>
    where
        F: FnOnce(&mut MockBehaviour) -> Result<(), Box<dyn Error + Send + Sync>>,
    {
        match &self.mock_behaviour {
            None => Ok(()),
            Some(behaviour) => {
                let mut behaviour = behaviour.lock().map_err(|_| "poisoned mock behaviour")?;
                f(&mut behaviour)
            },
        }
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        self.check(|b| b.can_get())?;
        let values = self.values.lock().map_err(|_| "poisoned memory backend")?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.check(|b| b.can_set())?;
        let mut values = self.values.lock().map_err(|_| "poisoned memory backend")?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.check(|b| b.can_remove())?;
        let mut values = self.values.lock().map_err(|_| "poisoned memory backend")?;
        values.remove(key);
        Ok(())
    }
}


/// A no-fail wrapper around a [`Backend`]
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn Backend>,
}

impl StorageService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// A storage that lives in memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// A storage that persists into a folder
    pub fn in_folder(folder: &Path) -> Self {
        Self::new(Arc::new(FolderBackend::new(folder)))
    }

    /// Returns the raw value stored under `key`, or `None` if it is absent or cannot be read
    pub fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("{}", StorageError::Storage(format!("unable to read {:?}: {}", key, err)));
                None
            },
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.backend.set(key, value) {
            log::warn!("{}", StorageError::Storage(format!("unable to write {:?}: {}", key, err)));
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(err) = self.backend.remove(key) {
            log::warn!("{}", StorageError::Storage(format!("unable to remove {:?}: {}", key, err)));
        }
    }
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_round_trip() {
        let storage = StorageService::in_memory();
        assert_eq!(storage.get("tasks"), None);
        storage.set("tasks", "[]");
        assert_eq!(storage.get("tasks"), Some("[]".to_string()));
        storage.remove("tasks");
        assert_eq!(storage.get("tasks"), None);
        // removing twice is fine
        storage.remove("tasks");
    }

    #[test]
    fn failures_are_swallowed() {
        let behaviour = Arc::new(Mutex::new(MockBehaviour::fail_now(1)));
        let storage = StorageService::new(Arc::new(MemoryBackend::with_behaviour(behaviour)));

        // the first write fails silently
        storage.set("tasks", "[1]");
        assert_eq!(storage.get("tasks"), None);   // this read is the failing one
        assert_eq!(storage.get("tasks"), None);   // nothing had been written
        storage.set("tasks", "[2]");
        assert_eq!(storage.get("tasks"), Some("[2]".to_string()));
    }

    #[test]
    fn folder_backend() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("data");
        let storage = StorageService::in_folder(&folder);

        assert_eq!(storage.get("projects"), None);
        storage.set("projects", "[]");
        assert!(folder.join("projects.json").exists());
        assert_eq!(storage.get("projects"), Some("[]".to_string()));

        // keys are sanitized before being used as file names
        storage.set("../escape", "x");
        assert!(dir.path().join("escape.json").exists() == false);
        assert_eq!(storage.get("../escape"), Some("x".to_string()));

        storage.remove("projects");
        assert!(folder.join("projects.json").exists() == false);
    }
}
