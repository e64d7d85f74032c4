use hashbrown::HashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Opaque JSON key-value persistence collaborator.
pub trait BlobStore {
    fn save_blob(&mut self, key: &str, json: &str) -> core::result::Result<(), StoreError>;
    fn load_blob(&mut self, key: &str) -> core::result::Result<Option<String>, StoreError>;
    fn remove_blob(&mut self, key: &str) -> core::result::Result<(), StoreError>;
}

/// Serializes and writes a blob. Failures are absorbed with a warning and
/// never surfaced to the player; the data simply does not persist.
pub fn save_or_warn<T: Serialize>(store: &mut dyn BlobStore, key: &str, value: &T) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            log::warn!("Failed to serialize {key}: {err}");
            return false;
        }
    };
    match store.save_blob(key, &json) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("Failed to save {key}: {err}");
            false
        }
    }
}

/// Reads and deserializes a blob, falling back to the default on a missing
/// key, a backend failure, or corrupt contents.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &mut dyn BlobStore, key: &str) -> T {
    let json = match store.load_blob(key) {
        Ok(Some(json)) => json,
        Ok(None) => return T::default(),
        Err(err) => {
            log::warn!("Failed to load {key}: {err}");
            return T::default();
        }
    };
    serde_json::from_str(&json).unwrap_or_else(|err| {
        log::warn!("Discarding corrupt blob {key}: {err}");
        T::default()
    })
}

/// In-memory store, the default collaborator and the test double.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn save_blob(&mut self, key: &str, json: &str) -> core::result::Result<(), StoreError> {
        self.blobs.insert(key.to_owned(), json.to_owned());
        Ok(())
    }

    fn load_blob(&mut self, key: &str) -> core::result::Result<Option<String>, StoreError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn remove_blob(&mut self, key: &str) -> core::result::Result<(), StoreError> {
        self.blobs.remove(key);
        Ok(())
    }
}
