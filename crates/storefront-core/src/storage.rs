//! Cart Persistence
//!
//! A durable client-side key-value slot plus the fail-soft adapter that
//! moves `CartState` in and out of it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::cart::{CartLine, CartState};
use crate::error::{Result, StorefrontError};

/// Storage key used by every cart written so far
pub const DEFAULT_CART_KEY: &str = "rooted_smile_cart_v1";

/// String key-value slot (browser `localStorage`, a file, memory...)
pub trait CartStorage: Send + Sync {
    /// Read the raw value; `Ok(None)` when the slot is absent
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write the raw value
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the slot
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory storage (for development/testing)
#[derive(Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .read()
            .map_err(|_| StorefrontError::PersistenceUnavailable("storage lock poisoned".into()))?;
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StorefrontError::PersistenceUnavailable("storage lock poisoned".into()))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StorefrontError::PersistenceUnavailable("storage lock poisoned".into()))?;
        slots.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl CartStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorefrontError::PersistenceUnavailable(e.to_string())),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(self.path_for(key), value))
            .map_err(|e| StorefrontError::PersistenceUnavailable(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(StorefrontError::PersistenceUnavailable(e.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Fail-soft adapter between a cart and its storage slot
#[derive(Clone)]
pub struct CartPersistence {
    storage: Arc<dyn CartStorage>,
    key: String,
}

impl CartPersistence {
    pub fn new(storage: Arc<dyn CartStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Adapter on the default cart key
    pub fn with_default_key(storage: Arc<dyn CartStorage>) -> Self {
        Self::new(storage, DEFAULT_CART_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored cart. An absent, unreadable or malformed slot yields
    /// an empty cart; this never fails.
    pub fn load(&self) -> CartState {
        let raw = match self.storage.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CartState::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to load cart");
                return CartState::new();
            }
        };

        let records = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding malformed cart");
                return CartState::new();
            }
        };

        // One unreadable record must not cost the rest of the cart
        let lines = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value::<CartLine>(record) {
                Ok(line) => Some(line),
                Err(e) => {
                    tracing::warn!(key = %self.key, index, error = %e, "Skipping malformed cart line");
                    None
                }
            })
            .collect();

        CartState::from_lines(lines)
    }

    /// Best-effort write; failures are logged and swallowed
    pub fn save(&self, state: &CartState) {
        let raw = match serde_json::to_string(state) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to serialize cart");
                return;
            }
        };

        if let Err(e) = self.storage.write(&self.key, &raw) {
            tracing::warn!(key = %self.key, error = %e, "Failed to save cart");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::NewLine;
    use rust_decimal_macros::dec;

    /// Storage that refuses every operation, like a browser with storage disabled
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Err(StorefrontError::PersistenceUnavailable("disabled".into()))
        }

        fn write(&self, _key: &str, _value: &str) -> Result<()> {
            Err(StorefrontError::PersistenceUnavailable("quota exceeded".into()))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(StorefrontError::PersistenceUnavailable("disabled".into()))
        }
    }

    fn sample() -> CartState {
        let mut cart = CartState::new();
        cart.add(NewLine::new("tee", "Rooted Tee", dec!(25)).size("S").quantity(2));
        cart.add(NewLine::new("mug", "Mug", dec!(5.50)).image("/img/mug.png"));
        cart
    }

    #[test]
    fn test_load_absent_slot_is_empty() {
        let persistence = CartPersistence::with_default_key(Arc::new(MemoryStorage::new()));
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_load_malformed_slot_is_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let persistence = CartPersistence::with_default_key(storage.clone());

        for raw in ["not json", r#"{"id":"tee"}"#, "42", r#"[{"id":1}]"#] {
            storage.write(DEFAULT_CART_KEY, raw).unwrap();
            assert!(persistence.load().is_empty(), "{raw} should load as empty");
        }
    }

    #[test]
    fn test_bad_line_keeps_the_rest() {
        let storage = Arc::new(MemoryStorage::new());
        let persistence = CartPersistence::with_default_key(storage.clone());

        let raw = r#"[
            {"id":"tee","price":25,"qty":2,"image":""},
            {"id":"mug","name":"Mug","price":"free","quantity":1},
            {"id":"balm","name":"Balm","price":5.5,"quantity":1}
        ]"#;
        storage.write(DEFAULT_CART_KEY, raw).unwrap();

        let loaded = persistence.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.lines()[0].id, "tee");
        assert_eq!(loaded.lines()[0].name, "");
        assert_eq!(loaded.lines()[0].quantity, 2);
        assert_eq!(loaded.lines()[1].id, "balm");
        assert_eq!(loaded.total(), dec!(55.50));
    }

    #[test]
    fn test_save_then_load_preserves_lines_in_order() {
        let persistence = CartPersistence::with_default_key(Arc::new(MemoryStorage::new()));
        let cart = sample();

        persistence.save(&cart);
        let loaded = persistence.load();

        assert_eq!(loaded, cart);
        assert_eq!(loaded.lines()[0].id, "tee");
        assert_eq!(loaded.total(), dec!(55.50));
    }

    #[test]
    fn test_broken_storage_is_fail_soft() {
        let persistence = CartPersistence::with_default_key(Arc::new(BrokenStorage));
        persistence.save(&sample());
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("carts"));

        assert_eq!(storage.read("cart/v1").unwrap(), None);
        storage.write("cart/v1", "[]").unwrap();
        assert_eq!(storage.read("cart/v1").unwrap().as_deref(), Some("[]"));

        storage.remove("cart/v1").unwrap();
        storage.remove("cart/v1").unwrap();
        assert_eq!(storage.read("cart/v1").unwrap(), None);
    }
}
