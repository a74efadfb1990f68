//! Browser `localStorage` backend

use storefront_core::{CartStorage, Result, StorefrontError};

/// `CartStorage` over `window.localStorage`.
///
/// Holds no JS handles; the storage object is looked up per call so the
/// type stays `Send + Sync`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

fn storage() -> Result<web_sys::Storage> {
    web_sys::window()
        .ok_or_else(|| StorefrontError::PersistenceUnavailable("no window".into()))?
        .local_storage()
        .map_err(|e| StorefrontError::PersistenceUnavailable(format!("{e:?}")))?
        .ok_or_else(|| StorefrontError::PersistenceUnavailable("localStorage disabled".into()))
}

impl CartStorage for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        storage()?
            .get_item(key)
            .map_err(|e| StorefrontError::PersistenceUnavailable(format!("{e:?}")))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        storage()?
            .set_item(key, value)
            .map_err(|e| StorefrontError::PersistenceUnavailable(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<()> {
        storage()?
            .remove_item(key)
            .map_err(|e| StorefrontError::PersistenceUnavailable(format!("{e:?}")))
    }
}
