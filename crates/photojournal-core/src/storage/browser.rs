//! `window.localStorage` as a key/value table for WebAssembly.

use super::{KeyValueStore, StorageError, StorageResult};
use crate::BoxFuture;

/// Browser `localStorage`.
///
/// Not Send/Sync: WASM is single-threaded and `web_sys::Storage` is a JS
/// handle.
pub struct BrowserLocalStorage {
    storage: web_sys::Storage,
}

impl BrowserLocalStorage {
    /// Bind to the window's `localStorage`.
    pub fn new() -> StorageResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Other("No window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Other(format!("localStorage error: {:?}", e)))?
            .ok_or_else(|| StorageError::Other("localStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserLocalStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let result = self
            .storage
            .get_item(key)
            .map_err(|e| StorageError::Other(format!("getItem error: {:?}", e)));
        Box::pin(async move { result })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        // Quota errors surface here.
        let result = self
            .storage
            .set_item(key, value)
            .map_err(|e| StorageError::Io(format!("setItem error: {:?}", e)));
        Box::pin(async move { result })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let result = self
            .storage
            .remove_item(key)
            .map_err(|e| StorageError::Other(format!("removeItem error: {:?}", e)));
        Box::pin(async move { result })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let result = (|| {
            let len = self
                .storage
                .length()
                .map_err(|e| StorageError::Other(format!("length error: {:?}", e)))?;
            let mut keys = Vec::with_capacity(len as usize);
            for i in 0..len {
                if let Some(key) = self
                    .storage
                    .key(i)
                    .map_err(|e| StorageError::Other(format!("key error: {:?}", e)))?
                {
                    keys.push(key);
                }
            }
            Ok(keys)
        })();
        Box::pin(async move { result })
    }
}
