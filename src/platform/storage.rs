//! LocalStorage access (wasm32 only)

use crate::error::PersistenceError;

/// The page's LocalStorage, if the browser allows it
pub fn local_storage() -> Result<web_sys::Storage, PersistenceError> {
    web_sys::window()
        .ok_or_else(|| PersistenceError::Unavailable("no window".into()))?
        .local_storage()
        .map_err(|e| PersistenceError::Unavailable(format!("{:?}", e)))?
        .ok_or_else(|| PersistenceError::Unavailable("LocalStorage disabled".into()))
}

pub fn read(key: &str) -> Result<Option<String>, PersistenceError> {
    local_storage()?
        .get_item(key)
        .map_err(|e| PersistenceError::Unavailable(format!("{:?}", e)))
}

pub fn write(key: &str, value: &str) -> Result<(), PersistenceError> {
    local_storage()?
        .set_item(key, value)
        .map_err(|e| PersistenceError::Unavailable(format!("{:?}", e)))
}

/// Milliseconds since the Unix epoch
pub fn timestamp_ms() -> f64 {
    js_sys::Date::now()
}
