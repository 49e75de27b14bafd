//! Settings persistence for the GUI shell.
//!
//! Thin serde/JSON layer over eframe's key-value storage. Values are stored
//! as JSON strings so any serializable type round-trips.

use serde::{Deserialize, Serialize};

/// Loads and saves typed settings through eframe storage.
pub struct Settings;

impl Settings {
    /// Loads the value stored under `key`, or `default` when the key is
    /// missing or no longer deserializes.
    pub fn load_or<T>(storage: Option<&dyn eframe::Storage>, key: &str, default: T) -> T
    where
        T: for<'de> Deserialize<'de>,
    {
        Self::try_load(storage, key).unwrap_or(default)
    }

    /// Loads the value stored under `key` if present and valid.
    pub fn try_load<T>(storage: Option<&dyn eframe::Storage>, key: &str) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let json = storage?.get_string(key)?;
        serde_json::from_str(&json).ok()
    }

    /// Serializes `value` under `key` and flushes the store.
    pub fn save<T: Serialize>(storage: &mut dyn eframe::Storage, key: &str, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            storage.set_string(key, json);
            storage.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::Storage;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStorage {
        values: HashMap<String, String>,
    }

    impl eframe::Storage for MemoryStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.values.get(key).cloned()
        }

        fn set_string(&mut self, key: &str, value: String) {
            self.values.insert(key.to_string(), value);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn test_round_trip() {
        let mut storage = MemoryStorage::default();
        Settings::save(&mut storage, "confirm_quit", &false);

        let loaded = Settings::load_or(Some(&storage), "confirm_quit", true);
        assert!(!loaded);
    }

    #[test]
    fn test_missing_key_yields_default() {
        let storage = MemoryStorage::default();
        assert!(Settings::load_or(Some(&storage), "confirm_quit", true));
        assert_eq!(Settings::try_load::<bool>(Some(&storage), "confirm_quit"), None);
    }

    #[test]
    fn test_corrupt_value_yields_default() {
        let mut storage = MemoryStorage::default();
        storage.set_string("confirm_quit", "{not json".to_string());
        assert!(Settings::load_or(Some(&storage), "confirm_quit", true));
    }
}
