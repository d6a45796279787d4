//! Persisted user preferences and credentials.
//!
//! Everything here is stored as JSON strings in the [`eframe::Storage`]
//! key-value store, one key per concern, and written back when the app
//! saves. Missing or unparseable values fall back to defaults rather
//! than erroring.

use serde::{Deserialize, Serialize};

const SETTINGS_KEY: &str = "settings";
const USER_KEY: &str = "user";
const ONBOARDING_KEY: &str = "hasSeenOnboarding";

/// User-tunable explanation preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Locale the explanation service should answer in.
    pub locale: String,
    /// Explanation verbosity level, e.g. `"basic"` or `"advanced"`.
    pub level: String,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            level: "advanced".to_string(),
        }
    }
}

/// Credentials of a logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    /// Account email, used as the Basic auth username.
    pub email: String,
    /// API key, used as the Basic auth password.
    pub key: String,
}

fn load_json<T: for<'de> Deserialize<'de>>(storage: &dyn eframe::Storage, key: &str) -> Option<T> {
    let raw = storage.get_string(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Discarding unparseable '{key}' entry: {err}");
            None
        }
    }
}

fn store_json<T: Serialize>(storage: &mut dyn eframe::Storage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => storage.set_string(key, raw),
        Err(err) => log::error!("Failed to serialize '{key}': {err}"),
    }
}

/// Loads the stored settings, falling back to defaults.
pub fn load_settings(storage: &dyn eframe::Storage) -> LocalSettings {
    load_json(storage, SETTINGS_KEY).unwrap_or_default()
}

/// Persists the settings.
pub fn store_settings(storage: &mut dyn eframe::Storage, settings: &LocalSettings) {
    store_json(storage, SETTINGS_KEY, settings);
}

/// Loads the stored credentials, if the user has logged in before.
pub fn load_user(storage: &dyn eframe::Storage) -> Option<StoredUser> {
    load_json(storage, USER_KEY)
}

/// Persists or clears the credentials.
pub fn store_user(storage: &mut dyn eframe::Storage, user: Option<&StoredUser>) {
    match user {
        Some(user) => store_json(storage, USER_KEY, user),
        None => storage.set_string(USER_KEY, String::new()),
    }
}

/// Whether the onboarding walkthrough has already been shown.
pub fn has_seen_onboarding(storage: &dyn eframe::Storage) -> bool {
    load_json(storage, ONBOARDING_KEY).unwrap_or(false)
}

/// Marks the onboarding walkthrough as seen.
pub fn set_has_seen_onboarding(storage: &mut dyn eframe::Storage) {
    store_json(storage, ONBOARDING_KEY, &true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use eframe::Storage;

    /// In-memory stand-in for the eframe key-value store.
    #[derive(Default)]
    struct MemStorage {
        entries: HashMap<String, String>,
    }

    impl eframe::Storage for MemStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.entries.get(key).cloned()
        }

        fn set_string(&mut self, key: &str, value: String) {
            self.entries.insert(key.to_string(), value);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn test_settings_default_when_absent() {
        let storage = MemStorage::default();
        let settings = load_settings(&storage);
        assert_eq!(settings.locale, "en");
        assert_eq!(settings.level, "advanced");
    }

    #[test]
    fn test_settings_round_trip() {
        let mut storage = MemStorage::default();
        let settings = LocalSettings {
            locale: "es".to_string(),
            level: "basic".to_string(),
        };
        store_settings(&mut storage, &settings);
        assert_eq!(load_settings(&storage), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let mut storage = MemStorage::default();
        storage.set_string(super::SETTINGS_KEY, "{not json".to_string());
        assert_eq!(load_settings(&storage), LocalSettings::default());
    }

    #[test]
    fn test_user_round_trip_and_logout() {
        let mut storage = MemStorage::default();
        assert!(load_user(&storage).is_none());

        let user = StoredUser {
            email: "dev@example.com".to_string(),
            key: "secret".to_string(),
        };
        store_user(&mut storage, Some(&user));
        assert_eq!(load_user(&storage), Some(user));

        store_user(&mut storage, None);
        assert!(load_user(&storage).is_none());
    }

    #[test]
    fn test_onboarding_flag() {
        let mut storage = MemStorage::default();
        assert!(!has_seen_onboarding(&storage));
        set_has_seen_onboarding(&mut storage);
        assert!(has_seen_onboarding(&storage));
    }
}
