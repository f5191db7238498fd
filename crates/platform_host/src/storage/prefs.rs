//! Key/value preference storage contracts and adapters.
//!
//! Values are JSON documents stored as text under a string key, mirroring the browser
//! `localStorage` model. Calls are synchronous because the browser backend is synchronous; adapters
//! for hosts without storage succeed without persisting anything.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};

/// Host service for preference values (JSON stored as text per key).
pub trait PrefsStore {
    /// Loads a raw JSON string for a preference key.
    ///
    /// Returns `Ok(None)` when the key is absent or the host has no storage.
    fn load_pref(&self, key: &str) -> Result<Option<String>, String>;

    /// Saves a raw JSON string for a preference key, replacing any previous value.
    fn save_pref(&self, key: &str, raw_json: &str) -> Result<(), String>;

    /// Deletes a preference key.
    fn delete_pref(&self, key: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op preference store for unsupported targets and baseline tests.
pub struct NoopPrefsStore;

impl PrefsStore for NoopPrefsStore {
    fn load_pref(&self, _key: &str) -> Result<Option<String>, String> {
        Ok(None)
    }

    fn save_pref(&self, _key: &str, _raw_json: &str) -> Result<(), String> {
        Ok(())
    }

    fn delete_pref(&self, _key: &str) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory preference store keyed by string.
///
/// Clones share the same backing map, so a test can keep one handle and inspect what another
/// component wrote.
pub struct MemoryPrefsStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryPrefsStore {
    /// Returns the raw JSON currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl PrefsStore for MemoryPrefsStore {
    fn load_pref(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn save_pref(&self, key: &str, raw_json: &str) -> Result<(), String> {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), raw_json.to_string());
        Ok(())
    }

    fn delete_pref(&self, key: &str) -> Result<(), String> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

/// Loads and deserializes a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when the store or JSON deserialization fails.
pub fn load_pref_with<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, String> {
    let Some(raw) = store.load_pref(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|e| format!("{key}: {e}"))?;
    Ok(Some(value))
}

/// Serializes and saves a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when serialization or store save fails.
pub fn save_pref_with<S: PrefsStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value).map_err(|e| e.to_string())?;
    store.save_pref(key, &raw)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct SortPref {
        sort: String,
        per_page: u32,
    }

    #[test]
    fn memory_prefs_store_save_load_and_delete() {
        let store = MemoryPrefsStore::default();
        let store_obj: &dyn PrefsStore = &store;

        store_obj
            .save_pref("profileData", "{\"profile\":-1}")
            .expect("save");
        assert_eq!(
            store_obj.load_pref("profileData").expect("load"),
            Some("{\"profile\":-1}".to_string())
        );
        store_obj.delete_pref("profileData").expect("delete");
        assert_eq!(store_obj.load_pref("profileData").expect("load"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn clones_share_backing_map() {
        let store = MemoryPrefsStore::default();
        let writer = store.clone();
        writer.save_pref("k", "1").expect("save");
        assert_eq!(store.raw("k").as_deref(), Some("1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn typed_pref_helpers_write_json() {
        let store = MemoryPrefsStore::default();
        save_pref_with(
            &store,
            "settings",
            &SortPref {
                sort: "Active".to_string(),
                per_page: 20,
            },
        )
        .expect("save typed pref");

        let loaded: Option<SortPref> = load_pref_with(&store, "settings").expect("load typed");
        assert_eq!(
            loaded,
            Some(SortPref {
                sort: "Active".to_string(),
                per_page: 20
            })
        );
    }

    #[test]
    fn typed_load_reports_corrupt_json_with_key() {
        let store = MemoryPrefsStore::default();
        store.save_pref("settings", "{not json").expect("save");
        let err = load_pref_with::<_, SortPref>(&store, "settings").expect_err("corrupt");
        assert!(err.starts_with("settings:"), "unexpected error: {err}");
    }

    #[test]
    fn noop_prefs_store_is_empty_and_successful() {
        let store = NoopPrefsStore;
        let store_obj: &dyn PrefsStore = &store;
        store_obj.save_pref("k", "{}").expect("save");
        assert_eq!(store_obj.load_pref("k").expect("load"), None);
        store_obj.delete_pref("k").expect("delete");
    }
}
