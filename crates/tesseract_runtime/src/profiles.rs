//! Saved-account store.
//!
//! [`ProfileStore`] owns the [`ProfileCollection`] and writes the whole document back to the host
//! [`PrefsStore`] after every mutation. Write failures are logged; the in-memory state stays
//! authoritative.

use std::rc::Rc;

use leptos::logging;
use platform_host::PrefsStore;

use crate::model::{ProfileCollection, ProfileId, ProfileRecord, GUEST_PROFILE_ID};
use crate::persistence::{load_profile_collection, persist_profile_collection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Direction for [`ProfileStore::reorder`].
pub enum Direction {
    /// Towards the start of the list.
    Up,
    /// Towards the end of the list.
    Down,
}

/// Swaps `items[from]` with its neighbour in `direction`.
///
/// Returns `false` without touching `items` when either position is out of range.
pub fn move_item<T>(items: &mut [T], from: usize, direction: Direction) -> bool {
    let to = match direction {
        Direction::Up => from.checked_sub(1),
        Direction::Down => from.checked_add(1),
    };
    match to {
        Some(to) if from < items.len() && to < items.len() => {
            items.swap(from, to);
            true
        }
        _ => false,
    }
}

/// Ordered saved accounts plus the active profile id, mirrored to storage.
pub struct ProfileStore {
    prefs: Rc<dyn PrefsStore>,
    collection: ProfileCollection,
}

impl std::fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl ProfileStore {
    /// Hydrates the store from `prefs`.
    pub fn load(prefs: Rc<dyn PrefsStore>) -> Self {
        let collection = load_profile_collection(prefs.as_ref());
        Self { prefs, collection }
    }

    pub fn collection(&self) -> &ProfileCollection {
        &self.collection
    }

    pub fn profiles(&self) -> &[ProfileRecord] {
        &self.collection.profiles
    }

    pub fn active_id(&self) -> ProfileId {
        self.collection.active_id
    }

    pub fn default_instance(&self) -> Option<&str> {
        self.collection.default_instance.as_deref()
    }

    pub fn get(&self, id: ProfileId) -> Option<&ProfileRecord> {
        self.collection.get(id)
    }

    pub fn contains(&self, id: ProfileId) -> bool {
        self.collection.contains(id)
    }

    /// Finds the saved account `username` on `instance`.
    pub fn find_by_identity(&self, username: &str, instance: &str) -> Option<&ProfileRecord> {
        self.collection
            .profiles
            .iter()
            .find(|profile| profile.matches_identity(username, instance))
    }

    /// Appends a record. Guest records and duplicate ids are refused.
    ///
    /// Returns `true` when the record was stored.
    pub fn add(&mut self, record: ProfileRecord) -> bool {
        if record.is_guest() || self.contains(record.id) {
            return false;
        }
        self.collection.profiles.push(record.without_user());
        self.persist();
        true
    }

    /// Removes a record. Removing the active record makes the guest active.
    pub fn remove(&mut self, id: ProfileId) -> Option<ProfileRecord> {
        let index = self.collection.position(id)?;
        let removed = self.collection.profiles.remove(index);
        if self.collection.active_id == id {
            self.collection.active_id = GUEST_PROFILE_ID;
        }
        self.persist();
        Some(removed)
    }

    /// Moves a record one slot up or down.
    ///
    /// Unknown ids and moves past either end leave the order unchanged and return `false`.
    pub fn reorder(&mut self, id: ProfileId, direction: Direction) -> bool {
        let Some(index) = self.collection.position(id) else {
            return false;
        };
        if !move_item(&mut self.collection.profiles, index, direction) {
            return false;
        }
        self.persist();
        true
    }

    /// Marks `id` active. Unknown ids select the guest.
    ///
    /// Returns the id that is now active.
    pub fn set_active(&mut self, id: ProfileId) -> ProfileId {
        let next = if self.contains(id) { id } else { GUEST_PROFILE_ID };
        if self.collection.active_id != next {
            self.collection.active_id = next;
            self.persist();
        }
        next
    }

    /// Writes an edited record back in place, dropping its session-only `user`.
    ///
    /// Returns `false` when no record has that id.
    pub fn replace(&mut self, record: ProfileRecord) -> bool {
        let Some(index) = self.collection.position(record.id) else {
            return false;
        };
        self.collection.profiles[index] = record.without_user();
        self.persist();
        true
    }

    /// Sets (or clears) the instance guests browse.
    pub fn set_default_instance(&mut self, instance: Option<String>) {
        if self.collection.default_instance != instance {
            self.collection.default_instance = instance;
            self.persist();
        }
    }

    fn persist(&self) {
        if let Err(err) = persist_profile_collection(self.prefs.as_ref(), &self.collection) {
            logging::warn!("profile collection save failed: {err}");
        }
    }
}
