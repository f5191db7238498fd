//! Profile-collection persistence through the host [`PrefsStore`].

use leptos::logging;
use platform_host::{load_pref_with, save_pref_with, PrefsStore};

use crate::model::{ProfileCollection, PROFILE_DATA_KEY};

/// Loads the saved profile collection.
///
/// Missing, unreadable, or corrupt documents yield an empty collection. Invariant violations are
/// healed (see [`ProfileCollection::heal`]) and the healed document is written back.
pub fn load_profile_collection(prefs: &dyn PrefsStore) -> ProfileCollection {
    let mut collection = match load_pref_with::<_, ProfileCollection>(prefs, PROFILE_DATA_KEY) {
        Ok(Some(collection)) => collection,
        Ok(None) => return ProfileCollection::default(),
        Err(err) => {
            logging::warn!("profile collection load failed, starting empty: {err}");
            return ProfileCollection::default();
        }
    };

    if collection.heal() {
        logging::warn!("profile collection referenced a missing profile; reset to guest");
        if let Err(err) = persist_profile_collection(prefs, &collection) {
            logging::warn!("healed profile collection save failed: {err}");
        }
    }
    collection
}

/// Writes the whole profile collection.
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub fn persist_profile_collection(
    prefs: &dyn PrefsStore,
    collection: &ProfileCollection,
) -> Result<(), String> {
    save_pref_with(prefs, PROFILE_DATA_KEY, collection)
}
