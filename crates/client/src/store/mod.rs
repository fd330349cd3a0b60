//! Local persistence seam.
//!
//! The client persists guest realms, credentials, and cached identities in a
//! synchronous string key-value store - the shape of browser local storage.
//! Embedders supply the real store; [`MemoryStore`] backs tests and headless
//! use.
//!
//! The store is shared across tabs/processes with no locking; concurrent
//! writers are last-write-wins. That is an accepted limitation, not an
//! invariant the client relies on.

use std::collections::HashMap;
use std::sync::Mutex;

use pawstore_core::GuestId;

/// Well-known store keys.
pub mod keys {
    use pawstore_core::GuestId;

    /// Key for the persistent anonymous shopper ID.
    pub const GUEST_ID: &str = "guest_id";

    /// Key for the end-user bearer token.
    pub const USER_TOKEN: &str = "token";

    /// Key for the cached end-user identity record.
    pub const USER_IDENTITY: &str = "user";

    /// Key for the administrator bearer token.
    pub const ADMIN_TOKEN: &str = "admin_token";

    /// Key for the cached administrator identity record.
    pub const ADMIN_IDENTITY: &str = "admin_user";

    /// Key for the guest-scoped cart realm.
    #[must_use]
    pub fn guest_cart(guest_id: &GuestId) -> String {
        format!("guest_cart_{guest_id}")
    }

    /// Key for the guest-scoped wishlist realm.
    #[must_use]
    pub fn guest_wishlist(guest_id: &GuestId) -> String {
        format!("guest_wishlist_{guest_id}")
    }
}

/// A synchronous string key-value store.
///
/// Semantics follow browser local storage: infallible operations, string
/// values, unset keys read as `None`.
pub trait LocalStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Remove `key` and its value, if present.
    fn remove(&self, key: &str);
}

/// Read the persisted guest ID, generating and persisting one on first use.
pub fn load_or_create_guest_id(store: &dyn LocalStore) -> GuestId {
    if let Some(stored) = store.get(keys::GUEST_ID) {
        return GuestId::new(stored);
    }
    let fresh = GuestId::generate();
    store.set(keys::GUEST_ID, fresh.as_str());
    fresh
}

/// In-memory [`LocalStore`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);

        store.set("k", "v");
        assert_eq!(store.get("k"), Some("v".to_string()));

        store.set("k", "v2");
        assert_eq!(store.get("k"), Some("v2".to_string()));

        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_guest_id_created_once() {
        let store = MemoryStore::new();
        let first = load_or_create_guest_id(&store);
        let second = load_or_create_guest_id(&store);
        assert_eq!(first, second);
        assert_eq!(store.get(keys::GUEST_ID), Some(first.as_str().to_string()));
    }

    #[test]
    fn test_realm_keys_are_guest_scoped() {
        let guest = GuestId::new("g-1");
        assert_eq!(keys::guest_cart(&guest), "guest_cart_g-1");
        assert_eq!(keys::guest_wishlist(&guest), "guest_wishlist_g-1");
    }
}
