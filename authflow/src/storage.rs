//! Persisted session/discovery fields.
//!
//! SYSTEM CONTEXT
//! ==============
//! In the browser these keys live in `localStorage`, so a reload can resume
//! the flow without re-entering the email. The flow reads them once during
//! `AuthFlow::initialize` and afterwards only writes.
//!
//! ERROR HANDLING
//! ==============
//! Corrupt entries are logged and treated as absent; a bad cache must never
//! block sign-in.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::discovery::{DiscoveryState, ProviderId, TenantInfo, normalize_email};
use crate::session::SessionState;

pub const SESSION_KEY: &str = "auth:session";
pub const DISCOVERY_KEY: &str = "auth:discovery";

/// String key/value storage (`localStorage`, `sessionStorage`, or memory).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

/// In-memory store used by tests, the CLI and server-side rendering.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Discovery fields that survive a reload. `is_loading` is never stored: a
/// request cannot outlive the page that issued it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDiscovery {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub discovery_attempted: bool,
    #[serde(default)]
    pub has_discovered_tenants: bool,
    #[serde(default)]
    pub tenant_info: Option<TenantInfo>,
    #[serde(default)]
    pub available_providers: Vec<ProviderId>,
}

impl From<&DiscoveryState> for PersistedDiscovery {
    fn from(state: &DiscoveryState) -> Self {
        Self {
            email: state.email.clone(),
            discovery_attempted: state.discovery_attempted,
            has_discovered_tenants: state.has_discovered_tenants,
            tenant_info: state.tenant_info.clone(),
            available_providers: state.available_providers.clone(),
        }
    }
}

impl PersistedDiscovery {
    /// Rebuild an initialized state, dropping any field whose prerequisite
    /// is missing so a hand-edited entry cannot break the invariants. The
    /// email is normalized the same way `discover_tenants` does it; an
    /// invalid one is dropped with everything that depends on it.
    #[must_use]
    pub fn into_state(self) -> DiscoveryState {
        let mut state = DiscoveryState { is_initialized: true, ..DiscoveryState::default() };
        let email = match self.email.as_deref().map(normalize_email) {
            Some(Ok(email)) => email,
            Some(Err(e)) => {
                log::warn!("dropping persisted discovery: {e}");
                return state;
            }
            None => return state,
        };
        state.email = Some(email);
        if !self.discovery_attempted {
            return state;
        }
        state.discovery_attempted = true;
        if !self.has_discovered_tenants {
            return state;
        }
        state.has_discovered_tenants = true;
        state.tenant_info = self.tenant_info;
        state.available_providers = self.available_providers;
        state
    }
}

/// Load a JSON value for `key`, treating missing or corrupt entries as absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("discarding corrupt storage entry {key}: {e}");
            None
        }
    }
}

/// Save a JSON value under `key`.
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(e) => log::warn!("failed to encode storage entry {key}: {e}"),
    }
}

#[must_use]
pub fn load_session(store: &dyn KeyValueStore) -> SessionState {
    load_json(store, SESSION_KEY).unwrap_or_default()
}

#[must_use]
pub fn load_discovery(store: &dyn KeyValueStore) -> DiscoveryState {
    load_json::<PersistedDiscovery>(store, DISCOVERY_KEY)
        .unwrap_or_default()
        .into_state()
}

pub fn save(store: &dyn KeyValueStore, session: &SessionState, discovery: &DiscoveryState) {
    save_json(store, SESSION_KEY, session);
    save_json(store, DISCOVERY_KEY, &PersistedDiscovery::from(discovery));
}
