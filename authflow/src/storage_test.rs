use super::*;

fn providers(ids: &[&str]) -> Vec<ProviderId> {
    ids.iter().copied().map(ProviderId::from).collect()
}

// =============================================================
// MemoryStore
// =============================================================

#[test]
fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert!(store.is_empty());
    store.set("k", "v");
    assert_eq!(store.get("k").as_deref(), Some("v"));
    store.remove("k");
    assert!(store.get("k").is_none());
    assert_eq!(store.len(), 0);
}

#[test]
fn rc_store_shares_entries() {
    let store = Rc::new(MemoryStore::new());
    let handle: Rc<dyn KeyValueStore> = store.clone();
    handle.set("k", "v");
    assert_eq!(store.get("k").as_deref(), Some("v"));
}

// =============================================================
// load / save
// =============================================================

#[test]
fn load_from_empty_store_is_initialized_default() {
    let store = MemoryStore::new();
    assert_eq!(load_session(&store), SessionState::default());
    let discovery = load_discovery(&store);
    assert!(discovery.is_initialized);
    assert!(discovery.email.is_none());
}

#[test]
fn save_then_load_keeps_resumable_fields_but_not_loading() {
    let store = MemoryStore::new();
    let discovery = DiscoveryState {
        email: Some("b@y.com".to_owned()),
        is_initialized: true,
        discovery_attempted: true,
        has_discovered_tenants: true,
        tenant_info: Some(TenantInfo { name: "Y".to_owned(), domain: "y.com".to_owned() }),
        available_providers: providers(&["google", "okta"]),
        is_loading: true,
    };
    save(&store, &SessionState::authenticated(), &discovery);

    assert!(load_session(&store).is_authenticated);
    let loaded = load_discovery(&store);
    assert_eq!(loaded, DiscoveryState { is_loading: false, ..discovery });
}

#[test]
fn corrupt_entries_are_treated_as_absent() {
    let store = MemoryStore::new();
    store.set(SESSION_KEY, "{not json");
    store.set(DISCOVERY_KEY, "[]");
    assert_eq!(load_session(&store), SessionState::default());
    assert!(load_discovery(&store).email.is_none());
}

// =============================================================
// PersistedDiscovery::into_state
// =============================================================

#[test]
fn into_state_drops_results_without_email() {
    let persisted = PersistedDiscovery {
        email: Some("  ".to_owned()),
        discovery_attempted: true,
        has_discovered_tenants: true,
        tenant_info: None,
        available_providers: providers(&["google"]),
    };
    let state = persisted.into_state();
    assert!(state.email.is_none());
    assert!(!state.discovery_attempted);
    assert!(state.available_providers.is_empty());
    assert!(state.is_consistent());
}

#[test]
fn into_state_drops_providers_without_tenants() {
    let persisted = PersistedDiscovery {
        email: Some("b@y.com".to_owned()),
        discovery_attempted: true,
        has_discovered_tenants: false,
        tenant_info: None,
        available_providers: providers(&["google"]),
    };
    let state = persisted.into_state();
    assert!(state.discovery_attempted);
    assert!(state.available_providers.is_empty());
    assert!(state.is_consistent());
}

#[test]
fn into_state_keeps_unattempted_email_for_resume() {
    let persisted = PersistedDiscovery { email: Some("b@y.com".to_owned()), ..PersistedDiscovery::default() };
    let state = persisted.into_state();
    assert_eq!(state.email.as_deref(), Some("b@y.com"));
    assert!(!state.discovery_attempted);
    assert!(state.is_initialized);
}

#[test]
fn into_state_normalizes_a_hand_edited_email() {
    let persisted = PersistedDiscovery {
        email: Some(" B@Y.com ".to_owned()),
        discovery_attempted: true,
        has_discovered_tenants: true,
        tenant_info: Some(TenantInfo { name: "Y".to_owned(), domain: "y.com".to_owned() }),
        available_providers: providers(&["google"]),
    };
    let state = persisted.into_state();
    assert_eq!(state.email.as_deref(), Some("b@y.com"));
    assert!(state.has_discovered_tenants);
    assert_eq!(state.available_providers, providers(&["google"]));
}

#[test]
fn into_state_drops_an_invalid_email_and_its_results() {
    let persisted = PersistedDiscovery {
        email: Some("not-an-email".to_owned()),
        discovery_attempted: true,
        ..PersistedDiscovery::default()
    };
    let state = persisted.into_state();
    assert!(state.email.is_none());
    assert!(!state.discovery_attempted);
    assert!(state.is_consistent());
}
