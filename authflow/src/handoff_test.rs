use super::*;
use crate::storage::MemoryStore;

#[test]
fn new_trims_and_normalizes_domain() {
    let handoff = OrgHandoff::new("  Acme Corp ", " Acme.IO. ").unwrap();
    assert_eq!(handoff.org_name, "Acme Corp");
    assert_eq!(handoff.domain, "acme.io");
}

#[test]
fn new_rejects_blank_fields() {
    assert_eq!(OrgHandoff::new("  ", "acme.io"), Err(HandoffError::MissingOrgName));
    assert_eq!(OrgHandoff::new("Acme", ""), Err(HandoffError::MissingDomain));
}

#[test]
fn write_uses_signup_keys() {
    let store = MemoryStore::new();
    OrgHandoff::new("Acme", "acme.io").unwrap().write(&store);
    assert_eq!(store.get(ORG_NAME_KEY).as_deref(), Some("Acme"));
    assert_eq!(store.get(DOMAIN_KEY).as_deref(), Some("acme.io"));
}

#[test]
fn take_reads_once() {
    let store = MemoryStore::new();
    let handoff = OrgHandoff::new("Acme", "acme.io").unwrap();
    handoff.write(&store);
    assert_eq!(OrgHandoff::take(&store), Some(handoff));
    assert_eq!(OrgHandoff::take(&store), None);
    assert!(store.is_empty());
}

#[test]
fn take_without_org_name_clears_stray_domain() {
    let store = MemoryStore::new();
    store.set(DOMAIN_KEY, "acme.io");
    assert_eq!(OrgHandoff::take(&store), None);
    assert!(store.is_empty());
}
