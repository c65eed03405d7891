//! Organization details carried from the entry screen to org signup.
//!
//! The entry screen writes both values to session storage and navigates; the
//! signup screen reads them once. No network call is involved.

#[cfg(test)]
#[path = "handoff_test.rs"]
mod handoff_test;

use thiserror::Error;

use crate::storage::KeyValueStore;

pub const ORG_NAME_KEY: &str = "auth:org_name";
pub const DOMAIN_KEY: &str = "auth:domain";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandoffError {
    #[error("organization name is required")]
    MissingOrgName,
    #[error("domain is required")]
    MissingDomain,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrgHandoff {
    pub org_name: String,
    pub domain: String,
}

impl OrgHandoff {
    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns an error when either field is blank after trimming.
    pub fn new(org_name: &str, domain: &str) -> Result<Self, HandoffError> {
        let org_name = org_name.trim();
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        if org_name.is_empty() {
            return Err(HandoffError::MissingOrgName);
        }
        if domain.is_empty() {
            return Err(HandoffError::MissingDomain);
        }
        Ok(Self { org_name: org_name.to_owned(), domain })
    }

    pub fn write(&self, store: &dyn KeyValueStore) {
        store.set(ORG_NAME_KEY, &self.org_name);
        store.set(DOMAIN_KEY, &self.domain);
    }

    /// Read and remove the hand-off. A missing organization name means there
    /// is nothing to resume.
    pub fn take(store: &dyn KeyValueStore) -> Option<Self> {
        let org_name = store.get(ORG_NAME_KEY);
        let domain = store.get(DOMAIN_KEY);
        store.remove(ORG_NAME_KEY);
        store.remove(DOMAIN_KEY);
        Some(Self { org_name: org_name?, domain: domain.unwrap_or_default() })
    }
}
