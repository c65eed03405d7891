//! Transient state of an in-progress sign-in attempt.
//!
//! DESIGN
//! ======
//! `DiscoveryState` only changes through the transition methods below so the
//! field invariants hold after every step:
//!
//! - `discovery_attempted` implies an email is present
//! - `has_discovered_tenants` implies `discovery_attempted`
//! - a non-empty provider list implies `has_discovered_tenants`

#[cfg(test)]
#[path = "discovery_test.rs"]
mod discovery_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, BackendError};

/// Identity provider key as reported by the discovery API (e.g. `"google"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifying data for a discovered organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantInfo {
    pub name: String,
    pub domain: String,
}

/// Wire body returned by the tenant-discovery endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub has_existing_accounts: bool,
    #[serde(default)]
    pub tenant: Option<TenantInfo>,
    #[serde(default)]
    pub providers: Option<Vec<ProviderId>>,
}

/// Wire body returned by the SSO exchange endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl SsoResponse {
    /// `ok: false` (or an empty body) is a rejection carrying the server's
    /// message when it sent one.
    ///
    /// # Errors
    ///
    /// [`BackendError::Rejected`] unless the body reports success.
    pub fn into_result(self) -> Result<(), BackendError> {
        if self.ok {
            return Ok(());
        }
        Err(BackendError::Rejected(
            self.error.unwrap_or_else(|| "sign-in was not completed".to_owned()),
        ))
    }
}

/// Outcome of a discovery call as seen by the screen that issued it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiscoveryResult {
    pub email: String,
    pub has_existing_accounts: bool,
    pub tenant_info: Option<TenantInfo>,
    pub providers: Vec<ProviderId>,
}

/// Discovery fields owned by the auth flow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryState {
    pub email: Option<String>,
    pub is_initialized: bool,
    pub discovery_attempted: bool,
    pub has_discovered_tenants: bool,
    pub tenant_info: Option<TenantInfo>,
    pub available_providers: Vec<ProviderId>,
    pub is_loading: bool,
}

impl DiscoveryState {
    /// Clear everything about the current attempt. `is_initialized` describes
    /// the storage load rather than the attempt, so it survives.
    pub fn reset(&mut self) {
        *self = Self { is_initialized: self.is_initialized, ..Self::default() };
    }

    /// Point the state at `email`, resetting first when it differs from the
    /// current one. Returns `true` when a reset happened.
    pub fn select_email(&mut self, email: &str) -> bool {
        if self.email.as_deref() == Some(email) {
            return false;
        }
        self.reset();
        self.email = Some(email.to_owned());
        true
    }

    /// Record a completed discovery call for the current email. Returns
    /// `None` (and records nothing) when no email is selected.
    pub fn apply_response(&mut self, response: DiscoveryResponse) -> Option<DiscoveryResult> {
        self.email.as_ref()?;
        let found = response.has_existing_accounts;
        self.discovery_attempted = true;
        self.has_discovered_tenants = found;
        if self.has_discovered_tenants {
            self.tenant_info = response.tenant;
            self.available_providers = dedup_providers(response.providers.unwrap_or_default());
        } else {
            self.tenant_info = None;
            self.available_providers.clear();
        }
        self.is_loading = false;
        self.result()
    }

    /// The stored outcome, once a call has completed for the current email.
    #[must_use]
    pub fn result(&self) -> Option<DiscoveryResult> {
        if !self.discovery_attempted {
            return None;
        }
        let email = self.email.clone()?;
        Some(DiscoveryResult {
            email,
            has_existing_accounts: self.has_discovered_tenants,
            tenant_info: self.tenant_info.clone(),
            providers: self.available_providers.clone(),
        })
    }

    #[must_use]
    pub fn offers(&self, provider: &ProviderId) -> bool {
        self.available_providers.contains(provider)
    }

    /// Check the field invariants listed in the module docs.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        (!self.discovery_attempted || self.email.is_some())
            && (!self.has_discovered_tenants || self.discovery_attempted)
            && (self.available_providers.is_empty() || self.has_discovered_tenants)
            && (self.tenant_info.is_none() || self.has_discovered_tenants)
    }
}

fn dedup_providers(providers: Vec<ProviderId>) -> Vec<ProviderId> {
    let mut unique: Vec<ProviderId> = Vec::with_capacity(providers.len());
    for provider in providers {
        if !provider.as_str().is_empty() && !unique.contains(&provider) {
            unique.push(provider);
        }
    }
    unique
}

/// Trim and lowercase an address, rejecting anything that is not
/// `local@domain` with both parts present.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEmail`] for blank or malformed input.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim();
    let invalid = || AuthError::InvalidEmail(email.to_owned());
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(email.to_lowercase())
}
