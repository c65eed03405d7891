//! Route guard for the sign-in screens.
//!
//! SYSTEM CONTEXT
//! ==============
//! Screens call [`evaluate`] every time the session or discovery state
//! changes and act on the returned [`GuardDecision`]. The function is pure,
//! so tests drive it without a UI runtime; [`RedirectLatch`] keeps repeated
//! evaluations from navigating twice to the same target.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::discovery::{DiscoveryResult, DiscoveryState, ProviderId, TenantInfo};
use crate::error::AuthError;
use crate::session::SessionState;

pub const ACCOUNT_NOT_FOUND_TITLE: &str = "Account Not Found";
pub const ACCOUNT_NOT_FOUND_DESCRIPTION: &str =
    "You don't have an account yet. Please create an organization first.";

/// Logical navigation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Email entry / create-organization choice.
    Entry,
    /// Provider selection for a discovered tenant.
    Login,
    /// Organization creation form.
    OrgSignup,
    /// Authenticated landing page.
    Dashboard,
}

/// Where the current attempt stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStage {
    Uninitialized,
    Entry,
    Discovering,
    NoAccount,
    LoginReady,
    Authenticated,
}

/// What a mounted screen should do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show a placeholder; state is still loading or a call is in flight.
    Wait,
    /// Render the screen normally.
    Render,
    /// Navigate away and render nothing else.
    Redirect(Screen),
    /// Start discovery for this email (resume after reload).
    Discover(String),
}

#[must_use]
pub fn stage(session: &SessionState, discovery: &DiscoveryState) -> AuthStage {
    if session.is_authenticated {
        return AuthStage::Authenticated;
    }
    if !discovery.is_initialized {
        return AuthStage::Uninitialized;
    }
    if discovery.email.is_none() {
        AuthStage::Entry
    } else if !discovery.discovery_attempted {
        AuthStage::Discovering
    } else if !discovery.has_discovered_tenants {
        AuthStage::NoAccount
    } else {
        AuthStage::LoginReady
    }
}

/// Decide what `screen` does for the given state.
#[must_use]
pub fn evaluate(screen: Screen, session: &SessionState, discovery: &DiscoveryState) -> GuardDecision {
    if screen == Screen::Dashboard {
        return if session.is_authenticated {
            GuardDecision::Render
        } else if !discovery.is_initialized {
            GuardDecision::Wait
        } else {
            GuardDecision::Redirect(Screen::Entry)
        };
    }
    if session.is_authenticated {
        return GuardDecision::Redirect(Screen::Dashboard);
    }
    match screen {
        Screen::Entry | Screen::OrgSignup | Screen::Dashboard => GuardDecision::Render,
        Screen::Login => match stage(session, discovery) {
            AuthStage::Uninitialized => GuardDecision::Wait,
            AuthStage::Entry => GuardDecision::Redirect(Screen::Entry),
            AuthStage::Discovering if discovery.is_loading => GuardDecision::Wait,
            AuthStage::Discovering => match &discovery.email {
                Some(email) => GuardDecision::Discover(email.clone()),
                None => GuardDecision::Redirect(Screen::Entry),
            },
            AuthStage::NoAccount | AuthStage::LoginReady => GuardDecision::Render,
            AuthStage::Authenticated => GuardDecision::Redirect(Screen::Dashboard),
        },
    }
}

/// What the entry screen does once its "sign in" discovery settles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryOutcome {
    /// An account exists; continue to provider selection.
    Navigate(Screen),
    /// Valid outcome with no tenant: stay and show the not-found notice.
    AccountNotFound,
    /// Stay and offer a retry.
    Failed(AuthError),
    /// The response belonged to an email that is no longer current.
    Ignored,
}

#[must_use]
pub fn entry_outcome(result: &Result<Option<DiscoveryResult>, AuthError>) -> EntryOutcome {
    match result {
        Ok(Some(result)) if result.has_existing_accounts => EntryOutcome::Navigate(Screen::Login),
        Ok(Some(_)) => EntryOutcome::AccountNotFound,
        Ok(None) => EntryOutcome::Ignored,
        Err(err) => EntryOutcome::Failed(err.clone()),
    }
}

/// Read-only discovery view handed to the login screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginView {
    pub email: String,
    pub tenant_info: Option<TenantInfo>,
    pub has_discovered_tenants: bool,
    pub available_providers: Vec<ProviderId>,
    pub is_loading: bool,
}

impl From<&DiscoveryState> for LoginView {
    fn from(state: &DiscoveryState) -> Self {
        Self {
            email: state.email.clone().unwrap_or_default(),
            tenant_info: state.tenant_info.clone(),
            has_discovered_tenants: state.has_discovered_tenants,
            available_providers: state.available_providers.clone(),
            is_loading: state.is_loading,
        }
    }
}

/// Remembers the last redirect issued so re-entrant evaluations are no-ops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedirectLatch {
    issued: Option<Screen>,
}

impl RedirectLatch {
    /// Return the screen to navigate to, or `None` when the decision is not a
    /// redirect or the same redirect was already issued. Any non-redirect
    /// decision re-arms the latch.
    pub fn claim(&mut self, decision: &GuardDecision) -> Option<Screen> {
        match decision {
            GuardDecision::Redirect(target) if self.issued == Some(*target) => None,
            GuardDecision::Redirect(target) => {
                self.issued = Some(*target);
                Some(*target)
            }
            _ => {
                self.issued = None;
                None
            }
        }
    }
}
