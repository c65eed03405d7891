//! Error taxonomy for the authentication flow.
//!
//! ERROR HANDLING
//! ==============
//! Only failures a screen can act on are errors. "No account found" is a
//! valid discovery outcome carried in `DiscoveryResult`, and responses for a
//! superseded email are dropped inside the flow without reaching callers.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use thiserror::Error;

use crate::discovery::ProviderId;

/// Failure reported by a backend collaborator (discovery API, SSO exchange).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("{0} is not available in this environment")]
    Unavailable(&'static str),
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Errors surfaced to the screen that started a discovery or SSO call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("network failure: {0}")]
    NetworkFailure(#[from] BackendError),
    #[error("provider `{0}` is not offered for this account")]
    InvalidProvider(ProviderId),
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),
    #[error("a sign-in is already in progress")]
    Busy,
}

impl AuthError {
    /// Whether retrying the same action can succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkFailure(_) | Self::Busy)
    }

    /// Short text for toasts and inline notices.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkFailure(_) => "We couldn't reach the server. Please try again.".to_owned(),
            Self::InvalidProvider(provider) => format!("Sign-in with {provider} is not available for this account."),
            Self::InvalidEmail(_) => "Enter a valid email address.".to_owned(),
            Self::Busy => "Sign-in is already in progress.".to_owned(),
        }
    }
}
