//! Durable authentication result for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Shared by every page. Loaded from storage once at startup, flipped on by a
//! completed SSO exchange and off again by logout.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use serde::{Deserialize, Serialize};

/// Whether a valid session has been established.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub is_authenticated: bool,
}

impl SessionState {
    #[must_use]
    pub fn authenticated() -> Self {
        Self { is_authenticated: true }
    }
}
