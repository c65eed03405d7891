//! Tenant discovery and session-establishment flow for the sign-in portal.
//!
//! This crate is UI-framework agnostic so the Leptos client, the SSR host and
//! the CLI can all drive the same state machine. Browser and HTTP concerns
//! enter through the [`TenantDirectory`], [`SsoProvider`] and
//! [`KeyValueStore`] seams.
//!
//! ARCHITECTURE
//! ============
//! - `session` / `discovery`: plain state models and their transitions.
//! - `flow`: the injectable [`AuthFlow`] container (discovery engine + SSO
//!   initiator) with coalescing and stale-result handling.
//! - `guard`: the pure route guard deciding what each screen does next.
//! - `storage` / `handoff`: persisted fields and the org-signup hand-off.

pub mod backend;
pub mod discovery;
pub mod error;
pub mod flow;
pub mod guard;
pub mod handoff;
pub mod session;
pub mod storage;

pub use backend::{SsoProvider, TenantDirectory};
pub use discovery::{
    DiscoveryResponse, DiscoveryResult, DiscoveryState, ProviderId, SsoResponse, TenantInfo, normalize_email,
};
pub use error::{AuthError, BackendError};
pub use flow::{AuthFlow, AuthSnapshot};
pub use guard::{AuthStage, EntryOutcome, GuardDecision, LoginView, RedirectLatch, Screen, entry_outcome, evaluate, stage};
pub use handoff::{HandoffError, OrgHandoff};
pub use session::SessionState;
pub use storage::{KeyValueStore, MemoryStore};
