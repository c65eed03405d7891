//! Contracts the flow needs from the backend.
//!
//! Implementations live with their transport: gloo-net in the browser
//! client, reqwest in the CLI, scripted fakes in tests. Futures are not
//! required to be `Send`; the flow runs on a single cooperative event loop.

use std::future::Future;
use std::rc::Rc;

use crate::discovery::{DiscoveryResponse, ProviderId};
use crate::error::BackendError;

/// Tenant-discovery API: `{ email }` -> `DiscoveryResponse`.
pub trait TenantDirectory {
    fn discover(&self, email: &str) -> impl Future<Output = Result<DiscoveryResponse, BackendError>>;
}

/// Provider hand-off/exchange. `Ok(())` means a session now exists.
pub trait SsoProvider {
    fn sign_in(&self, provider: &ProviderId, email: &str) -> impl Future<Output = Result<(), BackendError>>;
}

impl<T: TenantDirectory> TenantDirectory for Rc<T> {
    fn discover(&self, email: &str) -> impl Future<Output = Result<DiscoveryResponse, BackendError>> {
        (**self).discover(email)
    }
}

impl<T: SsoProvider> SsoProvider for Rc<T> {
    fn sign_in(&self, provider: &ProviderId, email: &str) -> impl Future<Output = Result<(), BackendError>> {
        (**self).sign_in(provider, email)
    }
}
