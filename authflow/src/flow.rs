//! Discovery engine and SSO initiator over an injectable state container.
//!
//! DESIGN
//! ======
//! `AuthFlow` owns the session and discovery state for one application
//! shell. Nothing is global: the Leptos app builds one at startup and tests
//! build a fresh one per case.
//!
//! Every mutation happens inside a single `RefCell` borrow that is released
//! before any `.await` and before observers run, so no task can observe a
//! half-applied update. Each discovery or SSO call is tagged with the
//! generation current when it was issued; selecting a different email,
//! logging out, or completing sign-in bumps the generation, and a completion
//! carrying an older tag is dropped.
//!
//! Concurrent discovery calls for the same generation share one
//! `futures::future::Shared` future, so only one network request is made.

#[cfg(test)]
#[path = "flow_test.rs"]
mod flow_test;

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture, Shared};

use crate::backend::{SsoProvider, TenantDirectory};
use crate::discovery::{DiscoveryResponse, DiscoveryResult, DiscoveryState, ProviderId, normalize_email};
use crate::error::{AuthError, BackendError};
use crate::guard::{self, AuthStage, GuardDecision, LoginView, Screen};
use crate::session::SessionState;
use crate::storage::{self, KeyValueStore};

type DiscoveryOutput = Result<Option<DiscoveryResult>, AuthError>;
type SharedDiscovery = Shared<LocalBoxFuture<'static, DiscoveryOutput>>;
type Observer = Rc<dyn Fn(&AuthSnapshot)>;

/// Point-in-time copy of both states, handed to observers and screens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub session: SessionState,
    pub discovery: DiscoveryState,
}

impl AuthSnapshot {
    #[must_use]
    pub fn stage(&self) -> AuthStage {
        guard::stage(&self.session, &self.discovery)
    }

    #[must_use]
    pub fn evaluate(&self, screen: Screen) -> GuardDecision {
        guard::evaluate(screen, &self.session, &self.discovery)
    }

    #[must_use]
    pub fn login_view(&self) -> LoginView {
        LoginView::from(&self.discovery)
    }
}

#[derive(Default)]
struct FlowState {
    session: SessionState,
    discovery: DiscoveryState,
    generation: u64,
}

impl FlowState {
    fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot { session: self.session, discovery: self.discovery.clone() }
    }
}

struct PendingDiscovery {
    generation: u64,
    future: SharedDiscovery,
}

enum Registration {
    Cached(DiscoveryResult),
    Joined(SharedDiscovery),
    Start(u64),
}

enum Completion<T> {
    Applied(T),
    Failed(BackendError),
    Stale,
}

struct Inner<D, P> {
    directory: Rc<D>,
    sso: P,
    store: Rc<dyn KeyValueStore>,
    state: RefCell<FlowState>,
    pending: RefCell<Option<PendingDiscovery>>,
    observers: RefCell<Vec<Observer>>,
}

/// Injectable container for the sign-in flow. Cloning shares the same state.
pub struct AuthFlow<D, P> {
    inner: Rc<Inner<D, P>>,
}

impl<D, P> Clone for AuthFlow<D, P> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<D, P> AuthFlow<D, P>
where
    D: TenantDirectory + 'static,
    P: SsoProvider + 'static,
{
    /// Build an uninitialized flow. Call [`AuthFlow::initialize`] once the
    /// persisted state is reachable (in the browser: after hydration).
    pub fn new(directory: D, sso: P, store: Rc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Rc::new(Inner {
                directory: Rc::new(directory),
                sso,
                store,
                state: RefCell::new(FlowState::default()),
                pending: RefCell::new(None),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Load persisted session/discovery fields. Runs once; later calls are
    /// no-ops. An attempt started before loading finished keeps its
    /// in-memory discovery state.
    pub fn initialize(&self) {
        if self.inner.state.borrow().discovery.is_initialized {
            return;
        }
        let session = storage::load_session(self.inner.store.as_ref());
        let loaded = storage::load_discovery(self.inner.store.as_ref());
        let ((), changed) = self.update(|state| {
            state.session.is_authenticated |= session.is_authenticated;
            if state.discovery.email.is_none() {
                state.discovery = loaded;
            } else {
                state.discovery.is_initialized = true;
            }
        });
        log::debug!(
            "auth flow initialized (authenticated={}, email present={})",
            session.is_authenticated,
            changed.as_ref().is_some_and(|s| s.discovery.email.is_some())
        );
        self.publish(changed);
    }

    /// Register a callback run after every state change.
    pub fn subscribe(&self, observer: impl Fn(&AuthSnapshot) + 'static) {
        self.inner.observers.borrow_mut().push(Rc::new(observer));
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.state.borrow().snapshot()
    }

    #[must_use]
    pub fn session(&self) -> SessionState {
        self.inner.state.borrow().session
    }

    #[must_use]
    pub fn discovery(&self) -> DiscoveryState {
        self.inner.state.borrow().discovery.clone()
    }

    /// Look up tenants for `email`.
    ///
    /// Bookkeeping happens before this returns: a changed email resets the
    /// discovery state, `is_loading` is raised, and the call is registered,
    /// so a second call issued before the first is awaited joins it instead
    /// of making another request. The returned future must be driven to
    /// completion.
    ///
    /// Resolves to `Ok(Some(_))` with the (possibly cached) result, or
    /// `Ok(None)` when the email was superseded before the response arrived.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidEmail`] for malformed input, and
    /// [`AuthError::NetworkFailure`] when the backend call fails. A failed
    /// call leaves `discovery_attempted` false so the user can retry.
    pub fn discover_tenants(&self, email: &str) -> LocalBoxFuture<'static, DiscoveryOutput> {
        let email = match normalize_email(email) {
            Ok(email) => email,
            Err(err) => return future::ready(Err(err)).boxed_local(),
        };
        let in_flight = self
            .inner
            .pending
            .borrow()
            .as_ref()
            .map(|pending| (pending.generation, pending.future.clone()));

        let (registration, changed) = self.update(|state| {
            if state.discovery.select_email(&email) {
                state.generation += 1;
            }
            if let Some(result) = state.discovery.result() {
                return Registration::Cached(result);
            }
            if let Some((_, future)) = in_flight.filter(|(generation, _)| *generation == state.generation) {
                return Registration::Joined(future);
            }
            state.discovery.is_loading = true;
            Registration::Start(state.generation)
        });

        let output = match registration {
            Registration::Cached(result) => {
                log::debug!("discovery for {email} served from state");
                future::ready(Ok(Some(result))).boxed_local()
            }
            Registration::Joined(future) => {
                log::debug!("discovery for {email} joined the in-flight call");
                future.boxed_local()
            }
            Registration::Start(generation) => self.register_pending(email, generation).boxed_local(),
        };
        self.publish(changed);
        output
    }

    /// Start the provider exchange for the discovered tenant.
    ///
    /// On success the session becomes authenticated and discovery is
    /// cleared. A completion for a flow that was reset meanwhile (logout,
    /// different email) is dropped.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidProvider`] when `provider` is not in the
    /// discovered list, [`AuthError::Busy`] while another call is in flight,
    /// and [`AuthError::NetworkFailure`] when the exchange fails.
    pub async fn login_with_sso(&self, provider: &ProviderId) -> Result<(), AuthError> {
        let (started, changed) = self.update(|state| {
            if !state.discovery.offers(provider) {
                return Err(AuthError::InvalidProvider(provider.clone()));
            }
            if state.discovery.is_loading {
                return Err(AuthError::Busy);
            }
            let email = state
                .discovery
                .email
                .clone()
                .ok_or_else(|| AuthError::InvalidProvider(provider.clone()))?;
            state.discovery.is_loading = true;
            Ok((state.generation, email))
        });
        self.publish(changed);
        let (generation, email) = started?;

        log::debug!("starting {provider} sign-in for {email}");
        let outcome = self.inner.sso.sign_in(provider, &email).await;

        let (completion, changed) = self.update(|state| {
            if state.generation != generation {
                return Completion::Stale;
            }
            match outcome {
                Ok(()) => {
                    state.session.is_authenticated = true;
                    state.discovery.reset();
                    state.generation += 1;
                    Completion::Applied(())
                }
                Err(err) => {
                    state.discovery.is_loading = false;
                    Completion::Failed(err)
                }
            }
        });
        self.publish(changed);

        match completion {
            Completion::Applied(()) => {
                log::info!("signed in with {provider}");
                Ok(())
            }
            Completion::Failed(err) => {
                log::warn!("{provider} sign-in failed: {err}");
                Err(AuthError::NetworkFailure(err))
            }
            Completion::Stale => {
                log::debug!("discarding stale {provider} sign-in result");
                Ok(())
            }
        }
    }

    /// Drop the session and any in-progress attempt.
    pub fn logout(&self) {
        let ((), changed) = self.update(|state| {
            state.session = SessionState::default();
            state.discovery.reset();
            state.generation += 1;
        });
        self.inner.pending.borrow_mut().take();
        self.publish(changed);
    }

    /// Forget the current discovery, including a cached result, so the next
    /// `discover_tenants` call goes back to the backend. The session is kept.
    /// An in-flight discovery resolves to `Ok(None)`.
    pub fn reset(&self) {
        let ((), changed) = self.update(|state| {
            state.discovery.reset();
            state.generation += 1;
        });
        self.inner.pending.borrow_mut().take();
        log::debug!("discovery state reset");
        self.publish(changed);
    }

    fn register_pending(&self, email: String, generation: u64) -> SharedDiscovery {
        let directory = Rc::clone(&self.inner.directory);
        let flow = Rc::downgrade(&self.inner);
        let future = async move {
            log::debug!("discovering tenants for {email}");
            let response = directory.discover(&email).await;
            match flow.upgrade() {
                Some(inner) => AuthFlow { inner }.complete_discovery(generation, &email, response),
                None => Ok(None),
            }
        }
        .boxed_local()
        .shared();
        *self.inner.pending.borrow_mut() = Some(PendingDiscovery { generation, future: future.clone() });
        future
    }

    fn complete_discovery(
        &self,
        generation: u64,
        email: &str,
        response: Result<DiscoveryResponse, BackendError>,
    ) -> DiscoveryOutput {
        let (completion, changed) = self.update(|state| {
            if state.generation != generation {
                return Completion::Stale;
            }
            match response {
                Ok(response) => state
                    .discovery
                    .apply_response(response)
                    .map_or(Completion::Stale, Completion::Applied),
                Err(err) => {
                    state.discovery.is_loading = false;
                    Completion::Failed(err)
                }
            }
        });
        {
            let mut pending = self.inner.pending.borrow_mut();
            if pending.as_ref().is_some_and(|p| p.generation == generation) {
                *pending = None;
            }
        }
        self.publish(changed);

        match completion {
            Completion::Applied(result) => {
                log::debug!(
                    "discovery for {email} finished (existing accounts={}, providers={})",
                    result.has_existing_accounts,
                    result.providers.len()
                );
                Ok(Some(result))
            }
            Completion::Failed(err) => {
                log::warn!("tenant discovery for {email} failed: {err}");
                Err(AuthError::NetworkFailure(err))
            }
            Completion::Stale => {
                log::debug!("discarding stale discovery result for {email}");
                Ok(None)
            }
        }
    }

    fn update<R>(&self, apply: impl FnOnce(&mut FlowState) -> R) -> (R, Option<AuthSnapshot>) {
        let mut state = self.inner.state.borrow_mut();
        let before = state.snapshot();
        let result = apply(&mut state);
        let after = state.snapshot();
        (result, (after != before).then_some(after))
    }

    fn publish(&self, changed: Option<AuthSnapshot>) {
        let Some(snapshot) = changed else {
            return;
        };
        // Nothing is written before the persisted copy has been read.
        if snapshot.discovery.is_initialized {
            storage::save(self.inner.store.as_ref(), &snapshot.session, &snapshot.discovery);
        }
        let observers = self.inner.observers.borrow().clone();
        for observer in &observers {
            observer(&snapshot);
        }
    }
}
