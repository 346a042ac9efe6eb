//! Session identity resolution.
//!
//! Maps the identity provider's opaque id to the profile record kept by the
//! remote data service. The resolver caches only the state for the current
//! identity; every failure mode collapses to [`ProfileState::NotFound`] so
//! gating code never sees an error.
//!
//! # Supersession
//!
//! Each call to [`IdentityResolver::resolve`] takes a new generation number.
//! A lookup applies its result only if its generation is still the latest,
//! so a slow lookup for a previous identity can never overwrite the state of
//! the current one.

mod convex;

pub use convex::ConvexProfileService;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::Instrument;

use zencode_types::{IdentityId, ProfileState, UserProfile};

use crate::constants::PROFILE_LOOKUP_TIMEOUT;

/// Errors from a profile service.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile service unavailable: {0}")]
    Unavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type ProfileResult<T> = Result<T, ProfileError>;

/// Read-only lookup of profile records.
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Service name for logging.
    fn name(&self) -> &str;

    /// Fetch the record for `identity`. `Ok(None)` means no record exists.
    async fn get_user(&self, identity: &IdentityId) -> ProfileResult<Option<UserProfile>>;
}

#[derive(Debug, Default)]
struct Resolved {
    identity: Option<IdentityId>,
    profile: ProfileState,
}

/// Resolves the signed-in identity to a [`ProfileState`].
pub struct IdentityResolver {
    service: Option<Arc<dyn ProfileService>>,
    timeout: Duration,
    generation: AtomicU64,
    current: RwLock<Resolved>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("service", &self.service.as_ref().map(|s| s.name().to_string()))
            .field("timeout", &self.timeout)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

impl IdentityResolver {
    pub fn new(service: Arc<dyn ProfileService>) -> Self {
        Self {
            service: Some(service),
            timeout: PROFILE_LOOKUP_TIMEOUT,
            generation: AtomicU64::new(0),
            current: RwLock::new(Resolved::default()),
        }
    }

    /// A resolver with no backing service. Every identity resolves to
    /// [`ProfileState::NotFound`].
    pub fn offline() -> Self {
        Self {
            service: None,
            timeout: PROFILE_LOOKUP_TIMEOUT,
            generation: AtomicU64::new(0),
            current: RwLock::new(Resolved::default()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The applied profile state.
    pub fn current(&self) -> ProfileState {
        self.current.read().profile.clone()
    }

    /// The identity the applied (or pending) state belongs to.
    pub fn identity(&self) -> Option<IdentityId> {
        self.current.read().identity.clone()
    }

    /// Resolve `identity`, superseding any lookup still in flight.
    ///
    /// Returns the state this call computed. It is applied only if no later
    /// call has started in the meantime; [`current`](Self::current) always
    /// reflects the latest applied state.
    pub async fn resolve(&self, identity: Option<IdentityId>) -> ProfileState {
        let identity = identity.filter(|id| !id.is_empty());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut current = self.current.write();
            current.profile = if identity.is_some() {
                ProfileState::Unknown
            } else {
                ProfileState::NotFound
            };
            current.identity = identity.clone();
        }

        let Some(identity) = identity else {
            tracing::debug!(generation, "no identity, profile not found");
            return ProfileState::NotFound;
        };

        let span = tracing::info_span!("profile.resolve", identity = %identity, generation);
        let state = self.lookup(&identity).instrument(span).await;

        let mut current = self.current.write();
        if self.generation.load(Ordering::SeqCst) == generation {
            current.profile = state.clone();
        } else {
            tracing::debug!(identity = %identity, generation, "discarding superseded profile lookup");
        }
        state
    }

    async fn lookup(&self, identity: &IdentityId) -> ProfileState {
        let Some(service) = &self.service else {
            tracing::debug!("no profile service configured");
            return ProfileState::NotFound;
        };

        match tokio::time::timeout(self.timeout, service.get_user(identity)).await {
            Ok(Ok(Some(profile))) => {
                tracing::info!(is_pro = profile.is_pro, "profile resolved");
                ProfileState::Resolved(profile)
            }
            Ok(Ok(None)) => {
                tracing::info!("no profile record");
                ProfileState::NotFound
            }
            Ok(Err(e)) => {
                tracing::warn!(service = service.name(), error = %e, "profile lookup failed");
                ProfileState::NotFound
            }
            Err(_) => {
                tracing::warn!(service = service.name(), timeout = ?self.timeout, "profile lookup timed out");
                ProfileState::NotFound
            }
        }
    }
}
