use std::collections::HashMap;
use std::sync::Arc;

use actiongate_core::RoutingIdentity;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::operation::{EndpointHandle, RegistryError};
use super::pipeline::PipelineDeps;
use super::provider::{ActionProvider, ProviderId};
use super::resolver::RoutingMetadataResolver;
use crate::traits::EndpointPublisher;

// ---------------------------------------------------------------------------
// Registration records
// ---------------------------------------------------------------------------

/// Returned by a successful [`ActionRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationHandle {
    pub provider: ProviderId,
    pub endpoint: EndpointHandle,
}

/// Snapshot of one live registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub provider: ProviderId,
    pub action_type: String,
    pub identity: RoutingIdentity,
}

struct RegistrationEntry {
    identity: RoutingIdentity,
    endpoint: EndpointHandle,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<ProviderId, RegistrationEntry>,
    closed: bool,
}

/// Result of reconciling a batch of providers at startup.
#[derive(Debug, Default)]
pub struct InitReport {
    pub registered: Vec<ProviderId>,
    pub failed: Vec<(ProviderId, RegistryError)>,
}

impl InitReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ActionRegistry
// ---------------------------------------------------------------------------

/// Process-wide table of active actions keyed by provider identity.
///
/// All mutations run under one coarse lock, so a provider is resolved,
/// published and recorded atomically with respect to every other mutation.
/// Request dispatch never takes this lock; it reads the publisher's routes.
/// Once [`shutdown`](Self::shutdown) runs the registry is closed for good.
pub struct ActionRegistry {
    resolver: RoutingMetadataResolver,
    publisher: Arc<dyn EndpointPublisher>,
    deps: PipelineDeps,
    state: Mutex<RegistryState>,
}

impl ActionRegistry {
    #[must_use]
    pub fn new(
        resolver: RoutingMetadataResolver,
        publisher: Arc<dyn EndpointPublisher>,
        deps: PipelineDeps,
    ) -> Self {
        Self {
            resolver,
            publisher,
            deps,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Resolves, publishes and records one provider.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Closed`] once the registry has been shut down.
    /// - [`RegistryError::Duplicate`] if the provider is already registered;
    ///   the existing endpoint stays published.
    /// - [`RegistryError::Configuration`] if its metadata breaks a routing rule.
    /// - [`RegistryError::Publish`] if the publisher refuses the routes.
    pub fn register(&self, provider: ActionProvider) -> Result<RegistrationHandle, RegistryError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(RegistryError::Closed);
        }
        if state.entries.contains_key(&provider.id) {
            return Err(RegistryError::Duplicate { id: provider.id });
        }

        let identity = self.resolver.resolve(&provider.action.metadata())?;
        let endpoint = Arc::clone(&provider.action).into_endpoint(identity.clone(), &self.deps);
        let handle = self.publisher.publish(&identity, endpoint)?;

        info!(
            provider = %provider.id,
            action = %identity.action_type,
            route = %identity,
            "Registered action"
        );
        state.entries.insert(
            provider.id,
            RegistrationEntry {
                identity,
                endpoint: handle,
            },
        );
        Ok(RegistrationHandle {
            provider: provider.id,
            endpoint: handle,
        })
    }

    /// Unpublishes and forgets a provider. Returns `false` if it was unknown.
    ///
    /// A failing unpublish is logged and the entry is removed regardless.
    pub fn deregister(&self, id: ProviderId) -> bool {
        let mut state = self.state.lock();
        let Some(entry) = state.entries.remove(&id) else {
            warn!(provider = %id, "Cannot unregister unknown action provider");
            return false;
        };
        self.unpublish(id, &entry);
        true
    }

    /// Registers every provider independently; one failure never stops the rest.
    pub fn initialize(&self, providers: impl IntoIterator<Item = ActionProvider>) -> InitReport {
        let mut report = InitReport::default();
        for provider in providers {
            let id = provider.id;
            match self.register(provider) {
                Ok(_) => report.registered.push(id),
                Err(err) => {
                    warn!(provider = %id, error = %err, "Unable to register action");
                    report.failed.push((id, err));
                }
            }
        }
        info!(
            registered = report.registered.len(),
            failed = report.failed.len(),
            "Action registry initialized"
        );
        report
    }

    /// Unpublishes everything and refuses further registrations. Returns the
    /// number of entries removed.
    pub fn shutdown(&self) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        let count = state.entries.len();
        for (id, entry) in state.entries.drain() {
            self.unpublish(id, &entry);
        }
        info!(count, "Action registry shut down");
        count
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ProviderId) -> bool {
        self.state.lock().entries.contains_key(&id)
    }

    /// Snapshot of all registrations, ordered by provider id.
    #[must_use]
    pub fn registrations(&self) -> Vec<Registration> {
        let mut snapshot: Vec<_> = self
            .state
            .lock()
            .entries
            .iter()
            .map(|(id, entry)| Registration {
                provider: *id,
                action_type: entry.identity.action_type.clone(),
                identity: entry.identity.clone(),
            })
            .collect();
        snapshot.sort_by_key(|r| r.provider);
        snapshot
    }

    fn unpublish(&self, id: ProviderId, entry: &RegistrationEntry) {
        match self.publisher.unpublish(entry.endpoint) {
            Ok(()) => debug!(provider = %id, route = %entry.identity, "Unpublished action"),
            Err(err) => warn!(
                provider = %id,
                error = %err,
                "Action endpoint already unpublished"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
