//! Provider add/remove notifications applied to the registry.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::provider::{ActionProvider, ProviderId};
use super::registry::ActionRegistry;
use super::worker::{BackgroundRunnable, BackgroundWorker};

/// A provider appeared or disappeared.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    Added(ActionProvider),
    Removed(ProviderId),
}

/// Applies [`ProviderEvent`]s idempotently, keyed by provider identity.
///
/// Duplicate adds and removes are ignored. A removal for a provider never
/// seen is remembered, and its late add is then dropped once. Removing a
/// provider already gone never blocks a later add.
pub struct RegistryWatcher {
    registry: Arc<ActionRegistry>,
    seen: HashSet<ProviderId>,
    departed: HashSet<ProviderId>,
}

impl RegistryWatcher {
    #[must_use]
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self {
            registry,
            seen: HashSet::new(),
            departed: HashSet::new(),
        }
    }

    pub fn apply(&mut self, event: ProviderEvent) {
        match event {
            ProviderEvent::Added(provider) => {
                let id = provider.id;
                if self.departed.remove(&id) {
                    debug!(provider = %id, "Dropping add for provider already removed");
                    return;
                }
                self.seen.insert(id);
                if self.registry.contains(id) {
                    debug!(provider = %id, "Ignoring duplicate add");
                } else if let Err(err) = self.registry.register(provider) {
                    warn!(provider = %id, error = %err, "Unable to register action");
                }
            }
            ProviderEvent::Removed(id) => {
                if self.registry.deregister(id) {
                    return;
                }
                if self.seen.contains(&id) {
                    debug!(provider = %id, "Ignoring duplicate remove");
                } else {
                    self.departed.insert(id);
                }
            }
        }
    }
}

#[async_trait]
impl BackgroundRunnable for RegistryWatcher {
    type Task = ProviderEvent;

    async fn run(&mut self, task: ProviderEvent) {
        self.apply(task);
    }

    async fn shutdown(&mut self) {
        debug!(pending_removals = self.departed.len(), "Registry watcher stopped");
    }
}

/// Starts a watcher on its own background worker.
#[must_use]
pub fn spawn_registry_watcher(registry: Arc<ActionRegistry>) -> BackgroundWorker<RegistryWatcher> {
    BackgroundWorker::start(RegistryWatcher::new(registry))
}
