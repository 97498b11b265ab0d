//! Dynamic route table published into by the action registry.
//!
//! Routes are looked up by the axum fallback handler on every request, so the
//! table is a `DashMap` readable without the registry's lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use actiongate_core::{
    HttpMethod, Resource, RouteBinding, RoutingIdentity, ACTION_EXTENSION, DEFAULT_RESOURCE_TYPE,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::service::operation::{EndpointHandle, PublishError};
use crate::traits::{ActionEndpoint, EndpointPublisher, ResourceResolver};

// ---------------------------------------------------------------------------
// RouteKey
// ---------------------------------------------------------------------------

/// Unique key of one route. The extension is always `action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteKey {
    Path {
        path: String,
        method: HttpMethod,
    },
    Selector {
        resource_type: String,
        selector: String,
        method: HttpMethod,
    },
}

impl RouteKey {
    /// Every key an identity is published under, without duplicates.
    #[must_use]
    pub fn for_identity(identity: &RoutingIdentity) -> Vec<Self> {
        let method = identity.method;
        match &identity.binding {
            RouteBinding::Path { path } => vec![Self::Path {
                path: path.clone(),
                method,
            }],
            RouteBinding::ResourceType {
                resource_types,
                selector,
            } => {
                let mut keys: Vec<Self> = Vec::with_capacity(resource_types.len());
                for resource_type in resource_types {
                    let key = Self::Selector {
                        resource_type: resource_type.clone(),
                        selector: selector.clone(),
                        method,
                    };
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                keys
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RequestTarget
// ---------------------------------------------------------------------------

/// A request path split into resource path, selectors and extension.
///
/// `/content/site.greeter.hello.action` has resource path `/content/site`,
/// selectors `greeter.hello` and extension `action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub resource_path: String,
    pub selectors: String,
    pub extension: String,
}

impl RequestTarget {
    /// Returns `None` when the last segment carries no extension.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let (parent, last) = match path.rfind('/') {
            Some(slash) => path.split_at(slash + 1),
            None => ("", path),
        };
        let (name, suffix) = last.split_once('.')?;
        if name.is_empty() {
            return None;
        }
        let (selectors, extension) = match suffix.rsplit_once('.') {
            Some((selectors, extension)) => (selectors, extension),
            None => ("", suffix),
        };
        if extension.is_empty() {
            return None;
        }
        Some(Self {
            resource_path: format!("{parent}{name}"),
            selectors: selectors.to_string(),
            extension: extension.to_string(),
        })
    }

    #[must_use]
    pub fn is_action(&self) -> bool {
        self.extension == ACTION_EXTENSION
    }
}

// ---------------------------------------------------------------------------
// RouteTable
// ---------------------------------------------------------------------------

/// In-process endpoint publisher.
pub struct RouteTable {
    routes: DashMap<RouteKey, Arc<dyn ActionEndpoint>>,
    handles: DashMap<EndpointHandle, Vec<RouteKey>>,
    next_handle: AtomicU64,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
            handles: DashMap::new(),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Number of published routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[must_use]
    pub fn is_published(&self, handle: EndpointHandle) -> bool {
        self.handles.contains_key(&handle)
    }

    #[must_use]
    pub fn get(&self, key: &RouteKey) -> Option<Arc<dyn ActionEndpoint>> {
        self.routes.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Finds the endpoint for a request.
    ///
    /// Without selectors the resource path must match a path route exactly.
    /// With selectors the resource's own type is tried first, then the
    /// default resource type.
    #[must_use]
    pub fn lookup(
        &self,
        target: &RequestTarget,
        method: HttpMethod,
        resource: Option<&Resource>,
    ) -> Option<Arc<dyn ActionEndpoint>> {
        if !target.is_action() {
            return None;
        }
        if target.selectors.is_empty() {
            return self.get(&RouteKey::Path {
                path: target.resource_path.clone(),
                method,
            });
        }
        let resource = resource?;
        let selector_key = |resource_type: &str| RouteKey::Selector {
            resource_type: resource_type.to_string(),
            selector: target.selectors.clone(),
            method,
        };
        self.get(&selector_key(&resource.resource_type))
            .or_else(|| self.get(&selector_key(DEFAULT_RESOURCE_TYPE)))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointPublisher for RouteTable {
    fn publish(
        &self,
        identity: &RoutingIdentity,
        endpoint: Arc<dyn ActionEndpoint>,
    ) -> Result<EndpointHandle, PublishError> {
        let keys = RouteKey::for_identity(identity);
        let mut inserted: Vec<RouteKey> = Vec::with_capacity(keys.len());

        for key in &keys {
            // The entry guard holds a shard lock; release it before rolling back.
            let taken = match self.routes.entry(key.clone()) {
                Entry::Occupied(_) => true,
                Entry::Vacant(slot) => {
                    slot.insert(Arc::clone(&endpoint));
                    false
                }
            };
            if taken {
                for key in &inserted {
                    self.routes.remove(key);
                }
                return Err(PublishError::RouteConflict {
                    route: identity.to_string(),
                });
            }
            inserted.push(key.clone());
        }

        let handle = EndpointHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.handles.insert(handle, keys);
        Ok(handle)
    }

    fn unpublish(&self, handle: EndpointHandle) -> Result<(), PublishError> {
        let (_, keys) = self
            .handles
            .remove(&handle)
            .ok_or(PublishError::UnknownHandle(handle))?;
        for key in &keys {
            self.routes.remove(key);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InMemoryResources
// ---------------------------------------------------------------------------

/// Resource store for type-selector routes, keyed by path.
#[derive(Default)]
pub struct InMemoryResources {
    resources: DashMap<String, Resource>,
}

impl InMemoryResources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the resource at its path.
    pub fn insert(&self, resource: Resource) {
        self.resources.insert(resource.path.clone(), resource);
    }

    pub fn remove(&self, path: &str) -> Option<Resource> {
        self.resources.remove(path).map(|(_, resource)| resource)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceResolver for InMemoryResources {
    fn resolve(&self, path: &str) -> Option<Resource> {
        self.resources.get(path).map(|entry| entry.value().clone())
    }
}
