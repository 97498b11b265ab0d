//! Derivation of routing identities from action metadata.

use actiongate_core::naming::upper_camel_to_lower_hyphen;
use actiongate_core::{RouteBinding, RoutingIdentity, ACTION_EXTENSION, DEFAULT_RESOURCE_TYPE};

use super::operation::ConfigurationError;
use super::provider::ActionMetadata;

/// Default suffix every action type name must carry.
pub const DEFAULT_ACTION_SUFFIX: &str = "Action";

/// Pure function from [`ActionMetadata`] to [`RoutingIdentity`].
///
/// Rules are checked in order and the first violation is reported:
/// routing kinds are exclusive, the type name carries the suffix, the action
/// has an owning module, and a declared model is bindable from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingMetadataResolver {
    suffix: String,
}

impl RoutingMetadataResolver {
    #[must_use]
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Computes the routing identity of one action.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigurationError`] naming the first violated rule.
    pub fn resolve(&self, metadata: &ActionMetadata) -> Result<RoutingIdentity, ConfigurationError> {
        let action = &metadata.action_type;
        let declaration = &metadata.declaration;

        if declaration.primary_types.is_some() && declaration.resource_types.is_some() {
            return Err(ConfigurationError::BothRoutingKinds {
                action: action.clone(),
            });
        }

        let segment = self.segment(action)?;

        let module_id = declaration.module_id.trim();
        if module_id.is_empty() {
            return Err(ConfigurationError::MissingModule {
                action: action.clone(),
            });
        }

        let primary_types = non_empty(declaration.primary_types.as_deref());
        let resource_types = non_empty(declaration.resource_types.as_deref());
        let selector = format!("{module_id}.{segment}");

        let binding = if !primary_types.is_empty() {
            RouteBinding::ResourceType {
                resource_types: vec![DEFAULT_RESOURCE_TYPE.to_string()],
                selector,
            }
        } else if !resource_types.is_empty() {
            RouteBinding::ResourceType {
                resource_types,
                selector,
            }
        } else {
            RouteBinding::Path {
                path: format!("/apps/{module_id}/bin/{segment}"),
            }
        };

        if let Some(model) = metadata.input.descriptor() {
            if !model.is_request_bindable() {
                return Err(ConfigurationError::ModelNotBindable {
                    action: action.clone(),
                    model: model.type_name,
                });
            }
        }

        Ok(RoutingIdentity {
            binding,
            method: declaration.method,
            extension: ACTION_EXTENSION,
            action_type: action.clone(),
            module_id: module_id.to_string(),
            primary_types,
            input: metadata.input.clone(),
        })
    }

    fn segment(&self, action: &str) -> Result<String, ConfigurationError> {
        let Some(stem) = action.strip_suffix(self.suffix.as_str()) else {
            return Err(ConfigurationError::MissingSuffix {
                action: action.to_string(),
                suffix: self.suffix.clone(),
            });
        };
        if stem.is_empty() {
            return Err(ConfigurationError::EmptyActionName {
                action: action.to_string(),
                suffix: self.suffix.clone(),
            });
        }
        Ok(upper_camel_to_lower_hyphen(stem))
    }
}

impl Default for RoutingMetadataResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ACTION_SUFFIX)
    }
}

fn non_empty(types: Option<&[String]>) -> Vec<String> {
    types
        .unwrap_or_default()
        .iter()
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .collect()
}
