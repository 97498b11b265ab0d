//! Content resources addressed by type-selector routes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resource resolved from a request path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub path: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixin_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl Resource {
    #[must_use]
    pub fn new(path: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            resource_type: resource_type.into(),
            primary_type: None,
            mixin_types: Vec::new(),
            properties: Map::new(),
        }
    }

    #[must_use]
    pub fn with_primary_type(mut self, primary_type: impl Into<String>) -> Self {
        self.primary_type = Some(primary_type.into());
        self
    }

    #[must_use]
    pub fn with_mixin(mut self, mixin: impl Into<String>) -> Self {
        self.mixin_types.push(mixin.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// True when the primary type or any mixin equals `node_type`.
    #[must_use]
    pub fn is_node_type(&self, node_type: &str) -> bool {
        self.primary_type.as_deref() == Some(node_type)
            || self.mixin_types.iter().any(|mixin| mixin == node_type)
    }
}
