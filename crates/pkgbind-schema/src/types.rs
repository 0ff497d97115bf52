//! Schema entries exposed by a package reference
//!
//! Entries are shared behind `Arc` so that a loaded package can hand them out
//! to concurrent readers without copying.

use std::sync::Arc;

// =============================================================================
// PROPERTY
// =============================================================================

/// A single input or output property of a resource or function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Property {
    pub name: String,
    /// Schema type reference (e.g. "string", "#/types/aws:s3/BucketAcl:BucketAcl")
    pub type_name: Option<String>,
    pub secret: bool,
    /// Value pinned by the provider; must be sent verbatim on registration
    pub const_value: Option<serde_json::Value>,
    pub description: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Property {
            name: name.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// RESOURCE
// =============================================================================

/// A resource definition as found in a package schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSpec {
    /// Canonical type token
    pub token: String,
    pub is_component: bool,
    pub input_properties: Vec<Property>,
    /// Output properties, including those with constant values
    pub properties: Vec<Property>,
    pub description: Option<String>,
}

impl ResourceSpec {
    pub fn new(token: impl Into<String>) -> Self {
        ResourceSpec {
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn input_property(&self, name: &str) -> Option<&Property> {
        self.input_properties.iter().find(|p| p.name == name)
    }
}

/// Type hint for a resolved resource: its canonical token plus definition
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceType {
    pub token: String,
    pub resource: Arc<ResourceSpec>,
}

// =============================================================================
// FUNCTION
// =============================================================================

/// A function (invoke) definition as found in a package schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionSpec {
    /// Canonical type token
    pub token: String,
    pub inputs: Vec<Property>,
    pub outputs: Vec<Property>,
    pub description: Option<String>,
}

impl FunctionSpec {
    pub fn new(token: impl Into<String>) -> Self {
        FunctionSpec {
            token: token.into(),
            ..Default::default()
        }
    }
}
