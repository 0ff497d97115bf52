//! Package declarations
//!
//! The same shape is used for entries of a template's `packages` section and
//! for the reconciled list produced by the reference scanner. Empty strings
//! mean "unspecified".

use serde::{Deserialize, Serialize};

/// A package a template depends on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDecl {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(rename = "downloadURL", default)]
    pub download_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameterization: Option<ParameterizationDecl>,
}

/// Parameterization of a package served by a shared plugin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterizationDecl {
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Base64-encoded parameter value
    #[serde(default)]
    pub value: String,
}

impl PackageDecl {
    pub fn new(name: impl Into<String>) -> Self {
        PackageDecl {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse the `name` or `name@version` shorthand
    pub fn from_shorthand(spec: &str) -> Self {
        match spec.split_once('@') {
            Some((name, version)) => PackageDecl {
                name: name.to_string(),
                version: version.to_string(),
                ..Default::default()
            },
            None => PackageDecl::new(spec),
        }
    }

    /// Name and version the package is known by inside the template
    ///
    /// For parameterized packages this is the parameterization's identity,
    /// not the plugin's.
    pub fn effective_identity(&self) -> (&str, &str) {
        match &self.parameterization {
            Some(param) => (&param.name, &param.version),
            None => (&self.name, &self.version),
        }
    }
}
