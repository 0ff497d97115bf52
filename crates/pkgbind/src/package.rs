//! Package façade over a loaded schema reference
//!
//! `Package` is the capability set the evaluator needs from a provider
//! package. `ResourcePackage` implements it on top of a `PackageReference`;
//! tests are free to provide their own doubles.

use crate::errors::ResolveError;
use crate::token::{self, FunctionTypeToken, ResourceTypeToken};
use pkgbind_schema::{FunctionSpec, PackageReference, ResourceSpec, ResourceType};
use semver::Version;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A provider package able to resolve and describe its types
pub trait Package: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn version(&self) -> Option<&Version>;

    /// Canonical token for a possibly abbreviated resource token
    fn resolve_resource(&self, type_name: &str) -> Result<ResourceTypeToken, ResolveError>;

    /// Canonical token for a possibly abbreviated function token
    fn resolve_function(&self, type_name: &str) -> Result<FunctionTypeToken, ResolveError>;

    fn is_component(&self, token: &ResourceTypeToken) -> Result<bool, ResolveError>;

    /// Whether the named input property of a resource is marked secret
    fn is_resource_property_secret(
        &self,
        token: &ResourceTypeToken,
        property: &str,
    ) -> Result<bool, ResolveError>;

    /// Best-effort type information; `None` on any miss or lookup failure
    fn resource_type_hint(&self, token: &ResourceTypeToken) -> Option<ResourceType>;

    fn function_type_hint(&self, token: &FunctionTypeToken) -> Option<Arc<FunctionSpec>>;

    /// Properties whose value is pinned by the schema, by property name
    fn resource_constants(&self, token: &ResourceTypeToken) -> BTreeMap<String, serde_json::Value>;
}

/// `Package` backed by a schema reference
#[derive(Debug, Clone)]
pub struct ResourcePackage {
    reference: Arc<dyn PackageReference>,
}

impl ResourcePackage {
    pub fn new(reference: Arc<dyn PackageReference>) -> Self {
        ResourcePackage { reference }
    }

    pub fn reference(&self) -> &Arc<dyn PackageReference> {
        &self.reference
    }

    fn is_own_provider(&self, type_name: &str) -> bool {
        token::is_provider_token(type_name) && token::resolve_pkg_name(type_name) == self.name()
    }

    /// Resource definition for a canonical token, provider tokens included
    fn resource_spec(&self, token: &str) -> Result<Arc<ResourceSpec>, ResolveError> {
        if self.is_own_provider(token) {
            return Ok(self.reference.provider()?);
        }
        self.reference
            .resources()
            .get(token)?
            .ok_or_else(|| ResolveError::UnknownResource {
                token: token.to_string(),
                package: self.name().to_string(),
            })
    }
}

impl Package for ResourcePackage {
    fn name(&self) -> &str {
        self.reference.name()
    }

    fn version(&self) -> Option<&Version> {
        self.reference.version()
    }

    fn resolve_resource(&self, type_name: &str) -> Result<ResourceTypeToken, ResolveError> {
        if self.is_own_provider(type_name) {
            return Ok(ResourceTypeToken::new(type_name));
        }

        let resources = self.reference.resources();
        let found = token::resolve_token(type_name, |candidate| {
            Ok(resources.get(candidate)?.map(|r| r.token.clone()))
        })?;
        found
            .map(ResourceTypeToken::new)
            .ok_or_else(|| ResolveError::UnknownResource {
                token: type_name.to_string(),
                package: self.name().to_string(),
            })
    }

    fn resolve_function(&self, type_name: &str) -> Result<FunctionTypeToken, ResolveError> {
        let functions = self.reference.functions();
        let found = token::resolve_token(type_name, |candidate| {
            Ok(functions.get(candidate)?.map(|f| f.token.clone()))
        })?;
        found
            .map(FunctionTypeToken::new)
            .ok_or_else(|| ResolveError::UnknownFunction {
                token: type_name.to_string(),
                package: self.name().to_string(),
            })
    }

    fn is_component(&self, token: &ResourceTypeToken) -> Result<bool, ResolveError> {
        Ok(self.resource_spec(token.as_str())?.is_component)
    }

    fn is_resource_property_secret(
        &self,
        token: &ResourceTypeToken,
        property: &str,
    ) -> Result<bool, ResolveError> {
        let resource = self.resource_spec(token.as_str())?;
        resource
            .input_property(property)
            .map(|p| p.secret)
            .ok_or_else(|| ResolveError::UnknownProperty {
                property: property.to_string(),
                resource: token.to_string(),
                package: self.name().to_string(),
            })
    }

    fn resource_type_hint(&self, token: &ResourceTypeToken) -> Option<ResourceType> {
        let resource = self.resource_spec(token.as_str()).ok()?;
        Some(ResourceType {
            token: token.to_string(),
            resource,
        })
    }

    fn function_type_hint(&self, token: &FunctionTypeToken) -> Option<Arc<FunctionSpec>> {
        self.reference.functions().get(token.as_str()).ok().flatten()
    }

    fn resource_constants(&self, token: &ResourceTypeToken) -> BTreeMap<String, serde_json::Value> {
        let Ok(resource) = self.resource_spec(token.as_str()) else {
            return BTreeMap::new();
        };
        resource
            .properties
            .iter()
            .filter_map(|p| p.const_value.clone().map(|v| (p.name.clone(), v)))
            .collect()
    }
}
