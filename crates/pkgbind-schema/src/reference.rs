//! Package references and the loaders that produce them
//!
//! A `PackageReference` is an immutable snapshot of one package schema. The
//! resolution core only ever queries it by token, so the tables are exposed as
//! `SchemaTable` lookups rather than as concrete maps.

use crate::cancel::CancellationToken;
use crate::descriptor::PackageDescriptor;
use crate::errors::SchemaError;
use crate::types::{FunctionSpec, Property, ResourceSpec};
use ahash::AHashMap;
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

/// Lookup of schema entries by canonical token
pub trait SchemaTable<T>: Send + Sync {
    /// `Ok(None)` when the token is not part of the table
    fn get(&self, token: &str) -> Result<Option<Arc<T>>, SchemaError>;
}

/// A loaded package schema
pub trait PackageReference: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn version(&self) -> Option<&Version>;
    fn resources(&self) -> &dyn SchemaTable<ResourceSpec>;
    fn functions(&self) -> &dyn SchemaTable<FunctionSpec>;
    /// Definition of the package's provider resource (`pulumi:providers:<name>`)
    fn provider(&self) -> Result<Arc<ResourceSpec>, SchemaError>;
}

/// Produces package references for descriptors
///
/// Implementations may block (spawning a plugin, reading from disk); they must
/// poll the cancellation token and are expected to be internally synchronized.
pub trait ReferenceLoader: Send + Sync {
    fn load_package_reference(
        &self,
        cancel: &CancellationToken,
        descriptor: &PackageDescriptor,
    ) -> Result<Arc<dyn PackageReference>, SchemaError>;
}

// =============================================================================
// TABLE - Hash-indexed schema entries
// =============================================================================

/// In-memory schema table keyed by canonical token
#[derive(Debug, Clone)]
pub struct Table<T> {
    entries: AHashMap<String, Arc<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table {
            entries: AHashMap::new(),
        }
    }
}

impl<T> Table<T> {
    pub fn insert(&mut self, token: impl Into<String>, entry: T) {
        self.entries.insert(token.into(), Arc::new(entry));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokens in sorted order
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.entries.keys().map(|k| k.as_str()).collect();
        tokens.sort_unstable();
        tokens
    }
}

impl<T: Send + Sync> SchemaTable<T> for Table<T> {
    fn get(&self, token: &str) -> Result<Option<Arc<T>>, SchemaError> {
        Ok(self.entries.get(token).cloned())
    }
}

// =============================================================================
// PACKAGE SPEC - In-memory package reference
// =============================================================================

/// A fully materialized package schema
#[derive(Debug, Clone)]
pub struct PackageSpec {
    name: String,
    version: Option<Version>,
    provider: Arc<ResourceSpec>,
    resources: Table<ResourceSpec>,
    functions: Table<FunctionSpec>,
}

impl PackageSpec {
    /// Empty package with a bare provider definition
    pub fn new(name: impl Into<String>, version: Option<Version>) -> Self {
        let name = name.into();
        let provider = ResourceSpec::new(format!("pulumi:providers:{}", name));
        PackageSpec {
            name,
            version,
            provider: Arc::new(provider),
            resources: Table::default(),
            functions: Table::default(),
        }
    }

    pub fn with_provider(mut self, mut provider: ResourceSpec) -> Self {
        provider.token = format!("pulumi:providers:{}", self.name);
        self.provider = Arc::new(provider);
        self
    }

    pub fn with_version(mut self, version: Option<Version>) -> Self {
        self.version = version;
        self
    }

    pub fn with_resource(mut self, resource: ResourceSpec) -> Self {
        self.resources.insert(resource.token.clone(), resource);
        self
    }

    pub fn with_function(mut self, function: FunctionSpec) -> Self {
        self.functions.insert(function.token.clone(), function);
        self
    }

    pub fn resource_table(&self) -> &Table<ResourceSpec> {
        &self.resources
    }

    pub fn function_table(&self) -> &Table<FunctionSpec> {
        &self.functions
    }

    /// Decode a package from its schema JSON
    pub fn from_json(content: &str) -> Result<Self, SchemaError> {
        let raw: RawPackage = serde_json::from_str(content)?;
        raw.into_spec()
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, SchemaError> {
        let raw: RawPackage = serde_json::from_reader(reader)?;
        raw.into_spec()
    }
}

impl PackageReference for PackageSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    fn resources(&self) -> &dyn SchemaTable<ResourceSpec> {
        &self.resources
    }

    fn functions(&self) -> &dyn SchemaTable<FunctionSpec> {
        &self.functions
    }

    fn provider(&self) -> Result<Arc<ResourceSpec>, SchemaError> {
        Ok(self.provider.clone())
    }
}

// =============================================================================
// SCHEMA JSON - Wire shapes, converted into the types above
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPackage {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    provider: Option<RawResource>,
    #[serde(default)]
    resources: BTreeMap<String, RawResource>,
    #[serde(default)]
    functions: BTreeMap<String, RawFunction>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    #[serde(default)]
    is_component: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    input_properties: BTreeMap<String, RawProperty>,
    #[serde(default)]
    properties: BTreeMap<String, RawProperty>,
}

#[derive(Deserialize, Default)]
struct RawFunction {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    inputs: Option<RawObject>,
    #[serde(default)]
    outputs: Option<RawObject>,
}

#[derive(Deserialize, Default)]
struct RawObject {
    #[serde(default)]
    properties: BTreeMap<String, RawProperty>,
}

#[derive(Deserialize, Default)]
struct RawProperty {
    #[serde(rename = "type", default)]
    type_name: Option<String>,
    #[serde(rename = "$ref", default)]
    reference: Option<String>,
    #[serde(default)]
    secret: bool,
    #[serde(rename = "const", default)]
    const_value: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
}

impl RawPackage {
    fn into_spec(self) -> Result<PackageSpec, SchemaError> {
        let version = match self.version.as_deref() {
            Some(v) => Some(Version::parse(v).map_err(|e| {
                SchemaError::Invalid(format!(
                    "package '{}' has invalid version {:?}: {}",
                    self.name, v, e
                ))
            })?),
            None => None,
        };

        let mut spec = PackageSpec::new(self.name, version);
        if let Some(provider) = self.provider {
            spec = spec.with_provider(provider.into_resource(String::new()));
        }
        for (token, resource) in self.resources {
            let resource = resource.into_resource(token);
            spec.resources.insert(resource.token.clone(), resource);
        }
        for (token, function) in self.functions {
            let function = function.into_function(token);
            spec.functions.insert(function.token.clone(), function);
        }

        debug!(
            "Decoded schema for {}: {} resources, {} functions",
            spec.name,
            spec.resources.len(),
            spec.functions.len()
        );
        Ok(spec)
    }
}

impl RawResource {
    fn into_resource(self, token: String) -> ResourceSpec {
        ResourceSpec {
            token,
            is_component: self.is_component,
            input_properties: into_properties(self.input_properties),
            properties: into_properties(self.properties),
            description: self.description,
        }
    }
}

impl RawFunction {
    fn into_function(self, token: String) -> FunctionSpec {
        FunctionSpec {
            token,
            inputs: self.inputs.map(|o| into_properties(o.properties)).unwrap_or_default(),
            outputs: self.outputs.map(|o| into_properties(o.properties)).unwrap_or_default(),
            description: self.description,
        }
    }
}

fn into_properties(raw: BTreeMap<String, RawProperty>) -> Vec<Property> {
    raw.into_iter()
        .map(|(name, prop)| Property {
            name,
            type_name: prop.type_name.or(prop.reference),
            secret: prop.secret,
            const_value: prop.const_value,
            description: prop.description,
        })
        .collect()
}

// =============================================================================
// IN-MEMORY LOADER
// =============================================================================

/// Reference loader over a fixed set of packages
///
/// Useful wherever schemas are already at hand, most notably in tests.
#[derive(Debug, Default)]
pub struct InMemoryReferenceLoader {
    packages: Vec<Arc<dyn PackageReference>>,
}

impl InMemoryReferenceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, package: impl PackageReference + 'static) -> Self {
        self.insert(package);
        self
    }

    pub fn insert(&mut self, package: impl PackageReference + 'static) {
        self.packages.push(Arc::new(package));
    }
}

impl ReferenceLoader for InMemoryReferenceLoader {
    fn load_package_reference(
        &self,
        cancel: &CancellationToken,
        descriptor: &PackageDescriptor,
    ) -> Result<Arc<dyn PackageReference>, SchemaError> {
        cancel.check()?;

        let name = descriptor.package_name();
        let requested = match &descriptor.parameterization {
            Some(param) => Some(&param.version),
            None => descriptor.version.as_ref(),
        };

        let mut candidates = self.packages.iter().filter(|p| p.name() == name);
        let found = match requested {
            Some(version) => candidates.find(|p| p.version() == Some(version)),
            // Highest known version wins when nothing was pinned
            None => candidates.max_by(|a, b| a.version().cmp(&b.version())),
        };

        found
            .cloned()
            .ok_or_else(|| SchemaError::PluginNotFound(descriptor.to_string()))
    }
}
