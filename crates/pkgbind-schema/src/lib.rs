//! Package schema model for pkgbind
//!
//! This crate holds the types shared between the package resolution core and
//! whatever produces package schemas:
//! - Descriptors identifying a package (name, version, download URL, parameterization)
//! - Resource, function and property entries as exposed by a schema
//! - The `PackageReference` and `ReferenceLoader` seams
//! - An in-memory `PackageSpec` reference decodable from schema JSON

pub mod cancel;
pub mod descriptor;
pub mod errors;
pub mod reference;
pub mod types;

pub use cancel::CancellationToken;
pub use descriptor::{PackageDescriptor, ParameterizationDescriptor};
pub use errors::SchemaError;
pub use reference::{
    InMemoryReferenceLoader, PackageReference, PackageSpec, ReferenceLoader, SchemaTable, Table,
};
pub use types::{FunctionSpec, Property, ResourceSpec, ResourceType};

// Re-export semver so downstream crates agree on the version type
pub use semver;
