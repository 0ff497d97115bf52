//! Error types for package resolution
//!
//! One variant per failure kind so callers can tell a malformed token from a
//! missing package or a policy rejection without parsing messages.

use pkgbind_schema::SchemaError;
use semver::Version;
use thiserror::Error;

/// Errors that can occur while loading packages and resolving type tokens
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid type token {0:?}")]
    InvalidTypeToken(String),

    #[error("unable to find resource type {token:?} in resource provider {package:?}")]
    UnknownResource { token: String, package: String },

    #[error("unable to find function {token:?} in resource provider {package:?}")]
    UnknownFunction { token: String, package: String },

    #[error(
        "unable to find property {property:?} on resource {resource:?} in resource provider {package:?}"
    )]
    UnknownProperty {
        property: String,
        resource: String,
        package: String,
    },

    /// The plugin does not serve schemas
    #[error("error loading schema for {package:?}: {source}")]
    SchemaUnavailable {
        package: String,
        #[source]
        source: SchemaError,
    },

    #[error("internal error loading package {package:?}: {source}")]
    Load {
        package: String,
        #[source]
        source: SchemaError,
    },

    #[error("schema lookup failed: {0}")]
    Schema(#[from] SchemaError),

    #[error("The resource type [{token}] is not supported in YAML at this time, see: {issue}")]
    UnsupportedResource { token: String, issue: &'static str },

    #[error("{kind} resources are not supported in YAML, consider using the {alternative} resource instead: {link}")]
    SupersededResource {
        token: String,
        kind: &'static str,
        alternative: &'static str,
        link: &'static str,
    },

    #[error("{kind} resources are not supported in YAML without major version >= {minimum_major}, see: {issue}")]
    IncompatibleVersion {
        token: String,
        kind: &'static str,
        minimum_major: u64,
        issue: &'static str,
    },

    /// A version override was requested but the loader returned an older package
    #[error("package {package:?} was requested at version {requested} but an incompatible version was loaded")]
    VersionOverrideIgnored { package: String, requested: Version },

    #[error("invalid version {version:?} for package {package:?}: {source}")]
    InvalidVersion {
        package: String,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid parameterization value for package {package:?}: {source}")]
    InvalidParameterization {
        package: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("package loader is closed")]
    LoaderClosed,
}

impl ResolveError {
    /// Wrap a schema loader failure with the package it was loading
    pub(crate) fn from_load(package: &str, source: SchemaError) -> Self {
        if source.is_get_schema_not_implemented() {
            ResolveError::SchemaUnavailable {
                package: package.to_string(),
                source,
            }
        } else {
            ResolveError::Load {
                package: package.to_string(),
                source,
            }
        }
    }

    /// True when the package's plugin cannot provide a schema
    pub fn is_schema_unavailable(&self) -> bool {
        matches!(self, ResolveError::SchemaUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::*;

    #[test]
    fn test_from_load_distinguishes_sentinel() {
        let err = ResolveError::from_load("aws", SchemaError::GetSchemaNotImplemented);
        assert!(err.is_schema_unavailable());
        assert_eq!(
            err.to_string(),
            "error loading schema for \"aws\": it looks like GetSchema is not implemented"
        );

        let err = ResolveError::from_load("aws", SchemaError::PluginNotFound("aws".to_string()));
        assert!(matches!(err, ResolveError::Load { ref package, .. } if package == "aws"));
        assert!(err.to_string().starts_with("internal error loading package \"aws\""));
    }

    #[test]
    fn test_unknown_property_display() {
        let err = ResolveError::UnknownProperty {
            property: "password".to_string(),
            resource: "aws:s3/bucket:Bucket".to_string(),
            package: "aws".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unable to find property \"password\" on resource \"aws:s3/bucket:Bucket\" in resource provider \"aws\""
        );
    }
}
