//! End-to-end resolution of user type tokens
//!
//! Ties the gate, the loader and the package façade together the way the
//! evaluator uses them for every resource and invoke it meets.

use crate::compat;
use crate::errors::ResolveError;
use crate::loader::{load_package, PackageDescriptors, PackageLoader};
use crate::package::Package;
use crate::token::{FunctionTypeToken, ResourceTypeToken};
use pkgbind_schema::CancellationToken;
use semver::Version;
use std::sync::Arc;
use tracing::debug;

/// Package and canonical token for a resource type
///
/// Policy-rejected tokens fail before anything is loaded.
pub fn resolve_resource(
    cancel: &CancellationToken,
    loader: &dyn PackageLoader,
    descriptors: &PackageDescriptors,
    type_name: &str,
    version: Option<&Version>,
) -> Result<(Arc<dyn Package>, ResourceTypeToken), ResolveError> {
    compat::check_resource_token(type_name)?;
    let package = load_package(cancel, loader, descriptors, type_name, version)?;
    compat::check_package_version(type_name, package.as_ref(), version)?;

    let token = package.resolve_resource(type_name)?;
    debug!("Resolved resource {} to {}", type_name, token);
    Ok((package, token))
}

/// Package and canonical token for a function
pub fn resolve_function(
    cancel: &CancellationToken,
    loader: &dyn PackageLoader,
    descriptors: &PackageDescriptors,
    type_name: &str,
    version: Option<&Version>,
) -> Result<(Arc<dyn Package>, FunctionTypeToken), ResolveError> {
    let package = load_package(cancel, loader, descriptors, type_name, version)?;
    let token = package.resolve_function(type_name)?;
    debug!("Resolved function {} to {}", type_name, token);
    Ok((package, token))
}

#[cfg(test)]
mod tests {
    use crate::loader::SchemaPackageLoader;
    use crate::resolve::*;
    use pkgbind_schema::{FunctionSpec, InMemoryReferenceLoader, PackageSpec, ResourceSpec};

    fn loader() -> SchemaPackageLoader {
        SchemaPackageLoader::from_schema_loader(
            InMemoryReferenceLoader::new()
                .with_package(
                    PackageSpec::new("aws", Some(Version::new(6, 0, 0)))
                        .with_resource(ResourceSpec::new("aws:s3/bucket:Bucket"))
                        .with_function(FunctionSpec::new("aws:index/getRegion:getRegion")),
                )
                .with_package(
                    PackageSpec::new("kubernetes", Some(Version::new(4, 0, 0)))
                        .with_resource(ResourceSpec::new("kubernetes:helm.sh/v3:Chart")),
                ),
        )
    }

    #[test]
    fn test_resolve_resource_and_function() {
        let loader = loader();
        let cancel = CancellationToken::new();
        let descriptors = PackageDescriptors::new();

        let resource = resolve_resource(&cancel, &loader, &descriptors, "aws:s3:Bucket", None);
        assert!(resource.is_ok_and(|(p, t)| p.name() == "aws" && t == "aws:s3/bucket:Bucket"));

        let function = resolve_function(&cancel, &loader, &descriptors, "aws:getRegion", None);
        assert!(function.is_ok_and(|(_, t)| t == "aws:index/getRegion:getRegion"));
    }

    #[test]
    fn test_gate_runs_before_load() {
        let loader = loader();
        let result = resolve_resource(
            &CancellationToken::new(),
            &loader,
            &PackageDescriptors::new(),
            "kubernetes:helm.sh/v3:Chart",
            None,
        );
        assert!(matches!(result, Err(ResolveError::SupersededResource { .. })));
        assert_eq!(loader.cached_packages(), 0);
    }

    #[test]
    fn test_unknown_package_is_a_load_error() {
        let loader = loader();
        let result = resolve_function(
            &CancellationToken::new(),
            &loader,
            &PackageDescriptors::new(),
            "gcp:compute:getZones",
            None,
        );
        assert!(matches!(result, Err(ResolveError::Load { ref package, .. }) if package == "gcp"));
    }
}
