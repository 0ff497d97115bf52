//! Descriptors from scanned package declarations

use crate::errors::ResolveError;
use crate::loader::PackageDescriptors;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pkgbind_schema::{PackageDescriptor, ParameterizationDescriptor};
use pkgbind_template::PackageDecl;
use semver::Version;

/// Build the descriptor map `load_package` consults
///
/// Parameterized declarations are keyed by the parameterization's name, since
/// that is the package their type tokens refer to.
pub fn package_descriptors(decls: &[PackageDecl]) -> Result<PackageDescriptors, ResolveError> {
    let mut descriptors = PackageDescriptors::with_capacity(decls.len());
    for decl in decls {
        let descriptor = descriptor_for(decl)?;
        descriptors.insert(descriptor.package_name().to_string(), descriptor);
    }
    Ok(descriptors)
}

fn descriptor_for(decl: &PackageDecl) -> Result<PackageDescriptor, ResolveError> {
    let parameterization = match &decl.parameterization {
        Some(param) => Some(ParameterizationDescriptor {
            name: param.name.clone(),
            version: parse_required(&param.name, &param.version)?,
            value: STANDARD
                .decode(&param.value)
                .map_err(|source| ResolveError::InvalidParameterization {
                    package: param.name.clone(),
                    source,
                })?,
        }),
        None => None,
    };

    Ok(PackageDescriptor {
        name: decl.name.clone(),
        version: parse_version(&decl.name, &decl.version)?,
        download_url: Some(decl.download_url.clone()).filter(|url| !url.is_empty()),
        parameterization,
    })
}

fn parse_version(package: &str, version: &str) -> Result<Option<Version>, ResolveError> {
    if version.is_empty() {
        return Ok(None);
    }
    parse_required(package, version).map(Some)
}

/// Parameterized packages always carry a version
fn parse_required(package: &str, version: &str) -> Result<Version, ResolveError> {
    Version::parse(version).map_err(|source| ResolveError::InvalidVersion {
        package: package.to_string(),
        version: version.to_string(),
        source,
    })
}
