//! Package descriptors
//!
//! A descriptor is the identity under which a package schema is fetched. Two
//! descriptors are equivalent iff name, version, download URL and
//! parameterization all match, which is what the derived `Eq`/`Hash` give us.

use semver::Version;
use std::fmt;

/// Identity of a package as requested from a schema loader
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PackageDescriptor {
    /// Name of the plugin serving the package
    pub name: String,
    pub version: Option<Version>,
    pub download_url: Option<String>,
    /// Set when one plugin binary serves several logical packages
    pub parameterization: Option<ParameterizationDescriptor>,
}

/// Secondary identity used by parameterized plugins
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterizationDescriptor {
    pub name: String,
    pub version: Version,
    /// Opaque parameter blob handed to the plugin
    pub value: Vec<u8>,
}

impl PackageDescriptor {
    /// Minimal descriptor carrying only a name and an optional version
    pub fn new(name: impl Into<String>, version: Option<Version>) -> Self {
        PackageDescriptor {
            name: name.into(),
            version,
            download_url: None,
            parameterization: None,
        }
    }

    /// Name of the logical package this descriptor produces
    pub fn package_name(&self) -> &str {
        self.parameterization
            .as_ref()
            .map_or(self.name.as_str(), |p| p.name.as_str())
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{}", version)?;
        }
        if let Some(param) = &self.parameterization {
            write!(f, " ({}@{})", param.name, param.version)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::descriptor::*;
    use std::collections::HashSet;

    #[test]
    fn test_display() {
        let desc = PackageDescriptor::new("aws", Some(Version::new(6, 0, 0)));
        assert_eq!(desc.to_string(), "aws@6.0.0");
        assert_eq!(PackageDescriptor::new("random", None).to_string(), "random");
    }

    #[test]
    fn test_package_name_prefers_parameterization() {
        let desc = PackageDescriptor {
            name: "terraform-provider".to_string(),
            version: Some(Version::new(0, 8, 0)),
            download_url: None,
            parameterization: Some(ParameterizationDescriptor {
                name: "netlify".to_string(),
                version: Version::new(0, 1, 0),
                value: Vec::new(),
            }),
        };
        assert_eq!(desc.package_name(), "netlify");
        assert_eq!(desc.to_string(), "terraform-provider@0.8.0 (netlify@0.1.0)");
    }

    #[test]
    fn test_equivalence_covers_every_field() {
        let base = PackageDescriptor::new("aws", Some(Version::new(6, 0, 0)));
        let mut with_url = base.clone();
        with_url.download_url = Some("https://example.com/aws".to_string());

        let mut set = HashSet::new();
        set.insert(base.clone());
        set.insert(base.clone());
        set.insert(with_url);
        assert_eq!(set.len(), 2);
    }
}
