//! Compatibility gate for resource types
//!
//! A fixed policy table of resource tokens this front-end refuses outright,
//! refuses in favour of a replacement, or accepts only from recent enough
//! package versions. Tokens are matched exactly as the user wrote them.

use crate::errors::ResolveError;
use crate::package::Package;
use semver::Version;
use tracing::warn;

const KUBERNETES_YAML_ISSUE: &str = "https://github.com/pulumi/pulumi-kubernetes/issues/1971";
const HELM_RELEASE_DOCS: &str =
    "https://www.pulumi.com/registry/packages/kubernetes/api-docs/helm/v3/release/";
const DOCKER_IMAGE_ISSUE: &str = "https://github.com/pulumi/pulumi-yaml/issues/421";

/// What the gate does with a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Never supported in templates
    Unsupported { issue: &'static str },
    /// Replaced by another resource
    Superseded {
        kind: &'static str,
        alternative: &'static str,
        link: &'static str,
    },
    /// Supported from the given major version of the package onwards
    MinimumMajor {
        kind: &'static str,
        minimum_major: u64,
        issue: &'static str,
    },
}

const HELM_CHART: Policy = Policy::Superseded {
    kind: "Helm Chart",
    alternative: "Helm Release",
    link: HELM_RELEASE_DOCS,
};

const DOCKER_IMAGE: Policy = Policy::MinimumMajor {
    kind: "Docker Image",
    minimum_major: 4,
    issue: DOCKER_IMAGE_ISSUE,
};

static POLICIES: &[(&str, Policy)] = &[
    (
        "kubernetes:kustomize:Directory",
        Policy::Unsupported {
            issue: KUBERNETES_YAML_ISSUE,
        },
    ),
    (
        "kubernetes:yaml:ConfigFile",
        Policy::Unsupported {
            issue: KUBERNETES_YAML_ISSUE,
        },
    ),
    (
        "kubernetes:yaml:ConfigGroup",
        Policy::Unsupported {
            issue: KUBERNETES_YAML_ISSUE,
        },
    ),
    ("kubernetes:helm.sh/v2:Chart", HELM_CHART),
    ("kubernetes:helm.sh/v3:Chart", HELM_CHART),
    ("docker:image:Image", DOCKER_IMAGE),
    ("docker:Image", DOCKER_IMAGE),
];

/// Policy applying to a user token, if any
pub fn policy_for(type_name: &str) -> Option<Policy> {
    POLICIES
        .iter()
        .find(|(token, _)| *token == type_name)
        .map(|(_, policy)| *policy)
}

/// Checks that can run before the package is loaded
pub fn check_resource_token(type_name: &str) -> Result<(), ResolveError> {
    let err = match policy_for(type_name) {
        Some(Policy::Unsupported { issue }) => ResolveError::UnsupportedResource {
            token: type_name.to_string(),
            issue,
        },
        Some(Policy::Superseded {
            kind,
            alternative,
            link,
        }) => ResolveError::SupersededResource {
            token: type_name.to_string(),
            kind,
            alternative,
            link,
        },
        Some(Policy::MinimumMajor { .. }) | None => return Ok(()),
    };
    warn!("Rejected resource type {}", type_name);
    Err(err)
}

/// Checks that need the loaded package
///
/// `requested` is the version override the package was loaded with. Asking for
/// a supported version and getting an unsupported one back means the override
/// was not honoured, which is reported separately.
pub fn check_package_version(
    type_name: &str,
    package: &dyn Package,
    requested: Option<&Version>,
) -> Result<(), ResolveError> {
    let Some(Policy::MinimumMajor {
        kind,
        minimum_major,
        issue,
    }) = policy_for(type_name)
    else {
        return Ok(());
    };

    if package.version().is_some_and(|v| v.major >= minimum_major) {
        return Ok(());
    }
    if let Some(requested) = requested.filter(|v| v.major >= minimum_major) {
        return Err(ResolveError::VersionOverrideIgnored {
            package: package.name().to_string(),
            requested: requested.clone(),
        });
    }

    warn!(
        "Rejected {} from {} {:?}",
        type_name,
        package.name(),
        package.version().map(ToString::to_string)
    );
    Err(ResolveError::IncompatibleVersion {
        token: type_name.to_string(),
        kind,
        minimum_major,
        issue,
    })
}
