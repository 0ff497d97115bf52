//! Local plugin host
//!
//! Serves package schemas from plugins installed on disk. Each plugin lives in
//! its own directory under one of the configured plugin directories:
//!
//! ```text
//! <plugin_dir>/
//!   resource-aws-v6.0.0/
//!     schema.json
//!   resource-terraform-provider-v0.8.0/
//!     parameterized/
//!       netlify-v0.1.0.json
//! ```
//!
//! A plugin directory without a schema is treated like a plugin that does not
//! implement schema retrieval. Plugins are never downloaded; a descriptor's
//! download URL is only logged.

use crate::errors::ResolveError;
use pkgbind_config::PluginsConfig;
use pkgbind_schema::{
    CancellationToken, PackageDescriptor, PackageReference, PackageSpec, ReferenceLoader,
    SchemaError,
};
use semver::Version;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

const PLUGIN_DIR_PREFIX: &str = "resource-";
const SCHEMA_FILE: &str = "schema.json";
const PARAMETERIZED_DIR: &str = "parameterized";

/// Owner of the plugin processes and files backing schema loads
pub trait PluginHost: Send + Sync {
    /// Release everything the host holds. Calling it again has no effect.
    fn close(&self);
}

#[derive(Debug)]
struct HostState {
    plugin_dirs: Vec<PathBuf>,
    closed: AtomicBool,
}

/// Plugin host reading pre-generated schemas from plugin directories
#[derive(Debug)]
pub struct LocalPluginHost {
    state: Arc<HostState>,
}

/// An installed plugin found in a plugin directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
    pub name: String,
    pub version: Version,
    pub path: PathBuf,
}

impl LocalPluginHost {
    pub fn new(config: &PluginsConfig) -> Result<Self, ResolveError> {
        if config.plugin_dirs.is_empty() {
            return Err(SchemaError::Invalid("no plugin directories configured".to_string()).into());
        }
        debug!("Plugin host searching {:?}", config.plugin_dirs);
        Ok(LocalPluginHost {
            state: Arc::new(HostState {
                plugin_dirs: config.plugin_dirs.clone(),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Schema loader sharing this host's lifetime
    pub fn schema_loader(&self) -> PluginSchemaLoader {
        PluginSchemaLoader {
            state: Arc::clone(&self.state),
        }
    }

    /// Every installed plugin, in plugin directory order
    pub fn installed_plugins(&self) -> Vec<InstalledPlugin> {
        self.state.installed_plugins()
    }
}

impl PluginHost for LocalPluginHost {
    fn close(&self) {
        if !self.state.closed.swap(true, Ordering::SeqCst) {
            info!("Plugin host closed");
        }
    }
}

impl HostState {
    fn installed_plugins(&self) -> Vec<InstalledPlugin> {
        let mut plugins = Vec::new();
        for dir in &self.plugin_dirs {
            if !dir.is_dir() {
                debug!("Skipping missing plugin directory {}", dir.display());
                continue;
            }
            plugins.extend(
                WalkDir::new(dir)
                    .min_depth(1)
                    .max_depth(1)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_dir())
                    .filter_map(|e| parse_plugin_dir(&e)),
            );
        }
        plugins
    }

    /// Plugin serving `name`: the requested version, or the highest installed
    fn find_plugin(&self, name: &str, version: Option<&Version>) -> Option<InstalledPlugin> {
        let mut found: Option<InstalledPlugin> = None;
        for plugin in self.installed_plugins().into_iter().filter(|p| p.name == name) {
            match version {
                Some(v) if &plugin.version == v => return Some(plugin),
                Some(_) => {}
                None => {
                    if found.as_ref().map_or(true, |f| plugin.version > f.version) {
                        found = Some(plugin);
                    }
                }
            }
        }
        found
    }
}

/// Parse `resource-<name>-v<version>` directory names
fn parse_plugin_dir(entry: &DirEntry) -> Option<InstalledPlugin> {
    let file_name = entry.file_name().to_str()?;
    let rest = file_name.strip_prefix(PLUGIN_DIR_PREFIX)?;
    let (name, version) = rest.rsplit_once("-v")?;
    if name.is_empty() {
        return None;
    }
    let Ok(version) = Version::parse(version) else {
        debug!("Ignoring plugin directory with invalid version: {}", file_name);
        return None;
    };
    Some(InstalledPlugin {
        name: name.to_string(),
        version,
        path: entry.path().to_path_buf(),
    })
}

/// `ReferenceLoader` reading schemas through a `LocalPluginHost`
#[derive(Debug, Clone)]
pub struct PluginSchemaLoader {
    state: Arc<HostState>,
}

impl PluginSchemaLoader {
    fn schema_path(plugin: &InstalledPlugin, descriptor: &PackageDescriptor) -> PathBuf {
        match &descriptor.parameterization {
            Some(param) => plugin
                .path
                .join(PARAMETERIZED_DIR)
                .join(format!("{}-v{}.json", param.name, param.version)),
            None => plugin.path.join(SCHEMA_FILE),
        }
    }

    fn read_schema(path: &Path) -> Result<PackageSpec, SchemaError> {
        let file = File::open(path)?;
        PackageSpec::from_reader(BufReader::new(file))
    }
}

impl ReferenceLoader for PluginSchemaLoader {
    fn load_package_reference(
        &self,
        cancel: &CancellationToken,
        descriptor: &PackageDescriptor,
    ) -> Result<Arc<dyn PackageReference>, SchemaError> {
        cancel.check()?;
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(SchemaError::HostClosed);
        }

        if let Some(url) = &descriptor.download_url {
            debug!("Not downloading {} from {}; using installed plugins", descriptor, url);
        }

        let plugin = self
            .state
            .find_plugin(&descriptor.name, descriptor.version.as_ref())
            .ok_or_else(|| SchemaError::PluginNotFound(descriptor.to_string()))?;

        let path = Self::schema_path(&plugin, descriptor);
        if !path.is_file() {
            debug!("Plugin {} has no schema at {}", plugin.name, path.display());
            return Err(SchemaError::GetSchemaNotImplemented);
        }

        cancel.check()?;
        let spec = Self::read_schema(&path)?;

        let expected = descriptor.package_name();
        if spec.name() != expected {
            return Err(SchemaError::Invalid(format!(
                "schema at {} describes package '{}', expected '{}'",
                path.display(),
                spec.name(),
                expected
            )));
        }

        let spec = if spec.version().is_some() {
            spec
        } else {
            let version = match &descriptor.parameterization {
                Some(param) => param.version.clone(),
                None => plugin.version.clone(),
            };
            spec.with_version(Some(version))
        };

        debug!("Loaded schema for {} from {}", descriptor, path.display());
        Ok(Arc::new(spec))
    }
}

#[cfg(test)]
mod tests {
    use crate::host::*;
    use pkgbind_schema::ParameterizationDescriptor;
    use std::fs;
    use tempfile::TempDir;

    fn install(root: &Path, dir: &str, schema: Option<&str>) {
        let plugin = root.join(dir);
        assert!(fs::create_dir_all(&plugin).is_ok());
        if let Some(schema) = schema {
            assert!(fs::write(plugin.join(SCHEMA_FILE), schema).is_ok());
        }
    }

    fn host(root: &Path) -> Option<LocalPluginHost> {
        LocalPluginHost::new(&PluginsConfig::with_dirs([root])).ok()
    }

    #[test]
    fn test_empty_config_is_rejected() {
        let result = LocalPluginHost::new(&PluginsConfig::with_dirs(Vec::<PathBuf>::new()));
        assert!(matches!(result, Err(ResolveError::Schema(SchemaError::Invalid(_)))));
    }

    #[test]
    fn test_installed_plugins_parse_directory_names() {
        let Ok(root) = TempDir::new() else { return };
        install(root.path(), "resource-aws-v6.0.0", None);
        install(root.path(), "resource-azure-native-v2.1.0", None);
        install(root.path(), "resource-broken-vnext", None);
        install(root.path(), "language-python-v3.0.0", None);
        let Some(host) = host(root.path()) else { return };

        let mut names: Vec<(String, String)> = host
            .installed_plugins()
            .into_iter()
            .map(|p| (p.name, p.version.to_string()))
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                ("aws".to_string(), "6.0.0".to_string()),
                ("azure-native".to_string(), "2.1.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_load_selects_highest_version() {
        let Ok(root) = TempDir::new() else { return };
        install(root.path(), "resource-random-v4.0.0", Some(r#"{"name": "random"}"#));
        install(root.path(), "resource-random-v4.16.2", Some(r#"{"name": "random"}"#));
        let Some(host) = host(root.path()) else { return };
        let loader = host.schema_loader();
        let cancel = CancellationToken::new();

        let latest = loader.load_package_reference(&cancel, &PackageDescriptor::new("random", None));
        assert!(latest.is_ok_and(|p| p.version() == Some(&Version::new(4, 16, 2))));

        let pinned = PackageDescriptor::new("random", Some(Version::new(4, 0, 0)));
        assert!(loader
            .load_package_reference(&cancel, &pinned)
            .is_ok_and(|p| p.version() == Some(&Version::new(4, 0, 0))));
    }

    #[test]
    fn test_missing_schema_is_sentinel() {
        let Ok(root) = TempDir::new() else { return };
        install(root.path(), "resource-legacy-v1.0.0", None);
        let Some(host) = host(root.path()) else { return };
        let result = host
            .schema_loader()
            .load_package_reference(&CancellationToken::new(), &PackageDescriptor::new("legacy", None));
        assert!(matches!(result, Err(SchemaError::GetSchemaNotImplemented)));
    }

    #[test]
    fn test_missing_plugin_and_closed_host() {
        let Ok(root) = TempDir::new() else { return };
        let Some(host) = host(root.path()) else { return };
        let loader = host.schema_loader();
        let cancel = CancellationToken::new();
        let descriptor = PackageDescriptor::new("gcp", None);

        assert!(matches!(
            loader.load_package_reference(&cancel, &descriptor),
            Err(SchemaError::PluginNotFound(_))
        ));

        host.close();
        host.close();
        assert!(matches!(
            loader.load_package_reference(&cancel, &descriptor),
            Err(SchemaError::HostClosed)
        ));
    }

    #[test]
    fn test_parameterized_schema() {
        let Ok(root) = TempDir::new() else { return };
        install(root.path(), "resource-terraform-provider-v0.8.0", None);
        let param_dir = root
            .path()
            .join("resource-terraform-provider-v0.8.0")
            .join(PARAMETERIZED_DIR);
        assert!(fs::create_dir_all(&param_dir).is_ok());
        assert!(fs::write(param_dir.join("netlify-v0.1.0.json"), r#"{"name": "netlify"}"#).is_ok());
        let Some(host) = host(root.path()) else { return };

        let descriptor = PackageDescriptor {
            name: "terraform-provider".to_string(),
            version: None,
            download_url: None,
            parameterization: Some(ParameterizationDescriptor {
                name: "netlify".to_string(),
                version: Version::new(0, 1, 0),
                value: b"netlify/netlify".to_vec(),
            }),
        };
        let result = host
            .schema_loader()
            .load_package_reference(&CancellationToken::new(), &descriptor);
        assert!(result.is_ok_and(|p| p.name() == "netlify" && p.version() == Some(&Version::new(0, 1, 0))));
    }

    #[test]
    fn test_schema_name_mismatch_is_invalid() {
        let Ok(root) = TempDir::new() else { return };
        install(root.path(), "resource-aws-v6.0.0", Some(r#"{"name": "gcp"}"#));
        let Some(host) = host(root.path()) else { return };
        let result = host
            .schema_loader()
            .load_package_reference(&CancellationToken::new(), &PackageDescriptor::new("aws", None));
        assert!(matches!(result, Err(SchemaError::Invalid(_))));
    }
}
