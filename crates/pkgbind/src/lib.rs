//! Package and type-token resolution
//!
//! Binds the type tokens a template mentions to provider packages and to the
//! canonical tokens the resource engine accepts:
//! - `scanner` enumerates and reconciles the packages a template depends on
//! - `compat` rejects resource types the front-end does not support
//! - `loader` loads packages through a schema reference loader and caches them
//! - `package` answers schema questions about a loaded package
//! - `token` expands abbreviated and legacy tokens into canonical ones
//!
//! ```no_run
//! use pkgbind::{get_referenced_packages, package_descriptors, resolve_resource};
//! use pkgbind::{CancellationToken, Package, PluginsConfig, SchemaPackageLoader, Template};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = Template::load("Pulumi.yaml")?;
//! let (packages, diags) = get_referenced_packages(&template);
//! for diag in &diags {
//!     eprintln!("{}", diag);
//! }
//!
//! let descriptors = package_descriptors(&packages)?;
//! let loader = SchemaPackageLoader::new(&PluginsConfig::default())?;
//! let cancel = CancellationToken::new();
//! let (package, token) = resolve_resource(&cancel, &loader, &descriptors, "aws:s3:Bucket", None)?;
//! println!("{} -> {}", package.name(), token);
//! # Ok(())
//! # }
//! ```

pub mod compat;
pub mod descriptors;
pub mod errors;
pub mod host;
pub mod loader;
pub mod package;
pub mod resolve;
pub mod scanner;
pub mod token;

pub use descriptors::package_descriptors;
pub use errors::ResolveError;
pub use host::{LocalPluginHost, PluginHost, PluginSchemaLoader};
pub use loader::{load_package, PackageDescriptors, PackageLoader, SchemaPackageLoader};
pub use package::{Package, ResourcePackage};
pub use resolve::{resolve_function, resolve_resource};
pub use scanner::get_referenced_packages;
pub use token::{FunctionTypeToken, ResourceTypeToken};

// Re-export the collaborator types callers need alongside the resolver
pub use pkgbind_config::PluginsConfig;
pub use pkgbind_schema::{CancellationToken, PackageDescriptor, SchemaError};
pub use pkgbind_template::{Diagnostics, PackageDecl, Template};
