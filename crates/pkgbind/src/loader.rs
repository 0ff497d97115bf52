//! Package loading
//!
//! `SchemaPackageLoader` turns descriptors into `Package`s through a
//! `ReferenceLoader`, memoizing one package per descriptor. When built from a
//! plugin configuration it also owns the plugin host and tears it down on
//! `close`.

use crate::errors::ResolveError;
use crate::host::{LocalPluginHost, PluginHost};
use crate::package::{Package, ResourcePackage};
use crate::token;
use ahash::AHashMap;
use parking_lot::Mutex;
use pkgbind_config::PluginsConfig;
use pkgbind_schema::{CancellationToken, PackageDescriptor, ReferenceLoader};
use semver::Version;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Descriptors to load packages with, keyed by package name
pub type PackageDescriptors = AHashMap<String, PackageDescriptor>;

/// Loads packages for descriptors
pub trait PackageLoader: Send + Sync {
    fn load_package(
        &self,
        cancel: &CancellationToken,
        descriptor: &PackageDescriptor,
    ) -> Result<Arc<dyn Package>, ResolveError>;

    /// Release the plugin host, if any. Loads fail afterwards.
    fn close(&self);
}

/// `PackageLoader` over a schema reference loader
pub struct SchemaPackageLoader {
    references: Arc<dyn ReferenceLoader>,
    host: Mutex<Option<Box<dyn PluginHost>>>,
    cache: Mutex<AHashMap<PackageDescriptor, Arc<dyn Package>>>,
    closed: AtomicBool,
}

impl SchemaPackageLoader {
    /// Loader backed by a plugin host over the configured plugin directories
    pub fn new(config: &PluginsConfig) -> Result<Self, ResolveError> {
        let host = LocalPluginHost::new(config)?;
        let references = Arc::new(host.schema_loader());
        Ok(Self::build(references, Some(Box::new(host))))
    }

    /// Loader over a pre-built reference loader; there is no host to close
    pub fn from_schema_loader(references: impl ReferenceLoader + 'static) -> Self {
        Self::build(Arc::new(references), None)
    }

    fn build(references: Arc<dyn ReferenceLoader>, host: Option<Box<dyn PluginHost>>) -> Self {
        SchemaPackageLoader {
            references,
            host: Mutex::new(host),
            cache: Mutex::new(AHashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of distinct descriptors loaded so far
    pub fn cached_packages(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl PackageLoader for SchemaPackageLoader {
    fn load_package(
        &self,
        cancel: &CancellationToken,
        descriptor: &PackageDescriptor,
    ) -> Result<Arc<dyn Package>, ResolveError> {
        if self.is_closed() {
            return Err(ResolveError::LoaderClosed);
        }
        if let Some(package) = self.cache.lock().get(descriptor) {
            debug!("Package cache hit for {}", descriptor);
            return Ok(Arc::clone(package));
        }

        // The lock is not held across the load; a concurrent load of the same
        // descriptor keeps whichever package landed in the cache first.
        let reference = self
            .references
            .load_package_reference(cancel, descriptor)
            .map_err(|e| ResolveError::from_load(descriptor.package_name(), e))?;
        let package: Arc<dyn Package> = Arc::new(ResourcePackage::new(reference));

        let package = Arc::clone(
            self.cache
                .lock()
                .entry(descriptor.clone())
                .or_insert(package),
        );
        info!("Loaded package {}", descriptor);
        Ok(package)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(host) = self.host.lock().take() {
            host.close();
        }
        let dropped = {
            let mut cache = self.cache.lock();
            let len = cache.len();
            cache.clear();
            len
        };
        debug!("Package loader closed, released {} packages", dropped);
    }
}

impl Drop for SchemaPackageLoader {
    fn drop(&mut self) {
        self.close();
    }
}

/// Load the package owning `type_name`
///
/// The descriptor comes from `descriptors` when the package is listed there,
/// otherwise a bare one is synthesized. An explicit `version` always replaces
/// the descriptor's version.
pub fn load_package(
    cancel: &CancellationToken,
    loader: &dyn PackageLoader,
    descriptors: &PackageDescriptors,
    type_name: &str,
    version: Option<&Version>,
) -> Result<Arc<dyn Package>, ResolveError> {
    token::split_token(type_name)?;
    let pkg_name = token::resolve_pkg_name(type_name);

    let mut descriptor = match descriptors.get(pkg_name) {
        Some(descriptor) => descriptor.clone(),
        None => PackageDescriptor::new(pkg_name, version.cloned()),
    };
    if let Some(version) = version {
        descriptor.version = Some(version.clone());
    }

    debug!("Loading {} for {}", descriptor, type_name);
    loader.load_package(cancel, &descriptor)
}
