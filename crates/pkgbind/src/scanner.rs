//! Reference scanner
//!
//! Collects every provider package a template depends on, both declared in its
//! `packages` section and implied by resource and invoke type tokens, into one
//! reconciled, sorted list.

use crate::token;
use ahash::AHashMap;
use pkgbind_template::{
    walk, Diagnostic, Diagnostics, Expr, PackageDecl, ResourceEntry, StringExpr, Syntax, Template,
    Visitor,
};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use tracing::{debug, info};

/// Package implied by every program; never reported
const BUILTIN_PACKAGE: &str = "pulumi";

/// Packages referenced by `template`, sorted, plus the diagnostics found
///
/// Conflicting versions or download URLs are reported as warnings and the
/// first value seen is kept. Any error diagnostic empties the package list.
pub fn get_referenced_packages(template: &Template) -> (Vec<PackageDecl>, Diagnostics) {
    let mut collector = PackageCollector::seeded(&template.packages);
    let diags = walk(template, &mut collector);

    if diags.has_errors() {
        debug!("Template scan failed with {} diagnostics", diags.len());
        return (Vec::new(), diags);
    }

    let mut packages: Vec<PackageDecl> = collector
        .packages
        .into_iter()
        .filter(|(name, _)| name != BUILTIN_PACKAGE)
        .map(|(_, decl)| decl)
        .collect();
    packages.sort_by(compare_packages);

    info!("Template references {} packages", packages.len());
    (packages, diags)
}

/// Total order over scanner output
fn compare_packages(a: &PackageDecl, b: &PackageDecl) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| a.version.cmp(&b.version))
        .then_with(|| match (&a.parameterization, &b.parameterization) {
            (None, None) => a.download_url.cmp(&b.download_url),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(pa), Some(pb)) => pa.name.cmp(&pb.name).then_with(|| pa.version.cmp(&pb.version)),
        })
}

struct PackageCollector {
    /// Keyed by the name the package is known by inside the template
    packages: AHashMap<String, PackageDecl>,
}

impl PackageCollector {
    fn seeded(declared: &[PackageDecl]) -> Self {
        let mut packages: AHashMap<String, PackageDecl> = AHashMap::new();
        for decl in declared {
            let (name, _) = decl.effective_identity();
            match packages.get_mut(name) {
                Some(existing) => fill_blanks(existing, decl),
                None => {
                    packages.insert(name.to_string(), decl.clone());
                }
            }
        }
        PackageCollector { packages }
    }

    /// Record a type reference, reconciling with what is already known
    fn accept_type(
        &mut self,
        subject: &Syntax,
        type_name: &str,
        version: Option<&StringExpr>,
        download_url: Option<&StringExpr>,
        diags: &mut Diagnostics,
    ) {
        let pkg = token::resolve_pkg_name(type_name);
        let version_value = StringExpr::value_of(version);
        let url_value = StringExpr::value_of(download_url);

        let entry = match self.packages.entry(pkg.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(slot) => {
                debug!("Package {} referenced by {}", pkg, type_name);
                slot.insert(PackageDecl {
                    name: pkg.to_string(),
                    version: version_value.to_string(),
                    download_url: url_value.to_string(),
                    parameterization: None,
                });
                return;
            }
        };

        let entry_version = match entry.parameterization.as_mut() {
            Some(param) => &mut param.version,
            None => &mut entry.version,
        };
        if reconcile(entry_version, version_value) {
            let node = version.map_or(subject, |v| &v.syntax);
            diags.push(Diagnostic::node_warning(
                node,
                format!(
                    "Package {} already declared with a conflicting version: {}",
                    pkg, entry_version
                ),
                "",
            ));
        }
        if reconcile(&mut entry.download_url, url_value) {
            let node = download_url.map_or(subject, |u| &u.syntax);
            diags.push(Diagnostic::node_warning(
                node,
                format!(
                    "Package {} already declared with a conflicting plugin download URL: {}",
                    pkg, entry.download_url
                ),
                "",
            ));
        }
    }
}

/// Adopt `observed` into an empty `field`; true when both are set and differ
fn reconcile(field: &mut String, observed: &str) -> bool {
    if observed.is_empty() {
        return false;
    }
    if field.is_empty() {
        *field = observed.to_string();
        return false;
    }
    field.as_str() != observed
}

/// Complete a declared package with fields a later duplicate provides
fn fill_blanks(existing: &mut PackageDecl, duplicate: &PackageDecl) {
    if existing.version.is_empty() {
        existing.version.clone_from(&duplicate.version);
    }
    if existing.download_url.is_empty() {
        existing.download_url.clone_from(&duplicate.download_url);
    }
    if existing.parameterization.is_none() {
        existing.parameterization.clone_from(&duplicate.parameterization);
    }
}

impl Visitor for PackageCollector {
    fn visit_resource(&mut self, entry: &ResourceEntry, diags: &mut Diagnostics) -> bool {
        let resource = &entry.value;
        let Some(type_token) = &resource.type_token else {
            diags.push(Diagnostic::node_error(
                &entry.key.syntax,
                format!("Resource declared without a 'type': {:?}", entry.key.value),
                "",
            ));
            return true;
        };
        self.accept_type(
            &resource.syntax,
            &type_token.value,
            resource.options.version.as_ref(),
            resource.options.plugin_download_url.as_ref(),
            diags,
        );
        true
    }

    fn visit_expr(&mut self, expr: &Expr, diags: &mut Diagnostics) -> bool {
        let Expr::Invoke(invoke) = expr else {
            return true;
        };
        let Some(function) = &invoke.token else {
            diags.push(Diagnostic::node_error(
                &invoke.syntax,
                "Invoke declared without a 'function' type",
                "",
            ));
            return true;
        };
        self.accept_type(
            &invoke.syntax,
            &function.value,
            invoke.call_opts.version.as_ref(),
            invoke.call_opts.plugin_download_url.as_ref(),
            diags,
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::scanner::*;
    use pkgbind_template::{ParameterizationDecl, Severity};

    fn scan(yaml: &str) -> (Vec<PackageDecl>, Diagnostics) {
        match Template::from_yaml(yaml) {
            Ok(template) => get_referenced_packages(&template),
            Err(e) => {
                panic!("template failed to parse: {e}");
            }
        }
    }

    #[test]
    fn test_resources_and_invokes_are_collected() {
        let (packages, diags) = scan(
            r#"
resources:
  bucket:
    type: aws:s3:Bucket
    options:
      version: 6.0.0
  pet:
    type: random:RandomPet
    properties:
      prefix:
        fn::invoke:
          function: std:index:join
          options:
            pluginDownloadURL: https://example.com/std
  stack:
    type: pulumi:pulumi:StackReference
  provider:
    type: pulumi:providers:kubernetes
"#,
        );
        assert!(diags.is_empty());
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["aws", "kubernetes", "random", "std"]);
        assert_eq!(packages[0].version, "6.0.0");
        assert_eq!(packages[3].download_url, "https://example.com/std");
    }

    #[test]
    fn test_blank_fields_are_adopted() {
        let (packages, diags) = scan(
            r#"
resources:
  first:
    type: aws:s3:Bucket
  second:
    type: aws:ec2:Instance
    options:
      version: 6.1.0
      pluginDownloadURL: https://example.com/aws
"#,
        );
        assert!(diags.is_empty());
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].version, "6.1.0");
        assert_eq!(packages[0].download_url, "https://example.com/aws");
    }

    #[test]
    fn test_conflicting_download_url_is_a_warning() {
        let (packages, diags) = scan(
            r#"
resources:
  first:
    type: aws:s3:Bucket
    options:
      pluginDownloadURL: https://a.example.com
  second:
    type: aws:s3:Bucket
    options:
      pluginDownloadURL: https://b.example.com
"#,
        );
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next();
        assert!(diag.is_some_and(|d| d.severity == Severity::Warning
            && d.summary
                == "Package aws already declared with a conflicting plugin download URL: https://a.example.com"
            && d.subject.as_ref().is_some_and(|s| s.path == "resources.second.options.pluginDownloadURL")));
        assert_eq!(packages[0].download_url, "https://a.example.com");
    }

    #[test]
    fn test_declared_packages_win_over_inferred() {
        let (packages, diags) = scan(
            r#"
packages:
  aws: 6.0.0
resources:
  bucket:
    type: aws:s3:Bucket
    options:
      version: 5.0.0
"#,
        );
        assert_eq!(diags.len(), 1);
        assert!(!diags.has_errors());
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].version, "6.0.0");
    }

    #[test]
    fn test_missing_types_are_errors_and_empty_the_list() {
        let (packages, diags) = scan(
            r#"
resources:
  untyped:
    properties:
      name: x
  bucket:
    type: aws:s3:Bucket
variables:
  bad:
    fn::invoke:
      arguments: {}
"#,
        );
        assert!(packages.is_empty());
        let summaries: Vec<&str> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec![
                "Resource declared without a 'type': \"untyped\"",
                "Invoke declared without a 'function' type",
            ]
        );
    }

    #[test]
    fn test_parameterized_packages_use_effective_identity() {
        let (packages, diags) = scan(
            r#"
packages:
  netlify:
    name: terraform-provider
    version: 0.8.0
    parameterization:
      name: netlify
      version: 0.1.0
      value: bmV0bGlmeQ==
resources:
  site:
    type: netlify:index:Site
    options:
      version: 0.2.0
"#,
        );
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "terraform-provider");
        assert!(packages[0]
            .parameterization
            .as_ref()
            .is_some_and(|p| p.name == "netlify" && p.version == "0.1.0"));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_sort_order() {
        let plain = |url: &str| PackageDecl {
            download_url: url.to_string(),
            ..PackageDecl::from_shorthand("tf@1.0.0")
        };
        let param = |name: &str, version: &str| PackageDecl {
            parameterization: Some(ParameterizationDecl {
                name: name.to_string(),
                version: version.to_string(),
                value: String::new(),
            }),
            ..PackageDecl::from_shorthand("tf@1.0.0")
        };

        let mut decls = vec![
            param("b", "1.0.0"),
            param("a", "2.0.0"),
            plain("https://z"),
            PackageDecl::from_shorthand("tf@10.0.0"),
            param("a", "1.0.0"),
            plain("https://a"),
            PackageDecl::from_shorthand("aws@9.0.0"),
        ];
        decls.sort_by(compare_packages);

        let keys: Vec<String> = decls
            .iter()
            .map(|d| match &d.parameterization {
                Some(p) => format!("{}@{}/{}@{}", d.name, d.version, p.name, p.version),
                None => format!("{}@{}{}", d.name, d.version, d.download_url),
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                "aws@9.0.0",
                "tf@1.0.0https://a",
                "tf@1.0.0https://z",
                "tf@1.0.0/a@1.0.0",
                "tf@1.0.0/a@2.0.0",
                "tf@1.0.0/b@1.0.0",
                "tf@10.0.0",
            ]
        );
    }
}
