//! YAML front-end
//!
//! Builds the template AST from a YAML document. Only the parts relevant to
//! package resolution are modeled; unknown top-level sections are ignored.

use crate::ast::{
    Expr, InvokeExpr, InvokeOptions, NamedExpr, ObjectProperty, ResourceDecl, ResourceEntry,
    ResourceOptions, StringExpr, Syntax, Template,
};
use crate::errors::TemplateError;
use crate::packages::PackageDecl;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

const INVOKE_KEY: &str = "fn::invoke";

impl Template {
    /// Parse a template from YAML source
    pub fn from_yaml(source: &str) -> Result<Self, TemplateError> {
        let document: Value = serde_yaml::from_str(source)?;
        let root = Syntax::default();

        let Value::Mapping(map) = untag(document) else {
            return Err(TemplateError::invalid("", "template must be a mapping"));
        };

        let mut template = Template::default();
        for (key, value) in map {
            let Some(section) = key_string(&key) else {
                continue;
            };
            let syntax = root.child(&section);
            match section.as_str() {
                "name" => template.name = scalar_string(&value),
                "packages" => template.packages = parse_packages(untag(value), &syntax)?,
                "resources" => template.resources = parse_resources(untag(value), &syntax)?,
                "variables" => template.variables = parse_named(untag(value), &syntax)?,
                "outputs" => template.outputs = parse_named(untag(value), &syntax)?,
                other => debug!("Ignoring template section '{}'", other),
            }
        }

        debug!(
            "Parsed template: {} packages, {} resources, {} variables, {} outputs",
            template.packages.len(),
            template.resources.len(),
            template.variables.len(),
            template.outputs.len()
        );
        Ok(template)
    }

    /// Load and parse a template file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }
}

// =============================================================================
// PACKAGES
// =============================================================================

fn parse_packages(value: Value, syntax: &Syntax) -> Result<Vec<PackageDecl>, TemplateError> {
    match value {
        Value::Null => Ok(Vec::new()),
        // packages: ["aws@6.0.0", {name: random, version: 4.16.0}]
        Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| parse_package(None, untag(item), &syntax.child(&idx.to_string())))
            .collect(),
        // packages: {aws: 6.0.0, random: {version: 4.16.0}}
        Value::Mapping(map) => map
            .into_iter()
            .map(|(key, item)| {
                let name = key_string(&key)
                    .ok_or_else(|| TemplateError::invalid(&syntax.path, "package names must be strings"))?;
                let item_syntax = syntax.child(&name);
                parse_package(Some(name), untag(item), &item_syntax)
            })
            .collect(),
        _ => Err(TemplateError::invalid(
            &syntax.path,
            "packages must be a list or a mapping",
        )),
    }
}

fn parse_package(
    name: Option<String>,
    value: Value,
    syntax: &Syntax,
) -> Result<PackageDecl, TemplateError> {
    match (name, value) {
        (Some(name), Value::Null) => Ok(PackageDecl::new(name)),
        (Some(name), Value::String(version)) => Ok(PackageDecl {
            name,
            version,
            ..Default::default()
        }),
        (None, Value::String(spec)) => Ok(PackageDecl::from_shorthand(&spec)),
        (name, Value::Mapping(mut map)) => {
            if let Some(name) = name {
                let key = Value::String("name".to_string());
                if !map.contains_key(&key) {
                    map.insert(key, Value::String(name));
                }
            }
            serde_yaml::from_value(Value::Mapping(map))
                .map_err(|e| TemplateError::invalid(&syntax.path, e.to_string()))
        }
        _ => Err(TemplateError::invalid(
            &syntax.path,
            "package must be a version string or a mapping",
        )),
    }
}

// =============================================================================
// RESOURCES
// =============================================================================

fn parse_resources(value: Value, syntax: &Syntax) -> Result<Vec<ResourceEntry>, TemplateError> {
    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(map) => map,
        _ => return Err(TemplateError::invalid(&syntax.path, "resources must be a mapping")),
    };

    let mut resources = Vec::with_capacity(map.len());
    for (key, value) in map {
        let name = key_string(&key)
            .ok_or_else(|| TemplateError::invalid(&syntax.path, "resource names must be strings"))?;
        let res_syntax = syntax.child(&name);
        let Value::Mapping(body) = untag(value) else {
            return Err(TemplateError::invalid(&res_syntax.path, "resource must be a mapping"));
        };

        let type_token = optional_string(&body, "type", &res_syntax)?;
        let properties = match body.get("properties").cloned().map(untag) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Mapping(props)) => parse_object(props, &res_syntax.child("properties"))?,
            Some(_) => {
                return Err(TemplateError::invalid(
                    &res_syntax.child("properties").path,
                    "properties must be a mapping",
                ))
            }
        };
        let options = match body.get("options").cloned().map(untag) {
            None | Some(Value::Null) => ResourceOptions::default(),
            Some(Value::Mapping(opts)) => {
                let opts_syntax = res_syntax.child("options");
                ResourceOptions {
                    version: optional_string(&opts, "version", &opts_syntax)?,
                    plugin_download_url: optional_string(&opts, "pluginDownloadURL", &opts_syntax)?,
                }
            }
            Some(_) => {
                return Err(TemplateError::invalid(
                    &res_syntax.child("options").path,
                    "options must be a mapping",
                ))
            }
        };

        resources.push(ResourceEntry {
            key: StringExpr::new(syntax.child(&name), name),
            value: ResourceDecl {
                syntax: res_syntax,
                type_token,
                properties,
                options,
            },
        });
    }
    Ok(resources)
}

fn parse_named(value: Value, syntax: &Syntax) -> Result<Vec<NamedExpr>, TemplateError> {
    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(map) => map,
        _ => return Err(TemplateError::invalid(&syntax.path, "expected a mapping")),
    };

    let mut named = Vec::with_capacity(map.len());
    for (key, value) in map {
        let name = key_string(&key)
            .ok_or_else(|| TemplateError::invalid(&syntax.path, "names must be strings"))?;
        let item_syntax = syntax.child(&name);
        named.push(NamedExpr {
            key: StringExpr::new(item_syntax.clone(), name),
            value: parse_expr(value, &item_syntax)?,
        });
    }
    Ok(named)
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

fn parse_expr(value: Value, syntax: &Syntax) -> Result<Expr, TemplateError> {
    Ok(match untag(value) {
        Value::Null => Expr::Null(syntax.clone()),
        Value::Bool(b) => Expr::Bool(syntax.clone(), b),
        Value::Number(n) => Expr::Number(syntax.clone(), n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => Expr::String(StringExpr::new(syntax.clone(), s)),
        Value::Sequence(items) => Expr::List(
            syntax.clone(),
            items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| parse_expr(item, &syntax.child(&idx.to_string())))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(map) => {
            if map.len() == 1 {
                if let Some(body) = map.get(INVOKE_KEY) {
                    return parse_invoke(body.clone(), &syntax.child(INVOKE_KEY));
                }
            }
            Expr::Object(syntax.clone(), parse_object(map, syntax)?)
        }
        Value::Tagged(_) => Expr::Null(syntax.clone()),
    })
}

fn parse_object(map: Mapping, syntax: &Syntax) -> Result<Vec<ObjectProperty>, TemplateError> {
    map.into_iter()
        .map(|(key, value)| {
            let name = key_string(&key)
                .ok_or_else(|| TemplateError::invalid(&syntax.path, "object keys must be strings"))?;
            let prop_syntax = syntax.child(&name);
            Ok(ObjectProperty {
                key: StringExpr::new(prop_syntax.clone(), name),
                value: parse_expr(value, &prop_syntax)?,
            })
        })
        .collect()
}

fn parse_invoke(value: Value, syntax: &Syntax) -> Result<Expr, TemplateError> {
    let Value::Mapping(body) = untag(value) else {
        return Err(TemplateError::invalid(&syntax.path, "fn::invoke must be a mapping"));
    };

    let token = optional_string(&body, "function", syntax)?;
    let args = match body.get("arguments") {
        Some(args) => Some(Box::new(parse_expr(args.clone(), &syntax.child("arguments"))?)),
        None => None,
    };
    let call_opts = match body.get("options").cloned().map(untag) {
        None | Some(Value::Null) => InvokeOptions::default(),
        Some(Value::Mapping(opts)) => {
            let opts_syntax = syntax.child("options");
            InvokeOptions {
                version: optional_string(&opts, "version", &opts_syntax)?,
                plugin_download_url: optional_string(&opts, "pluginDownloadURL", &opts_syntax)?,
            }
        }
        Some(_) => {
            return Err(TemplateError::invalid(
                &syntax.child("options").path,
                "options must be a mapping",
            ))
        }
    };

    Ok(Expr::Invoke(InvokeExpr {
        syntax: syntax.clone(),
        token,
        args,
        call_opts,
    }))
}

// =============================================================================
// HELPERS
// =============================================================================

fn untag(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn key_string(key: &Value) -> Option<String> {
    scalar_string(key)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read an optional scalar field as a string expression
fn optional_string(
    map: &Mapping,
    key: &str,
    parent: &Syntax,
) -> Result<Option<StringExpr>, TemplateError> {
    let syntax = parent.child(key);
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_string(value)
            .map(|s| Some(StringExpr::new(syntax.clone(), s)))
            .ok_or_else(|| TemplateError::invalid(&syntax.path, format!("{} must be a string", key))),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::errors::TemplateError;
    use crate::packages::ParameterizationDecl;

    #[test]
    fn test_parse_resources_with_options() {
        let source = r#"
name: demo
resources:
  bucket:
    type: aws:s3:Bucket
    options:
      version: 6.0.0
      pluginDownloadURL: https://example.com/aws
  untyped:
    properties:
      foo: bar
"#;
        let template = Template::from_yaml(source);
        assert!(template.is_ok());
        let Ok(template) = template else { return };

        assert_eq!(template.name.as_deref(), Some("demo"));
        assert_eq!(template.resources.len(), 2);

        let bucket = &template.resources[0];
        assert_eq!(bucket.key.value, "bucket");
        assert_eq!(StringExpr::value_of(bucket.value.type_token.as_ref()), "aws:s3:Bucket");
        assert!(bucket
            .value
            .options
            .version
            .as_ref()
            .is_some_and(|v| v.value == "6.0.0" && v.syntax.path == "resources.bucket.options.version"));
        assert_eq!(
            StringExpr::value_of(bucket.value.options.plugin_download_url.as_ref()),
            "https://example.com/aws"
        );

        let untyped = &template.resources[1];
        assert!(untyped.value.type_token.is_none());
        assert_eq!(untyped.value.properties.len(), 1);
    }

    #[test]
    fn test_parse_packages_mapping_and_list() {
        let mapping = r#"
packages:
  aws: 6.0.0
  random:
    version: 4.16.0
    downloadURL: https://example.com/random
  netlify:
    name: terraform-provider
    version: 0.8.0
    parameterization:
      name: netlify
      version: 0.1.0
      value: eyJ9
"#;
        let template = Template::from_yaml(mapping);
        assert!(template.is_ok());
        let Ok(template) = template else { return };
        assert_eq!(template.packages.len(), 3);
        assert_eq!(template.packages[0].name, "aws");
        assert_eq!(template.packages[0].version, "6.0.0");
        assert_eq!(template.packages[1].download_url, "https://example.com/random");
        assert_eq!(template.packages[2].name, "terraform-provider");
        assert_eq!(
            template.packages[2].parameterization,
            Some(ParameterizationDecl {
                name: "netlify".to_string(),
                version: "0.1.0".to_string(),
                value: "eyJ9".to_string(),
            })
        );

        let list = "packages:\n  - aws@6.0.0\n  - random\n";
        let template = Template::from_yaml(list);
        assert!(template.is_ok_and(|t| {
            t.packages.len() == 2 && t.packages[0].version == "6.0.0" && t.packages[1].name == "random"
        }));
    }

    #[test]
    fn test_parse_invoke_expression() {
        let source = r#"
variables:
  bucket:
    fn::invoke:
      function: aws:s3:getBucket
      arguments:
        bucket: my-bucket
      options:
        version: 6.1.0
"#;
        let template = Template::from_yaml(source);
        assert!(template.is_ok());
        let Ok(template) = template else { return };

        let Expr::Invoke(invoke) = &template.variables[0].value else {
            panic!("Expected invoke expression");
        };
        assert_eq!(StringExpr::value_of(invoke.token.as_ref()), "aws:s3:getBucket");
        assert_eq!(StringExpr::value_of(invoke.call_opts.version.as_ref()), "6.1.0");
        assert!(invoke.args.is_some());
        assert_eq!(invoke.syntax.path, "variables.bucket.fn::invoke");
    }

    #[test]
    fn test_invoke_without_function_is_kept() {
        let source = "outputs:\n  out:\n    fn::invoke:\n      arguments: {}\n";
        let template = Template::from_yaml(source);
        assert!(template.is_ok_and(|t| matches!(
            &t.outputs[0].value,
            Expr::Invoke(invoke) if invoke.token.is_none()
        )));
    }

    #[test]
    fn test_rejects_non_mapping_resource() {
        let result = Template::from_yaml("resources:\n  bucket: aws:s3:Bucket\n");
        assert!(matches!(result, Err(TemplateError::Invalid { path, .. }) if path == "resources.bucket"));
    }

    #[test]
    fn test_rejects_non_mapping_document() {
        assert!(Template::from_yaml("- a\n- b\n").is_err());
    }
}
