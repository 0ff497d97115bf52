//! Visitor-based traversal of a template
//!
//! Resources are visited in declaration order, each followed by the
//! expressions of its properties; variables and outputs come afterwards.
//! Visitors extend the shared diagnostics accumulator instead of returning
//! their own.

use crate::ast::{Expr, ResourceEntry, Template};
use crate::diagnostics::Diagnostics;
use tracing::debug;

/// Callbacks invoked while walking a template
///
/// Returning `false` skips the children of the visited node.
pub trait Visitor {
    fn visit_resource(&mut self, _entry: &ResourceEntry, _diags: &mut Diagnostics) -> bool {
        true
    }

    fn visit_expr(&mut self, _expr: &Expr, _diags: &mut Diagnostics) -> bool {
        true
    }
}

/// Walk every resource and expression of `template`
pub fn walk<V: Visitor + ?Sized>(template: &Template, visitor: &mut V) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let mut visited = 0usize;

    for entry in &template.resources {
        visited += 1;
        if !visitor.visit_resource(entry, &mut diags) {
            continue;
        }
        for prop in &entry.value.properties {
            visited += walk_expr(&prop.value, visitor, &mut diags);
        }
    }

    for named in template.variables.iter().chain(&template.outputs) {
        visited += walk_expr(&named.value, visitor, &mut diags);
    }

    debug!(
        "Walked {} template nodes, {} diagnostics",
        visited,
        diags.len()
    );
    diags
}

fn walk_expr<V: Visitor + ?Sized>(expr: &Expr, visitor: &mut V, diags: &mut Diagnostics) -> usize {
    let mut visited = 1;
    if visitor.visit_expr(expr, diags) {
        for child in expr.children() {
            visited += walk_expr(child, visitor, diags);
        }
    }
    visited
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::walker::*;

    #[derive(Default)]
    struct Recorder {
        resources: Vec<String>,
        invokes: Vec<String>,
        skip_resources: bool,
    }

    impl Visitor for Recorder {
        fn visit_resource(&mut self, entry: &ResourceEntry, _diags: &mut Diagnostics) -> bool {
            self.resources.push(entry.key.value.clone());
            !self.skip_resources
        }

        fn visit_expr(&mut self, expr: &Expr, _diags: &mut Diagnostics) -> bool {
            if let Expr::Invoke(invoke) = expr {
                self.invokes
                    .push(StringExpr::value_of(invoke.token.as_ref()).to_string());
            }
            true
        }
    }

    const TEMPLATE: &str = r#"
resources:
  bucket:
    type: aws:s3:Bucket
    properties:
      tags:
        owner:
          fn::invoke:
            function: aws:index:getCallerIdentity
  other:
    type: aws:s3:Bucket
variables:
  nested:
    - fn::invoke:
        function: random:index:getPet
        arguments:
          inner:
            fn::invoke:
              function: std:index:abs
"#;

    #[test]
    fn test_walk_visits_resources_then_nested_invokes() {
        let template = Template::from_yaml(TEMPLATE);
        assert!(template.is_ok());
        let Ok(template) = template else { return };

        let mut recorder = Recorder::default();
        let diags = walk(&template, &mut recorder);
        assert!(diags.is_empty());
        assert_eq!(recorder.resources, vec!["bucket", "other"]);
        assert_eq!(
            recorder.invokes,
            vec![
                "aws:index:getCallerIdentity",
                "random:index:getPet",
                "std:index:abs"
            ]
        );
    }

    #[test]
    fn test_walk_skips_children_when_visitor_declines() {
        let Ok(template) = Template::from_yaml(TEMPLATE) else {
            return;
        };
        let mut recorder = Recorder {
            skip_resources: true,
            ..Default::default()
        };
        walk(&template, &mut recorder);
        assert_eq!(
            recorder.invokes,
            vec!["random:index:getPet", "std:index:abs"]
        );
    }
}
