//! Template AST
//!
//! Every node carries a `Syntax` locating it in the source document so that
//! diagnostics can be attached to the offending node.

use crate::packages::PackageDecl;
use std::fmt;

/// Location of a node, as a dotted path from the document root
/// (e.g. `resources.bucket.options.version`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Syntax {
    pub path: String,
}

impl Syntax {
    pub fn new(path: impl Into<String>) -> Self {
        Syntax { path: path.into() }
    }

    pub(crate) fn child(&self, segment: &str) -> Syntax {
        if self.path.is_empty() {
            Syntax::new(segment)
        } else {
            Syntax::new(format!("{}.{}", self.path, segment))
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A string literal together with its location
#[derive(Debug, Clone, PartialEq)]
pub struct StringExpr {
    pub syntax: Syntax,
    pub value: String,
}

impl StringExpr {
    pub fn new(syntax: Syntax, value: impl Into<String>) -> Self {
        StringExpr {
            syntax,
            value: value.into(),
        }
    }

    /// Value of an optional string, empty when absent
    pub fn value_of(expr: Option<&StringExpr>) -> &str {
        expr.map_or("", |e| e.value.as_str())
    }
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// A parsed template document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub name: Option<String>,
    /// Explicit `packages` section, in declaration order
    pub packages: Vec<PackageDecl>,
    pub resources: Vec<ResourceEntry>,
    pub variables: Vec<NamedExpr>,
    pub outputs: Vec<NamedExpr>,
}

/// A `key: resource` entry of the `resources` section
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub key: StringExpr,
    pub value: ResourceDecl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDecl {
    pub syntax: Syntax,
    /// `None` when the resource omits its `type`
    pub type_token: Option<StringExpr>,
    pub properties: Vec<ObjectProperty>,
    pub options: ResourceOptions,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceOptions {
    pub version: Option<StringExpr>,
    pub plugin_download_url: Option<StringExpr>,
}

/// A named expression, used for variables and outputs
#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpr {
    pub key: StringExpr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub key: StringExpr,
    pub value: Expr,
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null(Syntax),
    Bool(Syntax, bool),
    Number(Syntax, f64),
    String(StringExpr),
    List(Syntax, Vec<Expr>),
    Object(Syntax, Vec<ObjectProperty>),
    Invoke(InvokeExpr),
}

/// A `fn::invoke` function call
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeExpr {
    pub syntax: Syntax,
    /// `None` when the invoke omits its `function`
    pub token: Option<StringExpr>,
    pub args: Option<Box<Expr>>,
    pub call_opts: InvokeOptions,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeOptions {
    pub version: Option<StringExpr>,
    pub plugin_download_url: Option<StringExpr>,
}

impl Expr {
    pub fn syntax(&self) -> &Syntax {
        match self {
            Expr::Null(syntax)
            | Expr::Bool(syntax, _)
            | Expr::Number(syntax, _)
            | Expr::List(syntax, _)
            | Expr::Object(syntax, _) => syntax,
            Expr::String(s) => &s.syntax,
            Expr::Invoke(invoke) => &invoke.syntax,
        }
    }

    /// Direct child expressions, in source order
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::List(_, items) => items.iter().collect(),
            Expr::Object(_, props) => props.iter().map(|p| &p.value).collect(),
            Expr::Invoke(invoke) => invoke.args.iter().map(|a| a.as_ref()).collect(),
            _ => Vec::new(),
        }
    }
}
