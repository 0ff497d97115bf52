//! Template front-end for pkgbind
//!
//! This crate provides the parts of a declarative template that package
//! resolution needs:
//! 1. A small AST of packages, resources, variables and outputs
//! 2. A YAML front-end building that AST (`Template::from_yaml`)
//! 3. A visitor-based walker over resources and expressions
//! 4. An append-only diagnostics accumulator tied to AST nodes

pub mod ast;
pub mod diagnostics;
pub mod errors;
pub mod packages;
mod parse;
pub mod walker;

pub use ast::{
    Expr, InvokeExpr, InvokeOptions, NamedExpr, ObjectProperty, ResourceDecl, ResourceEntry,
    ResourceOptions, StringExpr, Syntax, Template,
};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use errors::TemplateError;
pub use packages::{PackageDecl, ParameterizationDecl};
pub use walker::{walk, Visitor};
