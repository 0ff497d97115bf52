//! Type token algebra
//!
//! Pure string manipulation: splitting tokens, deriving the owning package and
//! expanding abbreviated user tokens into canonical candidates. Nothing here
//! touches a schema; callers pass a lookup into the package tables.

use crate::errors::ResolveError;
use pkgbind_schema::SchemaError;
use smallvec::SmallVec;
use std::fmt;

/// Module inserted into two-segment tokens (`aws:Bucket` -> `aws:index:Bucket`)
pub const INDEX_MODULE: &str = "index";

const PROVIDER_PACKAGE: &str = "pulumi";
const PROVIDER_MODULE: &str = "providers";

/// Candidate tokens tried for one user token, most specific first
pub type Candidates = SmallVec<[String; 3]>;

macro_rules! type_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(token: impl Into<String>) -> Self {
                $name(token.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

type_token!(
    /// Canonical token of a resource type
    ResourceTypeToken
);

type_token!(
    /// Canonical token of a function (invoke)
    FunctionTypeToken
);

/// Split a token into its segments, rejecting anything but two or three
pub fn split_token(token: &str) -> Result<SmallVec<[&str; 3]>, ResolveError> {
    let parts: SmallVec<[&str; 3]> = token.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(ResolveError::InvalidTypeToken(token.to_string()));
    }
    Ok(parts)
}

/// True for `pulumi:providers:<pkg>` tokens
pub fn is_provider_token(token: &str) -> bool {
    provider_package(token).is_some()
}

fn provider_package(token: &str) -> Option<&str> {
    let mut parts = token.split(':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(PROVIDER_PACKAGE), Some(PROVIDER_MODULE), Some(pkg), None) => Some(pkg),
        _ => None,
    }
}

/// Name of the package that owns `token`
///
/// Provider resources belong to the package they configure; every other token
/// belongs to its first segment. The token is not validated here.
pub fn resolve_pkg_name(token: &str) -> &str {
    if let Some(pkg) = provider_package(token) {
        return pkg;
    }
    token.split(':').next().unwrap_or(token)
}

/// Canonical forms worth trying for a user token, in priority order
///
/// 1. the token as written
/// 2. `A:index:B` for a two-segment `A:B`
/// 3. the legacy `A:B/c:C` form for `A:B:C` (including the form from 2)
pub fn candidate_tokens(token: &str) -> Result<Candidates, ResolveError> {
    let parts = split_token(token)?;
    let mut candidates = Candidates::new();
    candidates.push(token.to_string());

    let (pkg, module, name) = match parts.as_slice() {
        [pkg, name] => {
            candidates.push(format!("{}:{}:{}", pkg, INDEX_MODULE, name));
            (*pkg, INDEX_MODULE, *name)
        }
        [pkg, module, name] => (*pkg, *module, *name),
        _ => return Err(ResolveError::InvalidTypeToken(token.to_string())),
    };
    candidates.push(format!(
        "{}:{}/{}:{}",
        pkg,
        module,
        to_lower_camel(name),
        name
    ));
    Ok(candidates)
}

/// Map a user token to the first candidate `lookup` recognises
///
/// `lookup` returns `Ok(None)` for a miss; the first error aborts the search.
/// Returns `Ok(None)` when no candidate matched.
pub fn resolve_token<T, F>(token: &str, mut lookup: F) -> Result<Option<T>, ResolveError>
where
    F: FnMut(&str) -> Result<Option<T>, SchemaError>,
{
    for candidate in candidate_tokens(token)? {
        if let Some(found) = lookup(&candidate)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Lower camel case a type name (`BucketObject` -> `bucketObject`)
///
/// Word boundaries follow the classic rule: a capital directly after a capital
/// is lowercased, a letter after a digit or a separator (`_`, `-`, ` `, `.`) is
/// capitalized, and separators are dropped.
pub fn to_lower_camel(name: &str) -> String {
    let name = name.trim();
    let mut out = String::with_capacity(name.len());
    let mut cap_next = false;
    let mut prev_is_cap = false;

    for (i, c) in name.chars().enumerate() {
        let is_cap = c.is_ascii_uppercase();
        let is_low = c.is_ascii_lowercase();

        let c = if cap_next {
            c.to_ascii_uppercase()
        } else if i == 0 || (prev_is_cap && is_cap) {
            c.to_ascii_lowercase()
        } else {
            c
        };
        prev_is_cap = is_cap;

        if is_cap || is_low {
            out.push(c);
            cap_next = false;
        } else if c.is_ascii_digit() {
            out.push(c);
            cap_next = true;
        } else {
            cap_next = matches!(c, '_' | ' ' | '-' | '.');
        }
    }
    out
}
