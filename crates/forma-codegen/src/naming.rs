//! Identifier validation, prefix stripping and keyword escaping.

use convert_case::{Case, Casing as _};

const STRICT_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

const RESERVED_KEYWORDS: &[&str] = &[
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be written as raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    #[error("name '{name}' {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },
    #[error("invalid class name '{name}': {reason}")]
    InvalidClassName { name: String, reason: String },
    #[error("invalid package name '{name}': {reason}")]
    InvalidPackageName { name: String, reason: String },
}

pub fn is_keyword(name: &str) -> bool {
    STRICT_KEYWORDS.contains(&name) || RESERVED_KEYWORDS.contains(&name)
}

/// Checks that `name` can be used verbatim as an identifier.
pub fn validate_identifier(name: &str) -> Result<(), NamingError> {
    let invalid = |reason| NamingError::InvalidIdentifier {
        name: name.to_owned(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("cannot be empty"));
    }
    if name == "_" || is_keyword(name) {
        return Err(invalid("is a reserved keyword in Rust"));
    }
    if syn::parse_str::<syn::Ident>(name).is_err() || name.starts_with("r#") {
        return Err(invalid("is not a valid Rust identifier"));
    }
    Ok(())
}

pub fn validate_class_name(name: &str) -> Result<(), NamingError> {
    validate_identifier(name).map_err(|err| NamingError::InvalidClassName {
        name: name.to_owned(),
        reason: reason_of(err),
    })
}

/// Checks a `::`-separated module path. The empty path is allowed.
pub fn validate_package_name(name: &str) -> Result<(), NamingError> {
    let invalid = |reason: &str| NamingError::InvalidPackageName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };
    if name.is_empty() {
        return Ok(());
    }
    if name.starts_with("::") {
        return Err(invalid("cannot start with a path separator"));
    }
    if name.ends_with("::") {
        return Err(invalid("cannot end with a path separator"));
    }
    for segment in name.split("::") {
        if segment.is_empty() {
            return Err(invalid("cannot contain empty segments"));
        }
        validate_identifier(segment).map_err(|err| NamingError::InvalidPackageName {
            name: name.to_owned(),
            reason: reason_of(err),
        })?;
    }
    Ok(())
}

fn reason_of(err: NamingError) -> String {
    match err {
        NamingError::InvalidIdentifier { name, reason } => format!("name '{name}' {reason}"),
        other => other.to_string(),
    }
}

/// Makes `name` usable as an identifier, using a raw identifier for
/// keywords where possible.
pub fn escape_identifier(name: &str) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if is_keyword(name) {
        format!("r#{name}")
    } else {
        name.to_owned()
    }
}

/// Field and parameter identifier for an attribute: `userName` becomes
/// `user_name`.
pub fn attribute_identifier(attribute: &str) -> String {
    escape_identifier(&attribute.to_case(Case::Snake))
}

/// Type name component for an attribute: `userName` becomes `UserName`.
pub fn attribute_type_component(attribute: &str) -> String {
    attribute.to_case(Case::Pascal)
}

/// Strips a getter prefix from a method name and derives the attribute name.
///
/// A non-empty prefix only matches at a word boundary, so `is` matches
/// `isActive` and `is_active` but not `issue`. Returns `None` when the
/// prefix does not match or nothing remains.
pub fn strip_prefix(method_name: &str, prefix: &str) -> Option<String> {
    let remainder = method_name.strip_prefix(prefix)?;
    if !prefix.is_empty() {
        let first = remainder.chars().next()?;
        if first != '_' && !first.is_uppercase() {
            return None;
        }
    }
    let remainder = remainder.trim_start_matches('_');
    let mut chars = remainder.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

/// Joins a prefix and an identifier into a method name: `set` and
/// `user_name` give `set_user_name`. An empty prefix gives the identifier.
pub fn prefixed_method(prefix: &str, identifier: &str) -> String {
    let bare = identifier.strip_prefix("r#").unwrap_or(identifier);
    if prefix.trim().is_empty() {
        escape_identifier(bare)
    } else {
        format!("{}_{}", prefix.trim(), bare.trim_end_matches('_'))
    }
}

/// Replaces the `*` wildcard in a naming pattern.
pub fn substitute_wildcard(pattern: &str, replacement: &str) -> String {
    pattern.replace('*', replacement)
}

/// Replaces the `*` wildcard in a module path pattern. The root package
/// takes its `::` separator with it: `*::generated` becomes `generated`.
pub fn substitute_package_wildcard(pattern: &str, package: &str) -> String {
    if package.is_empty() {
        pattern.replace("*::", "").replace("::*", "").replace('*', "")
    } else {
        substitute_wildcard(pattern, package)
    }
}
