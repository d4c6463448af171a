use darling::FromMeta;
use forma_ir::Deprecation;

use super::is_attr;

#[derive(Debug, Default, FromMeta)]
#[darling(default)]
struct DeprecatedArgs {
    since: Option<String>,
    note: Option<String>,
}

/// Reads `#[deprecated]`, `#[deprecated = "note"]` or
/// `#[deprecated(since = "...", note = "...")]` from `attrs`.
pub fn parse_deprecation(attrs: &[syn::Attribute]) -> darling::Result<Option<Deprecation>> {
    let Some(attr) = attrs.iter().find(|attr| is_attr(attr, "deprecated")) else {
        return Ok(None);
    };
    let deprecation = match &attr.meta {
        syn::Meta::Path(_) => Deprecation::default(),
        syn::Meta::NameValue(name_value) => Deprecation {
            since: None,
            note: Some(String::from_expr(&name_value.value)?),
        },
        syn::Meta::List(_) => {
            let args = DeprecatedArgs::from_meta(&attr.meta)?;
            Deprecation {
                since: args.since,
                note: args.note,
            }
        }
    };
    Ok(Some(deprecation))
}
