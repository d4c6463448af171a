mod deprecation;
mod method;
mod model;
mod settings;

use std::fmt::Display;
use std::str::FromStr;

use darling::FromMeta;

pub use deprecation::parse_deprecation;
pub use method::{FeatureList, MethodArgs};
pub use model::ModelArgs;
pub use settings::{SettingsArgs, TypeList};

/// A string-valued option parsed with the target type's `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parsed<T>(pub T);

impl<T> FromMeta for Parsed<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn from_string(value: &str) -> darling::Result<Self> {
        value
            .parse()
            .map(Parsed)
            .map_err(|err: T::Err| darling::Error::custom(err.to_string()))
    }
}

/// Whether `attr` is `#[name ...]`, possibly written with a path such as
/// `#[forma::name ...]`.
pub fn is_attr(attr: &syn::Attribute, name: &str) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == name)
}
