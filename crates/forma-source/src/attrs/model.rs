use darling::FromMeta;
use forma_ir::ModelKind;

use super::{SettingsArgs, is_attr};

/// `#[immutable_model]`, `#[mutable_model(settings(...))]` and their inner
/// (package-level) forms.
#[derive(Debug, Default, FromMeta)]
#[darling(default)]
pub struct ModelArgs {
    pub settings: Option<SettingsArgs>,
}

impl ModelArgs {
    /// The model kind `attr` declares, if it is a model attribute.
    pub fn kind_of(attr: &syn::Attribute) -> Option<ModelKind> {
        [ModelKind::Immutable, ModelKind::Mutable]
            .into_iter()
            .find(|kind| is_attr(attr, kind.annotation_name()))
    }

    /// Parses a model attribute. The bare form has no settings.
    pub fn from_attribute(attr: &syn::Attribute) -> darling::Result<Self> {
        match &attr.meta {
            syn::Meta::Path(_) => Ok(Self::default()),
            meta => Self::from_meta(meta),
        }
    }
}
