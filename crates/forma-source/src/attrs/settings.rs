use darling::FromMeta;
use darling::ast::NestedMeta;
use forma_ir::{BuilderKind, FragmentOrigin, Inclusion, SettingsFragment, Visibility};

use super::Parsed;

/// The body of `#[settings(...)]`, `#![settings(...)]` and the nested
/// `settings(...)` of a model attribute.
///
/// Unknown keys and values of the wrong type are rejected here, so every
/// fragment the pipeline sees is well typed.
#[derive(Debug, Default, FromMeta)]
#[darling(default)]
pub struct SettingsArgs {
    pub package_name: Option<String>,
    pub class_name: Option<String>,
    pub getter_prefix: Option<String>,
    pub boolean_getter_prefix: Option<String>,
    pub boolean_types: Option<TypeList>,
    pub setter_prefix: Option<String>,
    pub field_visibility: Option<Parsed<Visibility>>,
    pub field_transience: Option<Parsed<Inclusion>>,
    pub equality: Option<Parsed<Inclusion>>,
    pub to_string: Option<Parsed<Inclusion>>,
    pub setters: Option<Parsed<Inclusion>>,
    pub builder: Option<Parsed<BuilderKind>>,
    pub builder_method_name: Option<String>,
    pub build_method_name: Option<String>,
    pub to_builder: Option<bool>,
    pub serde: Option<bool>,
}

impl SettingsArgs {
    pub fn into_fragment(self, origin: FragmentOrigin) -> SettingsFragment {
        let mut fragment = SettingsFragment::new(origin);
        fragment.package_name = self.package_name;
        fragment.class_name = self.class_name;
        fragment.getter_prefix = self.getter_prefix;
        fragment.boolean_getter_prefix = self.boolean_getter_prefix;
        fragment.boolean_types = self.boolean_types.map(|list| list.0);
        fragment.setter_prefix = self.setter_prefix;
        fragment.field_visibility = self.field_visibility.map(|v| v.0);
        fragment.field_transience = self.field_transience.map(|v| v.0);
        fragment.equality = self.equality.map(|v| v.0);
        fragment.to_string = self.to_string.map(|v| v.0);
        fragment.setters = self.setters.map(|v| v.0);
        fragment.builder = self.builder.map(|v| v.0);
        fragment.builder_method_name = self.builder_method_name;
        fragment.build_method_name = self.build_method_name;
        fragment.to_builder = self.to_builder;
        fragment.serde = self.serde;
        fragment
    }
}

/// `boolean_types("Flag", "Option<bool>")`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeList(pub Vec<String>);

impl FromMeta for TypeList {
    fn from_list(items: &[NestedMeta]) -> darling::Result<Self> {
        let mut errors = darling::Error::accumulator();
        let mut types = Vec::with_capacity(items.len());
        for item in items {
            match item {
                NestedMeta::Lit(syn::Lit::Str(lit)) => {
                    if let Some(ty) = errors.handle(parse_type(&lit.value(), lit)) {
                        types.push(ty);
                    }
                }
                other => errors.push(
                    darling::Error::custom("expected a type as a string literal").with_span(other),
                ),
            }
        }
        errors.finish_with(TypeList(types))
    }
}

fn parse_type(value: &str, lit: &syn::LitStr) -> darling::Result<String> {
    use quote::ToTokens as _;

    syn::parse_str::<syn::Type>(value)
        .map(|ty| ty.to_token_stream().to_string())
        .map_err(|err| darling::Error::custom(format!("invalid type: {err}")).with_span(lit))
}
