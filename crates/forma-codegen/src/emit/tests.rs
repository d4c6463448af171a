use forma_ir::{
    BuilderKind, Deprecation, FragmentOrigin, FragmentSite, InterfaceDecl, MethodDecl,
    ModelAnnotation, ModelDescriptor, ModelKind, QualifiedName, SettingsFragment, SourceSet,
    TypeRef,
};
use pretty_assertions::assert_eq;
use quote::quote;

use super::*;
use crate::builder::synthesize;
use crate::model::assemble;

fn getter(name: &str, ty: &str) -> MethodDecl {
    MethodDecl::builder()
        .name(name)
        .return_type(TypeRef::new(ty))
        .build()
}

fn fragment(kind: ModelKind) -> SettingsFragment {
    SettingsFragment::new(FragmentOrigin::new(FragmentSite::ModelAnnotation {
        interface: QualifiedName::parse("models::User"),
        kind,
    }))
}

fn user_model(kind: ModelKind, settings: Option<SettingsFragment>) -> ModelDescriptor {
    let annotation = ModelAnnotation {
        settings,
        ..ModelAnnotation::new(kind)
    };
    let interface = InterfaceDecl::builder()
        .name(QualifiedName::parse("models::User"))
        .methods(vec![
            getter("get_name", "String"),
            getter("get_email", "String"),
            getter("is_active", "bool"),
            getter("get_nickname", "Option<String>"),
        ])
        .model(annotation.clone())
        .build();
    let mut sources = SourceSet::new();
    sources.add_interface(interface.clone());
    assemble(&sources, &interface, &annotation).unwrap()
}

fn with_builder(kind: BuilderKind, to_builder: bool) -> SettingsFragment {
    let mut settings = fragment(ModelKind::Immutable);
    settings.builder = Some(kind);
    settings.to_builder = Some(to_builder);
    settings
}

fn render(model: &ModelDescriptor) -> syn::File {
    let plan = synthesize(model);
    let source = render_file(model, plan.as_ref(), &GenerationConfig::default()).unwrap();
    syn::parse_file(&source).unwrap()
}

fn traits(file: &syn::File) -> Vec<&syn::ItemTrait> {
    file.items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Trait(item) => Some(item),
            _ => None,
        })
        .collect()
}

fn trait_methods(item: &syn::ItemTrait) -> Vec<String> {
    item.items
        .iter()
        .filter_map(|item| match item {
            syn::TraitItem::Fn(f) => Some(f.sig.ident.to_string()),
            _ => None,
        })
        .collect()
}

fn struct_names(file: &syn::File) -> Vec<String> {
    file.items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Struct(item) => Some(item.ident.to_string()),
            _ => None,
        })
        .collect()
}

fn impl_methods(file: &syn::File, self_ty: &str) -> Vec<String> {
    file.items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Impl(item) if item.trait_.is_none() => Some(item),
            _ => None,
        })
        .filter(|item| {
            let ty = &item.self_ty;
            quote!(#ty).to_string() == self_ty
        })
        .flat_map(|item| {
            item.items.iter().filter_map(|item| match item {
                syn::ImplItem::Fn(f) => Some(f.sig.ident.to_string()),
                _ => None,
            })
        })
        .collect()
}

#[test]
fn test_file_starts_with_generated_header() {
    let model = user_model(ModelKind::Immutable, None);
    let source = render_file(&model, None, &GenerationConfig::default()).unwrap();
    assert!(source.starts_with("//! @generated by forma from `models::User`. Do not edit by hand.\n"));

    let config = GenerationConfig::builder().header(false).build();
    let source = render_file(&model, None, &config).unwrap();
    assert!(source.starts_with("#[derive(Clone)]"));
}

#[test]
fn test_value_type_implements_the_model_trait() {
    let model = user_model(ModelKind::Immutable, None);
    let tokens = model_tokens(&model, None, &GenerationConfig::default())
        .unwrap()
        .to_string();

    assert!(tokens.contains(&quote!(pub struct ImmutableUser).to_string()));
    assert!(tokens.contains(&quote!(impl crate::models::User for ImmutableUser).to_string()));
    assert!(tokens.contains(
        &quote! {
            fn get_name(&self) -> String {
                self.name.clone()
            }
        }
        .to_string()
    ));
    assert!(tokens.contains(
        &quote!(pub fn new(active: bool, email: String, name: String, nickname: Option<String>))
            .to_string()
    ));
}

#[test]
fn test_immutable_model_has_no_setters() {
    let file = render(&user_model(ModelKind::Immutable, None));
    assert_eq!(impl_methods(&file, "ImmutableUser"), ["new"]);
}

#[test]
fn test_mutable_model_setters() {
    let model = user_model(ModelKind::Mutable, None);
    let file = render(&model);
    assert_eq!(
        impl_methods(&file, "MutableUser"),
        ["new", "set_active", "set_email", "set_name", "set_nickname"]
    );
    let tokens = model_tokens(&model, None, &GenerationConfig::default())
        .unwrap()
        .to_string();
    assert!(tokens.contains(
        &quote! {
            pub fn set_name(&mut self, name: String) -> &mut Self {
                self.name = name;
                self
            }
        }
        .to_string()
    ));
}

#[test]
fn test_equality_and_debug_follow_markers() {
    let mut settings = fragment(ModelKind::Immutable);
    settings.equality = Some(forma_ir::Inclusion::ExcludeAll);
    let model = user_model(ModelKind::Immutable, Some(settings));
    let tokens = model_tokens(&model, None, &GenerationConfig::default())
        .unwrap()
        .to_string();
    assert!(tokens.contains(
        &quote! {
            fn eq(&self, other: &Self) -> bool {
                true
            }
        }
        .to_string()
    ));
    assert!(tokens.contains(&quote!(let _ = state;).to_string()));
    assert!(tokens.contains(&quote!(.field("name", &self.name)).to_string()));
    assert!(tokens.contains(&quote!(.finish()).to_string()));
}

#[test]
fn test_deprecated_model_is_marked() {
    let mut model = user_model(ModelKind::Immutable, None);
    model.deprecation = Some(Deprecation {
        since: Some("1.2".to_owned()),
        note: None,
    });
    let tokens = model_tokens(&model, None, &GenerationConfig::default())
        .unwrap()
        .to_string();
    assert!(tokens.starts_with(&quote!(#[deprecated(since = "1.2")]).to_string()));
    assert!(tokens.contains(&quote!(#[allow(deprecated)]).to_string()));

    let config = GenerationConfig::builder().allow_warnings(false).build();
    let tokens = model_tokens(&model, None, &config).unwrap().to_string();
    assert!(!tokens.contains("allow"));
}

#[test]
fn test_serde_derives_and_transient_fields() {
    let mut settings = fragment(ModelKind::Immutable);
    settings.serde = Some(true);
    settings.field_transience = Some(forma_ir::Inclusion::IncludeAll);
    let model = user_model(ModelKind::Immutable, Some(settings));
    let tokens = model_tokens(&model, None, &GenerationConfig::default())
        .unwrap()
        .to_string();
    assert!(tokens.contains(&quote!(#[derive(::serde::Serialize, ::serde::Deserialize)]).to_string()));
    assert!(tokens.contains(&quote!(#[serde(skip_serializing)] name: String).to_string()));
}

#[test]
fn test_invalid_attribute_type_is_reported() {
    let mut model = user_model(ModelKind::Immutable, None);
    let mut attributes: Vec<_> = model.attributes.iter().cloned().collect();
    attributes[0].ty = TypeRef::new("Vec<");
    model.attributes = attributes.into_iter().collect();
    let err = model_tokens(&model, None, &GenerationConfig::default()).unwrap_err();
    assert!(matches!(err, EmitError::InvalidType { ref attribute, .. } if attribute == "active"));
}

#[test]
fn test_unchecked_builder() {
    let model = user_model(ModelKind::Immutable, Some(with_builder(BuilderKind::Unchecked, true)));
    let file = render(&model);
    assert_eq!(struct_names(&file), ["ImmutableUser", "ImmutableUserBuilder"]);
    assert_eq!(
        impl_methods(&file, "ImmutableUserBuilder"),
        ["active", "email", "name", "nickname", "build"]
    );
    assert_eq!(impl_methods(&file, "ImmutableUser"), ["new", "builder", "to_builder"]);
}

#[test]
fn test_runtime_checked_builder_lists_missing_attributes() {
    let model = user_model(
        ModelKind::Immutable,
        Some(with_builder(BuilderKind::RuntimeChecked, false)),
    );
    let plan = synthesize(&model).unwrap();
    let tokens = model_tokens(&model, Some(&plan), &GenerationConfig::default())
        .unwrap()
        .to_string();

    assert!(tokens.contains(&quote!(__forma_initialized: u8).to_string()));
    assert!(tokens.contains(&quote!(self.__forma_initialized = (self.__forma_initialized | 2u8);).to_string()));
    assert!(tokens.contains(&quote!(if (self.__forma_initialized & 3u8) != 3u8).to_string()));
    assert!(tokens.contains(
        &quote! {
            if (self.__forma_initialized & 1u8) == 0u8 {
                missing.push("email");
            }
        }
        .to_string()
    ));
    assert!(tokens.contains(
        &quote!(-> ::core::result::Result<ImmutableUser, ImmutableUserBuilderError>).to_string()
    ));

    let file = render(&model);
    assert_eq!(
        struct_names(&file),
        ["ImmutableUser", "ImmutableUserBuilderError", "ImmutableUserBuilder"]
    );
    assert_eq!(impl_methods(&file, "ImmutableUser"), ["new", "builder"]);
}

#[test]
fn test_staged_builder_only_builds_from_the_final_stage() {
    let model = user_model(ModelKind::Immutable, Some(with_builder(BuilderKind::Staged, true)));
    let file = render(&model);

    let stages: Vec<(String, Vec<String>)> = traits(&file)
        .into_iter()
        .map(|item| (item.ident.to_string(), trait_methods(item)))
        .collect();
    assert_eq!(
        stages,
        [
            ("ImmutableUserEmailStage".to_owned(), vec!["email".to_owned()]),
            ("ImmutableUserNameStage".to_owned(), vec!["name".to_owned()]),
            (
                "ImmutableUserFinalStage".to_owned(),
                vec!["active".to_owned(), "nickname".to_owned(), "build".to_owned()]
            ),
        ]
    );
    // to_builder is never generated for staged builders.
    assert_eq!(impl_methods(&file, "ImmutableUser"), ["new", "builder"]);

    let tokens = model_tokens(&model, synthesize(&model).as_ref(), &GenerationConfig::default())
        .unwrap()
        .to_string();
    assert!(tokens.contains(&quote!(pub fn builder() -> impl ImmutableUserEmailStage).to_string()));
    assert!(tokens.contains(&quote!(fn email(self, email: String) -> impl ImmutableUserNameStage;).to_string()));
    assert!(tokens.contains(&quote!(struct ImmutableUserBuilder).to_string()));
    assert!(!tokens.contains(&quote!(pub struct ImmutableUserBuilder).to_string()));
}

#[test]
fn test_staged_builder_without_mandatory_attributes() {
    let annotation = ModelAnnotation {
        settings: Some(with_builder(BuilderKind::Staged, false)),
        ..ModelAnnotation::new(ModelKind::Immutable)
    };
    let interface = InterfaceDecl::builder()
        .name(QualifiedName::parse("models::User"))
        .methods(vec![getter("get_age", "u32")])
        .model(annotation.clone())
        .build();
    let mut sources = SourceSet::new();
    sources.add_interface(interface.clone());
    let model = assemble(&sources, &interface, &annotation).unwrap();

    let file = render(&model);
    let stages: Vec<String> = traits(&file).iter().map(|t| t.ident.to_string()).collect();
    assert_eq!(stages, ["ImmutableUserFinalStage"]);
}

fn implemented_traits(file: &syn::File) -> Vec<String> {
    file.items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Impl(syn::ItemImpl {
                trait_: Some((_, path, _)),
                ..
            }) => path.segments.last().map(|s| s.ident.to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_hash_and_eq_for_models_without_floats() {
    let file = render(&user_model(ModelKind::Immutable, None));
    assert_eq!(
        implemented_traits(&file),
        ["User", "PartialEq", "Eq", "Hash", "Debug"]
    );
}

#[test]
fn test_float_attributes_only_get_partial_eq() {
    for ty in ["f64", "f32", "Option<f64>", "Vec<(String, f32)>"] {
        let annotation = ModelAnnotation::new(ModelKind::Immutable);
        let interface = InterfaceDecl::builder()
            .name(QualifiedName::parse("shop::Price"))
            .methods(vec![getter("get_amount", ty), getter("get_currency", "String")])
            .model(annotation.clone())
            .build();
        let mut sources = SourceSet::new();
        sources.add_interface(interface.clone());
        let model = assemble(&sources, &interface, &annotation).unwrap();

        let file = render(&model);
        assert_eq!(implemented_traits(&file), ["Price", "PartialEq", "Debug"], "{ty}");
    }
}

#[test]
fn test_excluded_float_attribute_keeps_hash() {
    let annotation = ModelAnnotation::new(ModelKind::Immutable);
    let interface = InterfaceDecl::builder()
        .name(QualifiedName::parse("shop::Price"))
        .methods(vec![
            MethodDecl::builder()
                .name("get_amount")
                .return_type(TypeRef::new("f64"))
                .markers(forma_ir::FeatureMarkers::new().with(
                    forma_ir::Feature::Equality,
                    forma_ir::Marker::Exclude,
                ))
                .build(),
            getter("get_currency", "String"),
        ])
        .model(annotation.clone())
        .build();
    let mut sources = SourceSet::new();
    sources.add_interface(interface.clone());
    let model = assemble(&sources, &interface, &annotation).unwrap();

    let file = render(&model);
    assert_eq!(
        implemented_traits(&file),
        ["Price", "PartialEq", "Eq", "Hash", "Debug"]
    );
}

#[test]
fn test_getter_keeps_a_typed_receiver() {
    let annotation = ModelAnnotation::new(ModelKind::Immutable);
    let interface = InterfaceDecl::builder()
        .name(QualifiedName::parse("models::Node"))
        .methods(vec![
            MethodDecl::builder()
                .name("get_label")
                .receiver(forma_ir::Receiver::Typed(TypeRef::new("Box<Self>")))
                .return_type(TypeRef::new("String"))
                .build(),
        ])
        .model(annotation.clone())
        .build();
    let mut sources = SourceSet::new();
    sources.add_interface(interface.clone());
    let model = assemble(&sources, &interface, &annotation).unwrap();

    let tokens = model_tokens(&model, None, &GenerationConfig::default())
        .unwrap()
        .to_string();
    assert!(tokens.contains(
        &quote! {
            fn get_label(self: Box<Self>) -> String {
                self.label.clone()
            }
        }
        .to_string()
    ));
}
