//! Resolves the per-attribute feature set from global policy and method
//! markers.

use std::collections::BTreeMap;

use forma_ir::{
    AttributeDescriptor, AttributeSet, ClassifiedGetter, Deprecation, Diagnostic, Diagnostics,
    Feature, Inclusion, MethodClassification, ModelKind, SettingsCollection, SourceSet,
};
use tracing::{debug, warn};

use crate::error::method_origin;
use crate::naming::attribute_identifier;

pub struct AttributeResolver<'a> {
    pub sources: &'a SourceSet,
    pub settings: &'a SettingsCollection,
    pub kind: ModelKind,
    /// Deprecation of the model trait, inherited by attributes that have none.
    pub deprecation: Option<&'a Deprecation>,
}

impl AttributeResolver<'_> {
    /// Builds one attribute from its getter.
    pub fn build(
        &self,
        name: &str,
        getter: &ClassifiedGetter,
    ) -> Result<AttributeDescriptor, Diagnostics> {
        let method = &getter.method.method;
        let identifier = attribute_identifier(name);
        if syn::parse_str::<syn::Ident>(&identifier).is_err() {
            return Err(Diagnostic::error(
                format!("attribute `{name}` does not map to a valid field name (`{identifier}`)"),
                method_origin(self.sources, &getter.method),
            )
            .into());
        }
        let Some(ty) = method.return_type.clone() else {
            return Err(Diagnostic::error(
                format!("attribute `{name}` has no type"),
                method_origin(self.sources, &getter.method),
            )
            .into());
        };

        let feature = |feature: Feature, policy: Inclusion| {
            let marker = method.markers.get(feature);
            let enabled = policy.resolve(marker);
            if marker.is_some() && enabled == policy.resolve(None) {
                debug!(attribute = name, %feature, "redundant {feature} marker");
            }
            enabled
        };

        let mut setter = feature(Feature::Setter, *self.settings.setters.value());
        if setter && !self.kind.is_mutable() {
            warn!(
                attribute = name,
                "setters are only generated for mutable models; ignoring"
            );
            setter = false;
        }

        let mandatory = !(ty.is_option() || ty.is_primitive_scalar());
        Ok(AttributeDescriptor::builder()
            .name(name)
            .identifier(identifier)
            .is_final(false)
            .transient(feature(
                Feature::Transient,
                *self.settings.field_transience.value(),
            ))
            .field_visibility(
                method
                    .visibility
                    .unwrap_or(*self.settings.field_visibility.value()),
            )
            .setter(setter)
            .in_to_string(feature(Feature::ToString, *self.settings.to_string.value()))
            .in_equality(feature(Feature::Equality, *self.settings.equality.value()))
            .mandatory(mandatory)
            .getter(getter.method.clone())
            .maybe_deprecation(method.deprecation.clone().or_else(|| self.deprecation.cloned()))
            .ty(ty)
            .build())
    }

    /// Builds every attribute of a classification, aggregating failures.
    pub fn build_all(
        &self,
        classification: &MethodClassification,
    ) -> Result<AttributeSet, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let mut attributes = AttributeSet::new();
        let mut identifiers: BTreeMap<String, String> = BTreeMap::new();
        for getter in classification.getters() {
            match self.build(&getter.attribute, getter) {
                Ok(attribute) => {
                    if let Some(other) =
                        identifiers.insert(attribute.identifier.clone(), attribute.name.clone())
                    {
                        diagnostics.push(Diagnostic::error(
                            format!(
                                "attributes `{other}` and `{}` both map to the field `{}`",
                                attribute.name, attribute.identifier
                            ),
                            method_origin(self.sources, &getter.method),
                        ));
                        continue;
                    }
                    attributes.insert(attribute);
                }
                Err(errors) => diagnostics.append(errors),
            }
        }
        diagnostics.into_result(attributes)
    }
}

#[cfg(test)]
mod tests {
    use forma_ir::{
        DeclaredMethod, FeatureMarkers, FragmentOrigin, FragmentSite, Marker, MethodDecl,
        ModulePath, QualifiedName, SettingsFragment, TypeRef, Visibility,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn getter(attribute: &str, method: MethodDecl) -> ClassifiedGetter {
        ClassifiedGetter {
            attribute: attribute.to_owned(),
            method: DeclaredMethod::new(QualifiedName::parse("models::User"), method),
            boolean: false,
        }
    }

    fn method(name: &str, ty: &str) -> MethodDecl {
        MethodDecl::builder()
            .name(name)
            .return_type(TypeRef::new(ty))
            .build()
    }

    fn resolve(
        kind: ModelKind,
        settings: &SettingsCollection,
        getter: &ClassifiedGetter,
    ) -> AttributeDescriptor {
        let sources = SourceSet::new();
        AttributeResolver {
            sources: &sources,
            settings,
            kind,
            deprecation: None,
        }
        .build(&getter.attribute, getter)
        .unwrap()
    }

    #[test]
    fn test_defaults_for_immutable_model() {
        let settings = SettingsCollection::defaults(ModelKind::Immutable);
        let attribute = resolve(
            ModelKind::Immutable,
            &settings,
            &getter("userName", method("get_user_name", "String")),
        );
        assert_eq!(attribute.identifier, "user_name");
        assert!(attribute.mandatory);
        assert!(attribute.in_equality);
        assert!(attribute.in_to_string);
        assert!(!attribute.transient);
        assert!(!attribute.setter);
        assert!(!attribute.is_final);
        assert_eq!(attribute.field_visibility, Visibility::Private);
    }

    #[test]
    fn test_markers_override_policy() {
        let mut fragment = SettingsFragment::new(FragmentOrigin::new(FragmentSite::Package(
            ModulePath::parse("models"),
        )));
        fragment.equality = Some(Inclusion::ExcludeAll);
        let settings = SettingsCollection::from_fragments(&[&fragment], ModelKind::Mutable);

        let mut decl = method("get_secret", "String");
        decl.markers = FeatureMarkers::new()
            .with(Feature::Equality, Marker::Include)
            .with(Feature::ToString, Marker::Exclude)
            .with(Feature::Setter, Marker::Exclude)
            .with(Feature::Transient, Marker::Include);
        decl.visibility = Some(Visibility::Pub);
        let attribute = resolve(ModelKind::Mutable, &settings, &getter("secret", decl));

        assert!(attribute.in_equality);
        assert!(!attribute.in_to_string);
        assert!(!attribute.setter);
        assert!(attribute.transient);
        assert_eq!(attribute.field_visibility, Visibility::Pub);
    }

    #[test]
    fn test_redundant_marker_is_not_an_error() {
        let settings = SettingsCollection::defaults(ModelKind::Mutable);
        let mut decl = method("get_name", "String");
        decl.markers = FeatureMarkers::new().with(Feature::Setter, Marker::Include);
        let attribute = resolve(ModelKind::Mutable, &settings, &getter("name", decl));
        assert!(attribute.setter);
    }

    #[test]
    fn test_setters_are_dropped_on_immutable_models() {
        let settings = SettingsCollection::defaults(ModelKind::Immutable);
        let mut decl = method("get_name", "String");
        decl.markers = FeatureMarkers::new().with(Feature::Setter, Marker::Include);
        let attribute = resolve(ModelKind::Immutable, &settings, &getter("name", decl));
        assert!(!attribute.setter);
    }

    #[test]
    fn test_mandatory_depends_on_type() {
        let settings = SettingsCollection::defaults(ModelKind::Immutable);
        for (ty, mandatory) in [
            ("String", true),
            ("Vec<u8>", true),
            ("Option<String>", false),
            ("bool", false),
            ("u64", false),
        ] {
            let attribute = resolve(ModelKind::Immutable, &settings, &getter("x", method("get_x", ty)));
            assert_eq!(attribute.mandatory, mandatory, "{ty}");
        }
    }

    #[test]
    fn test_deprecation_falls_back_to_model() {
        let settings = SettingsCollection::defaults(ModelKind::Immutable);
        let sources = SourceSet::new();
        let model_deprecation = Deprecation {
            since: Some("1.2".to_owned()),
            note: None,
        };
        let resolver = AttributeResolver {
            sources: &sources,
            settings: &settings,
            kind: ModelKind::Immutable,
            deprecation: Some(&model_deprecation),
        };

        let plain = getter("name", method("get_name", "String"));
        assert_eq!(
            resolver.build("name", &plain).unwrap().deprecation,
            Some(model_deprecation.clone())
        );

        let mut decl = method("get_age", "u8");
        decl.deprecation = Some(Deprecation {
            since: None,
            note: Some("use birthday".to_owned()),
        });
        let own = getter("age", decl);
        assert_eq!(
            resolver.build("age", &own).unwrap().deprecation.and_then(|d| d.note),
            Some("use birthday".to_owned())
        );
    }

    #[test]
    fn test_keyword_attribute_is_escaped() {
        let settings = SettingsCollection::defaults(ModelKind::Immutable);
        let attribute = resolve(
            ModelKind::Immutable,
            &settings,
            &getter("type", method("get_type", "String")),
        );
        assert_eq!(attribute.name, "type");
        assert_eq!(attribute.identifier, "r#type");
    }

    #[test]
    fn test_identifier_collisions_are_reported() {
        let settings = SettingsCollection::defaults(ModelKind::Immutable);
        let sources = SourceSet::new();
        let mut classification = MethodClassification::new();
        classification
            .add_getter(getter("userName", method("getUserName", "String")))
            .unwrap();
        classification
            .add_getter(getter("user_name", method("get_user_name", "String")))
            .unwrap();
        let diagnostics = AttributeResolver {
            sources: &sources,
            settings: &settings,
            kind: ModelKind::Immutable,
            deprecation: None,
        }
        .build_all(&classification)
        .unwrap_err();
        assert_eq!(
            diagnostics.iter().next().unwrap().message,
            "attributes `userName` and `user_name` both map to the field `user_name`"
        );
    }
}
