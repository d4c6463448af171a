//! Assembles one model descriptor from a model trait.

use forma_ir::{
    AttributeSet, BuilderKind, BuilderStrategy, Diagnostic, Diagnostics, InterfaceDecl,
    ModelAnnotation, ModelDescriptor, ModulePath, QualifiedName, Setting, SettingsCollection,
    SourceSet,
};
use tracing::{debug, instrument};

use crate::attribute::AttributeResolver;
use crate::builder::{dedicated_stage_name, final_stage_name, select_strategy};
use crate::error::{ModelError, interface_origin, method_origin};
use crate::naming::{
    NamingError, prefixed_method, substitute_package_wildcard, substitute_wildcard,
    validate_class_name, validate_package_name,
};
use crate::settings;

/// Runs the whole pipeline for one model trait.
///
/// Stops at the first failing step. Problems found within a step are all
/// reported together.
#[instrument(skip_all, fields(model = %interface.name))]
pub fn assemble(
    sources: &SourceSet,
    interface: &InterfaceDecl,
    annotation: &ModelAnnotation,
) -> Result<ModelDescriptor, ModelError> {
    let fail = |diagnostics: Diagnostics| ModelError::new(interface.name.clone(), diagnostics);

    let settings = settings::resolve(sources, interface, annotation);
    let name = generated_name(sources, interface, &settings).map_err(fail)?;
    debug!(generated = %name, "resolved generated type name");

    let classification =
        crate::classify::classify(sources, interface, &settings).map_err(fail)?;
    let attributes = AttributeResolver {
        sources,
        settings: &settings,
        kind: annotation.kind,
        deprecation: interface.deprecation.as_ref(),
    }
    .build_all(&classification)
    .map_err(fail)?;
    let builder = select_strategy(&settings, &name.name);
    if let Some(strategy) = &builder {
        builder_clashes(sources, interface, &settings, &name.name, strategy, &attributes)
            .into_result(())
            .map_err(fail)?;
    }
    debug!(
        attributes = attributes.len(),
        builder = ?builder.as_ref().map(|b| b.kind),
        "assembled model"
    );

    Ok(ModelDescriptor::builder()
        .name(name)
        .interface(interface.name.clone())
        .kind(annotation.kind)
        .settings(settings)
        .classification(classification)
        .attributes(attributes)
        .maybe_builder(builder)
        .maybe_deprecation(interface.deprecation.clone())
        .build())
}

fn generated_name(
    sources: &SourceSet,
    interface: &InterfaceDecl,
    settings: &forma_ir::SettingsCollection,
) -> Result<QualifiedName, Diagnostics> {
    let package = substitute_package_wildcard(
        settings.package_name.value(),
        &interface.name.package.to_string(),
    );
    let class_name = substitute_wildcard(settings.class_name.value(), &interface.name.name);

    let mut diagnostics = Diagnostics::new();
    let mut check = |result: Result<(), NamingError>, setting: &Setting<String>| {
        if let Err(err) = result {
            diagnostics.push(Diagnostic::error(
                format!("{err} (from {})", setting.description()),
                interface_origin(sources, interface).with_setting(setting.description()),
            ));
        }
    };
    check(validate_package_name(&package), &settings.package_name);
    check(validate_class_name(&class_name), &settings.class_name);
    diagnostics.into_result(QualifiedName::new(ModulePath::parse(&package), class_name))
}

/// Names the builder claims for itself that an attribute or the model
/// already uses.
fn builder_clashes(
    sources: &SourceSet,
    interface: &InterfaceDecl,
    settings: &SettingsCollection,
    class_name: &str,
    strategy: &BuilderStrategy,
    attributes: &AttributeSet,
) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    let bare = |identifier: &str| identifier.trim_start_matches("r#").to_owned();

    let build = &settings.build_method_name;
    for attribute in attributes.iter() {
        if bare(&attribute.identifier) == *build.value() {
            diagnostics.push(Diagnostic::error(
                format!(
                    "attribute `{}` clashes with the builder method `{}` (from {})",
                    attribute.name,
                    build.value(),
                    build.description()
                ),
                method_origin(sources, &attribute.getter).with_setting(build.description()),
            ));
        }
    }

    if strategy.kind == BuilderKind::Staged {
        let final_stage = final_stage_name(class_name);
        for attribute in attributes.mandatory() {
            if dedicated_stage_name(class_name, &attribute.name) == final_stage {
                diagnostics.push(Diagnostic::error(
                    format!(
                        "attribute `{}` would name its builder stage `{final_stage}`, \
                         which is taken by the final stage",
                        attribute.name
                    ),
                    method_origin(sources, &attribute.getter),
                ));
            }
        }
    }

    let entry = &settings.builder_method_name;
    let setter_prefix = settings.setter_prefix.value();
    let mut taken = vec!["new".to_owned()];
    if strategy.to_builder {
        taken.push("to_builder".to_owned());
    }
    taken.extend(
        attributes
            .iter()
            .filter(|a| a.setter)
            .map(|a| prefixed_method(setter_prefix, &a.identifier)),
    );
    if taken.contains(entry.value()) {
        diagnostics.push(Diagnostic::error(
            format!(
                "builder method `{}` clashes with a method of the generated type (from {})",
                entry.value(),
                entry.description()
            ),
            interface_origin(sources, interface).with_setting(entry.description()),
        ));
    }
    diagnostics
}
