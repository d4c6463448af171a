//! Sorts the methods reachable from a model trait into getters and utility
//! methods.

use forma_ir::{
    ClassifiedGetter, DeclaredMethod, Diagnostic, Diagnostics, InterfaceDecl,
    MethodClassification, SettingsCollection, SourceSet, TypeRef,
};
use tracing::trace;

use crate::error::method_origin;
use crate::hierarchy::reachable_methods;
use crate::naming::strip_prefix;
use crate::outcome::Outcome;

struct Classifier<'a> {
    sources: &'a SourceSet,
    interface: &'a InterfaceDecl,
    settings: &'a SettingsCollection,
    classification: MethodClassification,
    diagnostics: Diagnostics,
}

/// Classifies every reachable method of `interface`.
///
/// Every method is examined even after a failure, so the returned batch
/// holds all problems of the model at once.
pub fn classify(
    sources: &SourceSet,
    interface: &InterfaceDecl,
    settings: &SettingsCollection,
) -> Result<MethodClassification, Diagnostics> {
    let mut classifier = Classifier {
        sources,
        interface,
        settings,
        classification: MethodClassification::new(),
        diagnostics: Diagnostics::new(),
    };
    for method in reachable_methods(sources, interface) {
        classifier.classify_method(method);
    }
    let Classifier {
        classification,
        diagnostics,
        ..
    } = classifier;
    diagnostics.into_result(classification)
}

impl Classifier<'_> {
    fn classify_method(&mut self, method: DeclaredMethod) {
        if method.method.has_default_body {
            trace!(method = %method.method.name, "utility method");
            self.classification.add_utility(method);
            return;
        }
        if let Some(reason) = unimplementable_reason(&method) {
            self.fail(
                &method,
                format!(
                    "`{}` in `{}` cannot be implemented: {reason}",
                    method.method.signature(),
                    method.declared_in
                ),
            );
            return;
        }

        let outcome = self
            .boolean_attribute(&method)
            .or_else(|| self.plain_attribute(&method));
        match outcome {
            Outcome::Ok((attribute, boolean)) => self.add_getter(attribute, method, boolean),
            Outcome::Skip => {
                let prefix = self.settings.getter_prefix.value();
                self.fail(
                    &method,
                    format!(
                        "`{}` in `{}` cannot be implemented: its name does not start with the getter prefix `{prefix}` ({})",
                        method.method.signature(),
                        self.interface.name,
                        self.settings.getter_prefix.description(),
                    ),
                );
            }
            Outcome::Fail => {}
        }
    }

    fn boolean_attribute(&mut self, method: &DeclaredMethod) -> Outcome<(String, bool)> {
        let prefix = self.settings.boolean_getter_prefix.value();
        let Some(attribute) = strip_prefix(&method.method.name, prefix) else {
            return Outcome::Skip;
        };
        if self.returns_boolean(method) {
            trace!(method = %method.method.name, %attribute, "boolean getter");
            return Outcome::Ok((attribute, true));
        }
        if prefix.is_empty() {
            // Fluent naming: anything that is not boolean is a plain getter.
            return Outcome::Skip;
        }
        let return_type = method
            .method
            .return_type
            .as_ref()
            .map(TypeRef::to_string)
            .unwrap_or_default();
        self.fail(
            method,
            format!(
                "`{}` looks like a boolean getter ({}) but returns `{return_type}`; \
                 boolean getters must return `bool` or one of {:?} ({}). \
                 Rename it to use the getter prefix `{}` ({})",
                method.method.signature(),
                self.settings.boolean_getter_prefix.description(),
                self.settings.boolean_types.value(),
                self.settings.boolean_types.description(),
                self.settings.getter_prefix.value(),
                self.settings.getter_prefix.description(),
            ),
        );
        Outcome::Fail
    }

    fn plain_attribute(&self, method: &DeclaredMethod) -> Outcome<(String, bool)> {
        let prefix = self.settings.getter_prefix.value();
        Outcome::from(strip_prefix(&method.method.name, prefix)).map(|attribute| {
            trace!(method = %method.method.name, %attribute, "getter");
            (attribute, false)
        })
    }

    fn returns_boolean(&self, method: &DeclaredMethod) -> bool {
        let Some(return_type) = &method.method.return_type else {
            return false;
        };
        return_type.is_bool()
            || self
                .settings
                .boolean_types
                .value()
                .iter()
                .any(|ty| TypeRef::new(ty) == *return_type)
    }

    fn add_getter(&mut self, attribute: String, method: DeclaredMethod, boolean: bool) {
        let getter = ClassifiedGetter {
            attribute,
            method,
            boolean,
        };
        if let Err(existing) = self.classification.add_getter(getter.clone()) {
            self.fail(
                &getter.method,
                format!(
                    "attribute `{}` is already defined by `{}` in `{}`; `{}` in `{}` resolves to the same attribute",
                    getter.attribute,
                    existing.method.method.signature(),
                    existing.method.declared_in,
                    getter.method.method.signature(),
                    getter.method.declared_in,
                ),
            );
        }
    }

    fn fail(&mut self, method: &DeclaredMethod, message: String) {
        self.diagnostics
            .push(Diagnostic::error(message, method_origin(self.sources, method)));
    }
}

fn unimplementable_reason(method: &DeclaredMethod) -> Option<&'static str> {
    if method.method.is_static() {
        Some("associated functions need a default body")
    } else if !method.method.params.is_empty() {
        Some("getters cannot take parameters")
    } else if !method.method.returns_value() {
        Some("getters must return a value")
    } else if !method.method.generics.is_empty() {
        Some("getters cannot be generic")
    } else {
        None
    }
}
