use forma_ir::{DeclaredMethod, Diagnostics, InterfaceDecl, Origin, QualifiedName, SourceSet};

/// A model whose pipeline stopped, with every problem found on the way.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("model `{model}` has {} error(s)", diagnostics.error_count())]
pub struct ModelError {
    pub model: QualifiedName,
    pub diagnostics: Diagnostics,
}

impl ModelError {
    pub fn new(model: QualifiedName, diagnostics: impl Into<Diagnostics>) -> Self {
        Self {
            model,
            diagnostics: diagnostics.into(),
        }
    }
}

pub(crate) fn interface_origin(sources: &SourceSet, interface: &InterfaceDecl) -> Origin {
    Origin::new(interface.name.to_string())
        .with_span(interface.span)
        .with_file(sources.file_of(&interface.name.package).cloned())
}

pub(crate) fn method_origin(sources: &SourceSet, method: &DeclaredMethod) -> Origin {
    Origin::new(format!("{}::{}", method.declared_in, method.method.name))
        .with_span(method.method.span)
        .with_file(sources.file_of(&method.declared_in.package).cloned())
}
