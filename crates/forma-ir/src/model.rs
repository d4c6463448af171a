use indexmap::IndexMap;

use crate::attribute::{AttributeSet, Deprecation};
use crate::builder::BuilderStrategy;
use crate::decl::{DeclaredMethod, ModelKind, ModulePath, QualifiedName};
use crate::settings::SettingsCollection;

/// A method accepted as the getter of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedGetter {
    /// Attribute name derived from the method name.
    pub attribute: String,
    pub method: DeclaredMethod,
    /// Matched the boolean getter prefix.
    pub boolean: bool,
}

/// The reachable methods of a model trait, sorted into getters and utility
/// methods. Only successful classifications exist; rejected methods are
/// reported as diagnostics instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodClassification {
    getters: IndexMap<String, ClassifiedGetter>,
    utilities: Vec<DeclaredMethod>,
}

impl MethodClassification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a getter, handing back the getter already registered for
    /// the same attribute, if any. The existing getter is kept.
    pub fn add_getter(&mut self, getter: ClassifiedGetter) -> Result<(), ClassifiedGetter> {
        if let Some(existing) = self.getters.get(&getter.attribute) {
            return Err(existing.clone());
        }
        self.getters.insert(getter.attribute.clone(), getter);
        Ok(())
    }

    pub fn add_utility(&mut self, method: DeclaredMethod) {
        self.utilities.push(method);
    }

    pub fn getter(&self, attribute: &str) -> Option<&ClassifiedGetter> {
        self.getters.get(attribute)
    }

    /// Getters in the order they were discovered.
    pub fn getters(&self) -> impl Iterator<Item = &ClassifiedGetter> {
        self.getters.values()
    }

    pub fn boolean_getters(&self) -> impl Iterator<Item = &ClassifiedGetter> {
        self.getters().filter(|g| g.boolean)
    }

    /// Static and default-bodied methods. These are left to the trait.
    pub fn utilities(&self) -> &[DeclaredMethod] {
        &self.utilities
    }

    pub fn is_empty(&self) -> bool {
        self.getters.is_empty() && self.utilities.is_empty()
    }
}

/// One model ready for generation.
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct ModelDescriptor {
    /// Package and name of the generated type.
    pub name: QualifiedName,
    /// The model trait the generated type implements.
    pub interface: QualifiedName,
    pub kind: ModelKind,
    pub settings: SettingsCollection,
    pub classification: MethodClassification,
    pub attributes: AttributeSet,
    pub builder: Option<BuilderStrategy>,
    pub deprecation: Option<Deprecation>,
}

impl ModelDescriptor {
    pub fn package(&self) -> &ModulePath {
        &self.name.package
    }

    pub fn class_name(&self) -> &str {
        &self.name.name
    }

    pub fn is_mutable(&self) -> bool {
        self.kind.is_mutable()
    }
}
