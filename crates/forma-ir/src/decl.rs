//! Declarations read from model definition sources.
//!
//! These are detached snapshots of the host's syntax: the pipeline only ever
//! sees names, rendered types, receivers and markers, never parser state.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::attribute::{Deprecation, FeatureMarkers, Visibility};
use crate::settings::SettingsFragment;

/// A `::`-separated module path. The empty path is the root package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parses `a::b::c`. Empty segments are dropped, so `""` is the root.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split("::")
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("::"))
    }
}

/// A type name qualified by the package that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub package: ModulePath,
    pub name: String,
}

impl QualifiedName {
    pub fn new(package: ModulePath, name: impl Into<String>) -> Self {
        Self {
            package,
            name: name.into(),
        }
    }

    /// Parses `a::b::Name`; the last segment is the name.
    pub fn parse(path: &str) -> Self {
        let mut segments = ModulePath::parse(path).0;
        let name = segments.pop().unwrap_or_default();
        Self {
            package: ModulePath(segments),
            name,
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_root() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}::{}", self.package, self.name)
        }
    }
}

/// Line and column (1-based line, 0-based column) of a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
}

impl SourceSpan {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column + 1)
    }
}

/// Whether a model generates an immutable or a mutable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Immutable,
    Mutable,
}

impl ModelKind {
    pub fn is_mutable(self) -> bool {
        matches!(self, ModelKind::Mutable)
    }

    /// The attribute that marks a trait as this kind of model.
    pub fn annotation_name(self) -> &'static str {
        match self {
            ModelKind::Immutable => "immutable_model",
            ModelKind::Mutable => "mutable_model",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.annotation_name())
    }
}

/// The `#[immutable_model]` / `#[mutable_model]` attribute on a trait.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAnnotation {
    pub kind: ModelKind,
    /// Settings nested directly inside the annotation.
    pub settings: Option<SettingsFragment>,
    pub span: Option<SourceSpan>,
}

impl ModelAnnotation {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            settings: None,
            span: None,
        }
    }
}

/// A type as written in the source, with whitespace normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(String);

const PRIMITIVE_SCALARS: &[&str] = &[
    "bool", "char", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128",
    "isize", "f32", "f64",
];

const OPTION_PREFIXES: &[&str] = &[
    "Option<",
    "option::Option<",
    "std::option::Option<",
    "core::option::Option<",
    "::std::option::Option<",
    "::core::option::Option<",
];

impl TypeRef {
    /// Creates a type reference from any rendering of the type, such as a
    /// token stream's `to_string()`.
    pub fn new(rendered: impl AsRef<str>) -> Self {
        Self(normalize_type(rendered.as_ref()))
    }

    pub fn unit() -> Self {
        Self("()".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unit(&self) -> bool {
        self.0 == "()"
    }

    pub fn is_bool(&self) -> bool {
        matches!(
            self.0.as_str(),
            "bool" | "core::primitive::bool" | "std::primitive::bool"
        )
    }

    pub fn is_option(&self) -> bool {
        OPTION_PREFIXES
            .iter()
            .any(|prefix| self.0.starts_with(prefix) && self.0.ends_with('>'))
    }

    /// Primitive scalars whose zero value is a usable default.
    pub fn is_primitive_scalar(&self) -> bool {
        PRIMITIVE_SCALARS.contains(&self.0.as_str())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_type(raw: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && out.chars().last().is_some_and(is_word) && is_word(ch) {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out
}

/// How a method takes `self`, if at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// No receiver: an associated (static) function.
    None,
    Ref,
    RefMut,
    Value,
    /// `self` with any other written type, e.g. `self: Box<Self>`.
    Typed(TypeRef),
}

impl Receiver {
    fn render(&self) -> Option<String> {
        match self {
            Receiver::None => None,
            Receiver::Ref => Some("&self".to_owned()),
            Receiver::RefMut => Some("&mut self".to_owned()),
            Receiver::Value => Some("self".to_owned()),
            Receiver::Typed(ty) => Some(format!("self: {ty}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A method declared in a trait.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct MethodDecl {
    #[builder(into)]
    pub name: String,
    #[builder(default = Receiver::Ref)]
    pub receiver: Receiver,
    #[builder(default)]
    pub params: Vec<ParamDecl>,
    /// `None` when the method has no return type.
    pub return_type: Option<TypeRef>,
    /// Generic parameters as written, e.g. `T: Clone`.
    #[builder(default)]
    pub generics: Vec<String>,
    /// The trait already provides a body for this method.
    #[builder(default)]
    pub has_default_body: bool,
    #[builder(default)]
    pub markers: FeatureMarkers,
    /// Explicit `#[forma(visibility = "...")]` marker.
    pub visibility: Option<Visibility>,
    pub deprecation: Option<Deprecation>,
    pub span: Option<SourceSpan>,
}

impl MethodDecl {
    pub fn is_static(&self) -> bool {
        self.receiver == Receiver::None
    }

    pub fn returns_value(&self) -> bool {
        self.return_type.as_ref().is_some_and(|ty| !ty.is_unit())
    }

    /// Name and parameter types: two methods with the same key override one
    /// another.
    pub fn override_key(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.ty.as_str()).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// Human readable signature used in diagnostics.
    pub fn signature(&self) -> String {
        let generics = if self.generics.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.generics.join(", "))
        };
        let inputs: Vec<String> = self
            .receiver
            .render()
            .into_iter()
            .chain(self.params.iter().map(|p| format!("{}: {}", p.name, p.ty)))
            .collect();
        let output = match &self.return_type {
            Some(ty) => format!(" -> {ty}"),
            None => String::new(),
        };
        format!("fn {}{generics}({}){output}", self.name, inputs.join(", "))
    }
}

/// A method together with the trait that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredMethod {
    pub declared_in: QualifiedName,
    pub method: MethodDecl,
}

impl DeclaredMethod {
    pub fn new(declared_in: QualifiedName, method: MethodDecl) -> Self {
        Self {
            declared_in,
            method,
        }
    }
}

/// A supertrait bound as written, and the trait it names if that trait is
/// part of the source set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperTrait {
    pub path: String,
    pub resolved: Option<QualifiedName>,
}

impl SuperTrait {
    pub fn unresolved(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            resolved: None,
        }
    }

    pub fn resolved(name: QualifiedName) -> Self {
        Self {
            path: name.to_string(),
            resolved: Some(name),
        }
    }
}

/// A trait declaration.
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct InterfaceDecl {
    pub name: QualifiedName,
    #[builder(default)]
    pub supertraits: Vec<SuperTrait>,
    #[builder(default)]
    pub methods: Vec<MethodDecl>,
    /// Present when the trait is a model interface.
    pub model: Option<ModelAnnotation>,
    /// `#[settings(...)]` on the trait itself.
    pub settings: Option<SettingsFragment>,
    pub deprecation: Option<Deprecation>,
    pub span: Option<SourceSpan>,
}

/// Package-level declarations: the inner attributes of a module file.
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct PackageDecl {
    pub path: ModulePath,
    pub file: Option<PathBuf>,
    /// `#![settings(...)]`
    pub settings: Option<SettingsFragment>,
    /// `#![immutable_model(settings(...))]`
    pub immutable_settings: Option<SettingsFragment>,
    /// `#![mutable_model(settings(...))]`
    pub mutable_settings: Option<SettingsFragment>,
}

impl PackageDecl {
    pub fn model_settings(&self, kind: ModelKind) -> Option<&SettingsFragment> {
        match kind {
            ModelKind::Immutable => self.immutable_settings.as_ref(),
            ModelKind::Mutable => self.mutable_settings.as_ref(),
        }
    }
}

/// Every package and trait known to one processing round.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    packages: IndexMap<ModulePath, PackageDecl>,
    interfaces: IndexMap<QualifiedName, InterfaceDecl>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a package, returning any package previously registered at the
    /// same path.
    pub fn add_package(&mut self, package: PackageDecl) -> Option<PackageDecl> {
        self.packages.insert(package.path.clone(), package)
    }

    /// Adds a trait, returning any trait previously registered under the same
    /// qualified name.
    pub fn add_interface(&mut self, interface: InterfaceDecl) -> Option<InterfaceDecl> {
        self.interfaces.insert(interface.name.clone(), interface)
    }

    pub fn package(&self, path: &ModulePath) -> Option<&PackageDecl> {
        self.packages.get(path)
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageDecl> {
        self.packages.values()
    }

    pub fn interface(&self, name: &QualifiedName) -> Option<&InterfaceDecl> {
        self.interfaces.get(name)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceDecl> {
        self.interfaces.values()
    }

    pub fn interfaces_mut(&mut self) -> impl Iterator<Item = &mut InterfaceDecl> {
        self.interfaces.values_mut()
    }

    /// Traits carrying a model annotation, in declaration order.
    pub fn models(&self) -> impl Iterator<Item = &InterfaceDecl> {
        self.interfaces.values().filter(|i| i.model.is_some())
    }

    /// The file a package was read from, if any.
    pub fn file_of(&self, package: &ModulePath) -> Option<&PathBuf> {
        self.packages.get(package).and_then(|p| p.file.as_ref())
    }
}
