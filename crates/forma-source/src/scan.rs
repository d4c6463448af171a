//! Walks parsed source files and records packages and traits.

use std::fs;
use std::path::{Path, PathBuf};

use darling::{FromAttributes as _, FromMeta as _};
use forma_ir::{
    Diagnostic, Diagnostics, FragmentOrigin, FragmentSite, InterfaceDecl, MethodDecl,
    ModelAnnotation, ModelKind, ModulePath, Origin, PackageDecl, ParamDecl, QualifiedName,
    Receiver, SettingsFragment, SourceSet, SourceSpan, SuperTrait, TypeRef,
};
use quote::ToTokens as _;
use syn::spanned::Spanned;
use tracing::{debug, trace};

use crate::SourceError;
use crate::attrs::{MethodArgs, ModelArgs, SettingsArgs, is_attr, parse_deprecation};
use crate::package::package_path;
use crate::resolve::resolve_supertraits;

/// A scanned source set and the problems found while reading it.
#[derive(Debug, Default)]
pub struct Scan {
    pub sources: SourceSet,
    pub diagnostics: Diagnostics,
}

/// Collects model definitions from any number of files, then resolves
/// supertraits across all of them in [`SourceScanner::finish`].
#[derive(Debug, Default)]
pub struct SourceScanner {
    sources: SourceSet,
    diagnostics: Diagnostics,
}

impl SourceScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans every `.rs` file below `root`.
    pub fn scan_dir(root: &Path) -> Result<Scan, SourceError> {
        let mut scanner = Self::new();
        scanner.add_dir(root)?;
        Ok(scanner.finish())
    }

    /// Adds every `.rs` file below `root`, returning how many were read.
    pub fn add_dir(&mut self, root: &Path) -> Result<usize, SourceError> {
        let pattern = root.join("**").join("*.rs");
        let mut paths = glob::glob(&pattern.to_string_lossy())?.collect::<Result<Vec<_>, _>>()?;
        paths.sort();
        for path in &paths {
            let relative = path.strip_prefix(root).map_err(|_| SourceError::InvalidPath {
                path: path.clone(),
            })?;
            self.add_file(path, package_path(relative)?)?;
        }
        debug!(root = %root.display(), files = paths.len(), "scanned source directory");
        Ok(paths.len())
    }

    pub fn add_file(&mut self, path: &Path, package: ModulePath) -> Result<(), SourceError> {
        let source = fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_source(package, Some(path.to_path_buf()), &source);
        Ok(())
    }

    /// Parses `source` as the contents of `package`. Syntax errors become
    /// diagnostics.
    pub fn add_source(&mut self, package: ModulePath, file: Option<PathBuf>, source: &str) {
        match syn::parse_file(source) {
            Ok(ast) => self.add_ast(package, file, &ast),
            Err(err) => {
                let origin = Origin::new(package.to_string())
                    .with_span(Some(span_of(err.span())))
                    .with_file(file);
                self.diagnostics
                    .push(Diagnostic::error(format!("syntax error: {err}"), origin));
            }
        }
    }

    pub fn add_ast(&mut self, package: ModulePath, file: Option<PathBuf>, ast: &syn::File) {
        FileReader {
            scanner: self,
            file,
        }
        .read_module(package, &ast.attrs, &ast.items);
    }

    pub fn finish(mut self) -> Scan {
        resolve_supertraits(&mut self.sources, &mut self.diagnostics);
        debug!(
            packages = self.sources.packages().count(),
            traits = self.sources.interfaces().count(),
            models = self.sources.models().count(),
            "finished scan"
        );
        Scan {
            sources: self.sources,
            diagnostics: self.diagnostics,
        }
    }
}

struct FileReader<'a> {
    scanner: &'a mut SourceScanner,
    file: Option<PathBuf>,
}

impl FileReader<'_> {
    fn read_module(&mut self, package: ModulePath, attrs: &[syn::Attribute], items: &[syn::Item]) {
        let declared = self.read_package(&package, attrs);
        if let Some(previous) = self.scanner.sources.add_package(declared) {
            self.error(
                &package.to_string(),
                None,
                format!(
                    "package `{package}` is declared more than once (also in {})",
                    previous
                        .file
                        .as_ref()
                        .map(|file| file.display().to_string())
                        .unwrap_or_else(|| "an inline source".to_owned())
                ),
            );
        }

        for item in items {
            match item {
                syn::Item::Trait(item) => {
                    let interface = self.read_trait(&package, item);
                    trace!(name = %interface.name, model = interface.model.is_some(), "read trait");
                    self.scanner.sources.add_interface(interface);
                }
                syn::Item::Mod(module) => {
                    if let Some((_, items)) = &module.content {
                        let inner = package.join(module.ident.to_string());
                        self.read_module(inner, &module.attrs, items);
                    }
                }
                _ => {}
            }
        }
    }

    fn read_package(&mut self, package: &ModulePath, attrs: &[syn::Attribute]) -> PackageDecl {
        let mut settings = None;
        let mut immutable_settings = None;
        let mut mutable_settings = None;
        let element = package.to_string();

        for attr in attrs
            .iter()
            .filter(|attr| matches!(attr.style, syn::AttrStyle::Inner(_)))
        {
            if is_attr(attr, "settings") {
                let origin = FragmentOrigin::new(FragmentSite::Package(package.clone()))
                    .at(span_of(attr.span()));
                let fragment = self.settings_fragment(&element, attr, origin);
                self.set_once(&mut settings, fragment, &element, attr, "#![settings]");
            } else if let Some(kind) = ModelArgs::kind_of(attr) {
                let origin = FragmentOrigin::new(FragmentSite::PackageModel {
                    package: package.clone(),
                    kind,
                })
                .at(span_of(attr.span()));
                let fragment = self.model_settings(&element, attr, origin);
                let (slot, label) = match kind {
                    ModelKind::Immutable => (&mut immutable_settings, "#![immutable_model]"),
                    ModelKind::Mutable => (&mut mutable_settings, "#![mutable_model]"),
                };
                self.set_once(slot, fragment, &element, attr, label);
            }
        }

        PackageDecl::builder()
            .path(package.clone())
            .maybe_file(self.file.clone())
            .maybe_settings(settings)
            .maybe_immutable_settings(immutable_settings)
            .maybe_mutable_settings(mutable_settings)
            .build()
    }

    fn read_trait(&mut self, package: &ModulePath, item: &syn::ItemTrait) -> InterfaceDecl {
        let name = QualifiedName::new(package.clone(), item.ident.to_string());
        let element = name.to_string();
        let span = span_of(item.ident.span());

        let mut model = None;
        let mut settings = None;
        for attr in &item.attrs {
            if let Some(kind) = ModelArgs::kind_of(attr) {
                if model.is_some() {
                    self.error(
                        &element,
                        Some(span_of(attr.span())),
                        "a trait can carry only one model attribute".to_owned(),
                    );
                    continue;
                }
                let origin = FragmentOrigin::new(FragmentSite::ModelAnnotation {
                    interface: name.clone(),
                    kind,
                })
                .at(span_of(attr.span()));
                model = Some(ModelAnnotation {
                    kind,
                    settings: self.model_settings(&element, attr, origin),
                    span: Some(span_of(attr.span())),
                });
            } else if is_attr(attr, "settings") {
                let origin = FragmentOrigin::new(FragmentSite::Interface(name.clone()))
                    .at(span_of(attr.span()));
                let fragment = self.settings_fragment(&element, attr, origin);
                self.set_once(&mut settings, fragment, &element, attr, "#[settings]");
            }
        }

        if model.is_some() && !item.generics.params.is_empty() {
            self.error(
                &element,
                Some(span),
                "model traits cannot have generic parameters".to_owned(),
            );
            model = None;
        }

        let deprecation = self.darling(&element, Some(span), parse_deprecation(&item.attrs));
        let supertraits = item
            .supertraits
            .iter()
            .filter_map(|bound| match bound {
                syn::TypeParamBound::Trait(bound) => Some(SuperTrait::unresolved(path_string(&bound.path))),
                _ => None,
            })
            .collect();
        let methods = item
            .items
            .iter()
            .filter_map(|item| match item {
                syn::TraitItem::Fn(method) => Some(self.read_method(&name, method)),
                _ => None,
            })
            .collect();

        InterfaceDecl::builder()
            .name(name)
            .supertraits(supertraits)
            .methods(methods)
            .maybe_model(model)
            .maybe_settings(settings)
            .maybe_deprecation(deprecation.flatten())
            .span(span)
            .build()
    }

    fn read_method(&mut self, interface: &QualifiedName, method: &syn::TraitItemFn) -> MethodDecl {
        let sig = &method.sig;
        let element = format!("{interface}::{}", sig.ident);
        let span = span_of(sig.ident.span());

        let receiver = match sig.receiver() {
            None => Receiver::None,
            Some(receiver) if receiver.colon_token.is_some() => match receiver.ty.as_ref() {
                ty if is_self(ty) => Receiver::Value,
                syn::Type::Reference(reference) if is_self(&reference.elem) => {
                    if reference.mutability.is_some() {
                        Receiver::RefMut
                    } else {
                        Receiver::Ref
                    }
                }
                ty => Receiver::Typed(type_ref(ty)),
            },
            Some(receiver) => match (&receiver.reference, &receiver.mutability) {
                (Some(_), Some(_)) => Receiver::RefMut,
                (Some(_), None) => Receiver::Ref,
                (None, _) => Receiver::Value,
            },
        };
        let params = sig
            .inputs
            .iter()
            .filter_map(|input| match input {
                syn::FnArg::Typed(typed) => Some(ParamDecl::new(
                    match typed.pat.as_ref() {
                        syn::Pat::Ident(pat) => pat.ident.to_string(),
                        _ => "_".to_owned(),
                    },
                    type_ref(&typed.ty),
                )),
                syn::FnArg::Receiver(_) => None,
            })
            .collect();
        let return_type = match &sig.output {
            syn::ReturnType::Default => None,
            syn::ReturnType::Type(_, ty) => Some(type_ref(ty)),
        };
        let generics = sig
            .generics
            .params
            .iter()
            .map(|param| param.to_token_stream().to_string())
            .collect();

        let args = self
            .darling(&element, Some(span), MethodArgs::from_attributes(&method.attrs))
            .unwrap_or_default();
        let markers = self
            .darling(&element, Some(span), args.markers())
            .unwrap_or_default();
        let deprecation = self
            .darling(&element, Some(span), parse_deprecation(&method.attrs))
            .flatten();

        MethodDecl::builder()
            .name(sig.ident.to_string())
            .receiver(receiver)
            .params(params)
            .maybe_return_type(return_type)
            .generics(generics)
            .has_default_body(method.default.is_some())
            .markers(markers)
            .maybe_visibility(args.visibility())
            .maybe_deprecation(deprecation)
            .span(span)
            .build()
    }

    fn settings_fragment(
        &mut self,
        element: &str,
        attr: &syn::Attribute,
        origin: FragmentOrigin,
    ) -> Option<SettingsFragment> {
        let span = Some(span_of(attr.span()));
        self.darling(element, span, SettingsArgs::from_meta(&attr.meta))
            .map(|args| args.into_fragment(origin))
    }

    fn model_settings(
        &mut self,
        element: &str,
        attr: &syn::Attribute,
        origin: FragmentOrigin,
    ) -> Option<SettingsFragment> {
        let span = Some(span_of(attr.span()));
        self.darling(element, span, ModelArgs::from_attribute(attr))
            .and_then(|args| args.settings)
            .map(|args| args.into_fragment(origin))
    }

    fn set_once(
        &mut self,
        slot: &mut Option<SettingsFragment>,
        fragment: Option<SettingsFragment>,
        element: &str,
        attr: &syn::Attribute,
        label: &str,
    ) {
        if slot.is_some() {
            self.error(
                element,
                Some(span_of(attr.span())),
                format!("{label} may appear only once"),
            );
        } else {
            *slot = fragment;
        }
    }

    /// Records every error in `result` as a diagnostic.
    fn darling<T>(
        &mut self,
        element: &str,
        span: Option<SourceSpan>,
        result: darling::Result<T>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(errors) => {
                for err in errors {
                    self.error(element, span, err.to_string());
                }
                None
            }
        }
    }

    fn error(&mut self, element: &str, span: Option<SourceSpan>, message: String) {
        let origin = Origin::new(element)
            .with_span(span)
            .with_file(self.file.clone());
        self.scanner.diagnostics.push(Diagnostic::error(message, origin));
    }
}

fn span_of(span: proc_macro2::Span) -> SourceSpan {
    let start = span.start();
    SourceSpan::new(start.line, start.column)
}

fn is_self(ty: &syn::Type) -> bool {
    matches!(ty, syn::Type::Path(path) if path.qself.is_none() && path.path.is_ident("Self"))
}

fn type_ref(ty: &syn::Type) -> TypeRef {
    TypeRef::new(ty.to_token_stream().to_string())
}

fn path_string(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

#[cfg(test)]
mod tests {
    use forma_ir::{BuilderKind, Feature, Marker, Visibility};
    use pretty_assertions::assert_eq;
    use syn::parse_quote;

    use super::*;

    fn scan(files: Vec<(&str, syn::File)>) -> Scan {
        let mut scanner = SourceScanner::new();
        for (package, file) in files {
            scanner.add_ast(
                ModulePath::parse(package),
                Some(PathBuf::from(format!("{}.rs", package.replace("::", "/")))),
                &file,
            );
        }
        scanner.finish()
    }

    fn interface<'a>(scan: &'a Scan, name: &str) -> &'a InterfaceDecl {
        scan.sources.interface(&QualifiedName::parse(name)).unwrap()
    }

    #[test]
    fn test_reads_model_trait() {
        let scan = scan(vec![(
            "models",
            parse_quote! {
                #[immutable_model(settings(builder = "staged"))]
                #[deprecated(note = "use Account")]
                pub trait User {
                    fn get_name(&self) -> String;
                    #[forma(include(setter), visibility = "pub")]
                    fn get_tags(&self) -> Vec < String >;
                    fn describe(&self) -> String {
                        self.get_name()
                    }
                    fn create() -> Self;
                }
            },
        )]);
        assert!(scan.diagnostics.is_empty(), "{}", scan.diagnostics);

        let user = interface(&scan, "models::User");
        let model = user.model.as_ref().unwrap();
        assert_eq!(model.kind, ModelKind::Immutable);
        assert_eq!(
            model.settings.as_ref().unwrap().builder,
            Some(BuilderKind::Staged)
        );
        assert_eq!(user.deprecation.as_ref().unwrap().note.as_deref(), Some("use Account"));

        let signatures: Vec<String> = user.methods.iter().map(MethodDecl::signature).collect();
        assert_eq!(
            signatures,
            [
                "fn get_name(&self) -> String",
                "fn get_tags(&self) -> Vec<String>",
                "fn describe(&self) -> String",
                "fn create() -> Self",
            ]
        );
        let tags = &user.methods[1];
        assert_eq!(tags.markers.get(Feature::Setter), Some(Marker::Include));
        assert_eq!(tags.visibility, Some(Visibility::Pub));
        assert!(user.methods[2].has_default_body);
        assert!(user.methods[3].is_static());
    }

    #[test]
    fn test_keeps_written_receiver_types() {
        let scan = scan(vec![(
            "models",
            parse_quote! {
                #[immutable_model]
                pub trait Node {
                    fn get_a(self: Box<Self>) -> String;
                    fn get_b(self: &Self) -> String;
                    fn get_c(self: &'_ mut Self) -> String;
                    fn get_d(self: Self) -> String;
                    fn get_e(mut self) -> String;
                    fn get_f(self: std::rc::Rc<Self>) -> String;
                }
            },
        )]);
        let receivers: Vec<Receiver> = interface(&scan, "models::Node")
            .methods
            .iter()
            .map(|m| m.receiver.clone())
            .collect();
        assert_eq!(
            receivers,
            [
                Receiver::Typed(TypeRef::new("Box<Self>")),
                Receiver::Ref,
                Receiver::RefMut,
                Receiver::Value,
                Receiver::Value,
                Receiver::Typed(TypeRef::new("std::rc::Rc<Self>")),
            ]
        );
        assert_eq!(
            interface(&scan, "models::Node").methods[0].signature(),
            "fn get_a(self: Box<Self>) -> String"
        );
    }

    #[test]
    fn test_reads_package_fragments() {
        let scan = scan(vec![(
            "models",
            parse_quote! {
                #![settings(getter_prefix = "fetch")]
                #![mutable_model(settings(setter_prefix = "with"))]

                #[mutable_model]
                trait Profile {
                    fn fetchUserName(&self) -> String;
                }
            },
        )]);
        assert!(scan.diagnostics.is_empty(), "{}", scan.diagnostics);

        let package = scan.sources.package(&ModulePath::parse("models")).unwrap();
        assert_eq!(package.file, Some(PathBuf::from("models.rs")));
        assert_eq!(
            package.settings.as_ref().unwrap().getter_prefix.as_deref(),
            Some("fetch")
        );
        assert!(package.immutable_settings.is_none());
        let mutable = package.model_settings(ModelKind::Mutable).unwrap();
        assert_eq!(mutable.setter_prefix.as_deref(), Some("with"));
        assert_eq!(
            mutable.origin().site,
            FragmentSite::PackageModel {
                package: ModulePath::parse("models"),
                kind: ModelKind::Mutable,
            }
        );
        assert!(interface(&scan, "models::Profile").model.as_ref().unwrap().settings.is_none());
    }

    #[test]
    fn test_inline_modules_are_packages() {
        let scan = scan(vec![(
            "",
            parse_quote! {
                mod shop {
                    #![settings(class_name = "*Record")]
                    #[immutable_model]
                    trait Order {
                        fn get_id(&self) -> u64;
                    }
                }
            },
        )]);
        let order = interface(&scan, "shop::Order");
        assert!(order.model.is_some());
        assert!(scan.sources.package(&ModulePath::parse("shop")).unwrap().settings.is_some());
        assert!(scan.sources.package(&ModulePath::root()).is_some());
    }

    #[test]
    fn test_malformed_attributes_become_diagnostics() {
        let scan = scan(vec![(
            "models",
            parse_quote! {
                #[immutable_model(settings(builder = "fancy"))]
                #[settings(unknown = 1)]
                trait User {
                    #[forma(include(setter), exclude(setter))]
                    fn get_name(&self) -> String;
                }

                #[immutable_model]
                #[mutable_model]
                trait Twice {}

                #[immutable_model]
                trait Generic<T> {}
            },
        )]);
        let messages: Vec<(&str, &str)> = scan
            .diagnostics
            .iter()
            .map(|d| (d.origin.element.as_str(), d.message.as_str()))
            .collect();
        assert_eq!(messages.len(), 5, "{messages:#?}");
        assert_eq!(messages[0].0, "models::User");
        assert!(messages[0].1.contains("unknown builder `fancy`"));
        assert_eq!(messages[1].0, "models::User");
        assert_eq!(messages[2].0, "models::User::get_name");
        assert!(messages[2].1.contains("both included and excluded"));
        assert_eq!(
            messages[3],
            ("models::Twice", "a trait can carry only one model attribute")
        );
        assert_eq!(
            messages[4],
            ("models::Generic", "model traits cannot have generic parameters")
        );
        assert!(scan.diagnostics.iter().all(|d| d.origin.file == Some(PathBuf::from("models.rs"))));

        // Malformed settings are dropped, the model itself is kept.
        let user = interface(&scan, "models::User");
        assert!(user.model.as_ref().unwrap().settings.is_none());
        assert!(user.settings.is_none());
        assert!(interface(&scan, "models::Generic").model.is_none());
    }

    #[test]
    fn test_syntax_errors_become_diagnostics() {
        let mut scanner = SourceScanner::new();
        scanner.add_source(
            ModulePath::parse("models"),
            Some(PathBuf::from("models.rs")),
            "trait User {\n    fn get_name(&self) -> ;\n}\n",
        );
        let scan = scanner.finish();
        assert_eq!(scan.diagnostics.len(), 1);
        let diagnostic = scan.diagnostics.iter().next().unwrap();
        assert!(diagnostic.message.starts_with("syntax error: "));
        assert_eq!(diagnostic.origin.span.map(|s| s.line), Some(2));
    }
}
