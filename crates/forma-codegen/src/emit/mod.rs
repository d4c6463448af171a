//! Renders model descriptors and builder plans as Rust source.
//!
//! A staged builder for a model `Exam` with one mandatory attribute `title`
//! is rendered as below. Only the final stage has `build`:
//!
//! ```compile_fail,E0599
//! pub trait Exam {
//!     fn get_title(&self) -> String;
//! }
//!
//! #[derive(Clone)]
//! pub struct ImmutableExam {
//!     title: String,
//! }
//!
//! impl crate::Exam for ImmutableExam {
//!     fn get_title(&self) -> String {
//!         self.title.clone()
//!     }
//! }
//!
//! pub trait ImmutableExamTitleStage {
//!     fn title(self, title: String) -> impl ImmutableExamFinalStage;
//! }
//!
//! pub trait ImmutableExamFinalStage: ::core::marker::Sized {
//!     fn build(self) -> ImmutableExam;
//! }
//!
//! struct ImmutableExamBuilder {
//!     title: ::core::option::Option<String>,
//! }
//!
//! impl ImmutableExamTitleStage for ImmutableExamBuilder {
//!     fn title(mut self, title: String) -> impl ImmutableExamFinalStage {
//!         self.title = ::core::option::Option::Some(title);
//!         self
//!     }
//! }
//!
//! impl ImmutableExamFinalStage for ImmutableExamBuilder {
//!     fn build(self) -> ImmutableExam {
//!         ImmutableExam {
//!             title: match self.title {
//!                 ::core::option::Option::Some(value) => value,
//!                 ::core::option::Option::None => ::core::unreachable!("`title` is set before building"),
//!             },
//!         }
//!     }
//! }
//!
//! impl ImmutableExam {
//!     pub fn builder() -> impl ImmutableExamTitleStage {
//!         ImmutableExamBuilder {
//!             title: ::core::option::Option::None,
//!         }
//!     }
//! }
//!
//! fn main() {
//!     // `title` has not been set yet.
//!     let _exam = ImmutableExam::builder().build();
//! }
//! ```
//!
//! `tests/compile.rs` compiles and runs real output for every builder kind.

mod builder;
mod model;

#[cfg(test)]
mod tests;

use forma_ir::{AttributeDescriptor, Deprecation, ModelDescriptor, Visibility};
use proc_macro2::{TokenStream, TokenTree};
use quote::{ToTokens as _, format_ident, quote};
use tracing::trace;

use crate::builder::BuilderPlan;
use crate::config::GenerationConfig;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("`{ty}` on attribute `{attribute}` is not a valid Rust type: {source}")]
    InvalidType {
        attribute: String,
        ty: String,
        source: syn::Error,
    },
    #[error("`{path}` is not a valid path: {source}")]
    InvalidPath { path: String, source: syn::Error },
    #[error("generated code for `{model}` does not parse: {source}")]
    Unparsable { model: String, source: syn::Error },
}

/// Tokens of the generated type and its builder.
pub fn model_tokens(
    model: &ModelDescriptor,
    plan: Option<&BuilderPlan>,
    config: &GenerationConfig,
) -> Result<TokenStream, EmitError> {
    let context = EmitContext::new(model, config)?;
    let value_type = model::emit(&context)?;
    let builder = match plan {
        Some(plan) => builder::emit(&context, plan)?,
        None => TokenStream::new(),
    };
    Ok(quote! {
        #value_type
        #builder
    })
}

/// A complete, formatted source file for one model.
pub fn render_file(
    model: &ModelDescriptor,
    plan: Option<&BuilderPlan>,
    config: &GenerationConfig,
) -> Result<String, EmitError> {
    let body = model_tokens(model, plan, config)?;
    let header = config.header.then(|| {
        let line = format!(
            " @generated by forma from `{}`. Do not edit by hand.",
            model.interface
        );
        quote!(#![doc = #line])
    });
    let file = syn::parse2::<syn::File>(quote! {
        #header
        #body
    })
    .map_err(|source| EmitError::Unparsable {
        model: model.name.to_string(),
        source,
    })?;
    trace!(model = %model.name, items = file.items.len(), "rendered file");
    Ok(prettyplease::unparse(&file))
}

/// Resolved tokens shared by the value type and builder emitters.
pub(crate) struct EmitContext<'a> {
    pub model: &'a ModelDescriptor,
    pub config: &'a GenerationConfig,
    pub class: syn::Ident,
    pub interface: syn::Path,
    pub fields: Vec<FieldTokens<'a>>,
}

pub(crate) struct FieldTokens<'a> {
    pub attribute: &'a AttributeDescriptor,
    pub ident: syn::Ident,
    pub ty: syn::Type,
}

impl<'a> EmitContext<'a> {
    fn new(model: &'a ModelDescriptor, config: &'a GenerationConfig) -> Result<Self, EmitError> {
        let mut interface_path = config.trait_root.clone();
        for segment in model.interface.package.segments() {
            interface_path.push_str("::");
            interface_path.push_str(segment);
        }
        interface_path.push_str("::");
        interface_path.push_str(&model.interface.name);
        let interface = syn::parse_str::<syn::Path>(&interface_path).map_err(|source| {
            EmitError::InvalidPath {
                path: interface_path.clone(),
                source,
            }
        })?;

        let fields = model
            .attributes
            .iter()
            .map(|attribute| {
                Ok(FieldTokens {
                    attribute,
                    ident: format_ident!("{}", attribute.identifier),
                    ty: parse_type(attribute.ty.as_str(), &attribute.name)?,
                })
            })
            .collect::<Result<Vec<_>, EmitError>>()?;

        Ok(Self {
            model,
            config,
            class: format_ident!("{}", model.class_name()),
            interface,
            fields,
        })
    }

    /// `#[allow(...)]` for generated items, if enabled.
    pub fn allow(&self, lints: TokenStream) -> TokenStream {
        if self.config.allow_warnings {
            quote!(#[allow(#lints)])
        } else {
            TokenStream::new()
        }
    }

    pub fn mandatory(&self) -> impl Iterator<Item = &FieldTokens<'a>> {
        self.fields.iter().filter(|f| f.attribute.mandatory)
    }
}

pub(crate) fn parse_type(ty: &str, attribute: &str) -> Result<syn::Type, EmitError> {
    syn::parse_str::<syn::Type>(ty).map_err(|source| EmitError::InvalidType {
        attribute: attribute.to_owned(),
        ty: ty.to_owned(),
        source,
    })
}

/// Whether `ty` mentions `f32` or `f64` anywhere, e.g. `Option<Vec<f64>>`.
pub(crate) fn mentions_float(ty: &syn::Type) -> bool {
    fn scan(tokens: TokenStream) -> bool {
        tokens.into_iter().any(|tree| match tree {
            TokenTree::Ident(ident) => ident == "f32" || ident == "f64",
            TokenTree::Group(group) => scan(group.stream()),
            TokenTree::Punct(_) | TokenTree::Literal(_) => false,
        })
    }
    scan(ty.to_token_stream())
}

pub(crate) fn visibility_tokens(visibility: Visibility) -> TokenStream {
    match visibility {
        Visibility::Private => TokenStream::new(),
        Visibility::Crate => quote!(pub(crate)),
        Visibility::Pub => quote!(pub),
    }
}

pub(crate) fn deprecation_tokens(deprecation: Option<&Deprecation>) -> TokenStream {
    let Some(deprecation) = deprecation else {
        return TokenStream::new();
    };
    let since = deprecation.since.as_ref().map(|since| quote!(since = #since));
    let note = deprecation.note.as_ref().map(|note| quote!(note = #note));
    match (since, note) {
        (None, None) => quote!(#[deprecated]),
        (Some(since), None) => quote!(#[deprecated(#since)]),
        (None, Some(note)) => quote!(#[deprecated(#note)]),
        (Some(since), Some(note)) => quote!(#[deprecated(#since, #note)]),
    }
}
