//! Intermediate representation for forma code generation.
//!
//! Everything in this crate is plain, immutable data shared between the host
//! adapter that reads model definitions and the generation pipeline.
//!
//! # Types
//!
//! ## Declarations
//!
//! - [`SourceSet`] - Every package and trait read from model definition sources
//! - [`InterfaceDecl`] - A trait, optionally annotated as a model
//! - [`MethodDecl`] - A trait method as the pipeline sees it
//!
//! ## Settings
//!
//! - [`SettingsFragment`] - Sparse settings declared at one site
//! - [`SettingsCollection`] - Every setting resolved, with provenance
//!
//! ## Models
//!
//! - [`MethodClassification`] - Getters and utility methods of a model
//! - [`AttributeDescriptor`] - One resolved model attribute
//! - [`ModelDescriptor`] - The unit of generation

pub mod attribute;
pub mod builder;
pub mod decl;
pub mod diagnostic;
pub mod model;
pub mod settings;

pub use attribute::*;
pub use builder::*;
pub use decl::*;
pub use diagnostic::*;
pub use model::*;
pub use settings::*;

/// Error returned when a textual setting or marker value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`, expected one of: {expected}")]
pub struct UnknownValueError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}
