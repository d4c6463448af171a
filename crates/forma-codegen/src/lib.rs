//! Model resolution and builder synthesis for forma.
//!
//! The pipeline turns a model trait into a [`ModelDescriptor`](forma_ir::ModelDescriptor)
//! and renders it as Rust source:
//!
//! 1. [`settings::resolve`] merges settings fragments from the model
//!    annotation, the trait hierarchy and the package.
//! 2. [`classify::classify`] sorts reachable methods into getters and
//!    utility methods.
//! 3. [`AttributeResolver`] derives one attribute per getter.
//! 4. [`model::assemble`] ties these together and picks the builder strategy.
//! 5. [`builder::synthesize`] plans the builder, using [`InitTracker`] for
//!    runtime-checked builders.
//! 6. [`emit::render_file`] renders the value type and its builder.
//!
//! [`Round`] runs the pipeline over a whole source set and
//! [`GeneratedFileWriter`] puts the results on disk.

pub mod attribute;
pub mod builder;
pub mod classify;
mod config;
pub mod emit;
mod error;
pub mod hierarchy;
pub mod init_tracker;
pub mod model;
pub mod naming;
mod outcome;
mod round;
pub mod settings;
mod writer;

pub use attribute::AttributeResolver;
pub use builder::{BuilderPlan, BuilderStage};
pub use config::*;
pub use emit::EmitError;
pub use error::ModelError;
pub use init_tracker::{BitExpr, InitTracker, TrackerWidth};
pub use outcome::Outcome;
pub use round::*;
pub use writer::*;
