//! Reads forma model definitions from Rust source files.
//!
//! Model definition sources are ordinary `.rs` files that are parsed with
//! `syn` but never compiled. A trait becomes a model when it carries
//! `#[immutable_model]` or `#[mutable_model]`:
//!
//! ```ignore
//! #![settings(getter_prefix = "fetch")]
//!
//! #[immutable_model(settings(builder = "staged"))]
//! pub trait User: Named {
//!     fn fetch_email(&self) -> String;
//!     #[forma(exclude(equality))]
//!     fn fetch_last_login(&self) -> Option<u64>;
//! }
//! ```
//!
//! [`SourceScanner`] turns such files into a [`SourceSet`](forma_ir::SourceSet).
//! Malformed attributes and syntax errors are reported as diagnostics in the
//! resulting [`Scan`]; only I/O problems abort a scan.

pub mod attrs;
mod error;
mod package;
mod resolve;
mod scan;

pub use error::SourceError;
pub use package::package_path;
pub use scan::{Scan, SourceScanner};
