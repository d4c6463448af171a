use std::path::{Component, Path};

use forma_ir::ModulePath;

use crate::SourceError;

/// Package of a source file, from its path relative to the source root.
///
/// `models/user.rs` is `models::user`. `mod.rs` and `lib.rs` name their
/// directory, so `models/mod.rs` is `models` and the root `lib.rs` is the
/// root package.
pub fn package_path(relative: &Path) -> Result<ModulePath, SourceError> {
    let invalid = || SourceError::InvalidPath {
        path: relative.to_path_buf(),
    };
    let mut segments = Vec::new();
    for component in relative.with_extension("").components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str().ok_or_else(invalid)?.to_owned()),
            Component::CurDir => {}
            _ => return Err(invalid()),
        }
    }
    if segments
        .last()
        .is_some_and(|last| matches!(last.as_str(), "mod" | "lib" | "main"))
    {
        segments.pop();
    }
    Ok(ModulePath::new(segments))
}
