//! Merges settings fragments from every declaration site of a model.

use forma_ir::{InterfaceDecl, ModelAnnotation, SettingsCollection, SettingsFragment, SourceSet};
use tracing::{debug, trace};

use crate::hierarchy::supertrait_closure;

/// Fragments that apply to a model, most specific first:
///
/// 1. settings nested in the model annotation,
/// 2. `#[settings]` on the trait, then on each supertrait breadth first,
/// 3. `#![settings]` of the trait's package, then the package's settings for
///    the model's kind.
pub fn collect_fragments<'a>(
    sources: &'a SourceSet,
    interface: &'a InterfaceDecl,
    annotation: &'a ModelAnnotation,
) -> Vec<&'a SettingsFragment> {
    let mut fragments = Vec::new();
    fragments.extend(annotation.settings.as_ref());
    fragments.extend(
        supertrait_closure(sources, interface)
            .into_iter()
            .filter_map(|decl| decl.settings.as_ref()),
    );
    if let Some(package) = sources.package(&interface.name.package) {
        fragments.extend(package.settings.as_ref());
        fragments.extend(package.model_settings(annotation.kind));
    }
    fragments
}

/// Resolves every setting of a model. Never fails: each setting falls back
/// to the default of the model's kind.
pub fn resolve(
    sources: &SourceSet,
    interface: &InterfaceDecl,
    annotation: &ModelAnnotation,
) -> SettingsCollection {
    let fragments = collect_fragments(sources, interface, annotation);
    debug!(
        model = %interface.name,
        fragments = fragments.len(),
        "resolving settings"
    );
    let settings = SettingsCollection::from_fragments(&fragments, annotation.kind);
    for setting in forma_ir::SettingName::ALL {
        let provenance = settings.provenance(*setting);
        if !provenance.is_default() {
            trace!(model = %interface.name, "{provenance}");
        }
    }
    settings
}
