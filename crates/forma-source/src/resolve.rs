//! Links supertrait bounds to traits of the same source set.

use std::collections::HashMap;

use forma_ir::{Diagnostic, Diagnostics, ModulePath, Origin, QualifiedName, SourceSet};
use tracing::trace;

enum Resolution {
    Found(QualifiedName),
    Ambiguous(Vec<QualifiedName>),
    Missing,
}

/// Resolves every supertrait path written in `package` against `known`.
///
/// Paths are tried relative to the package first, then as absolute paths
/// (`crate::` optional). A bare name not found in the package matches a
/// trait of that name anywhere, if there is exactly one.
fn resolve(known: &[QualifiedName], package: &ModulePath, path: &str) -> Resolution {
    let mut segments: Vec<&str> = path.split("::").collect();
    let Some(name) = segments.pop() else {
        return Resolution::Missing;
    };
    let mut base = package.segments().to_vec();
    let mut absolute = false;
    if segments.first() == Some(&"crate") {
        segments.remove(0);
        absolute = true;
    }
    while segments.first() == Some(&"super") {
        segments.remove(0);
        base.pop();
    }
    if segments.first() == Some(&"self") {
        segments.remove(0);
    }

    let mut candidates = Vec::new();
    if !absolute {
        candidates.push(QualifiedName::new(
            ModulePath::new(base.iter().map(String::as_str).chain(segments.iter().copied())),
            name,
        ));
    }
    candidates.push(QualifiedName::new(ModulePath::new(segments.iter().copied()), name));
    if let Some(found) = candidates.into_iter().find(|c| known.contains(c)) {
        return Resolution::Found(found);
    }
    if !absolute && segments.is_empty() {
        let mut matches: Vec<QualifiedName> =
            known.iter().filter(|k| k.name == name).cloned().collect();
        return match matches.len() {
            0 => Resolution::Missing,
            1 => Resolution::Found(matches.swap_remove(0)),
            _ => Resolution::Ambiguous(matches),
        };
    }
    Resolution::Missing
}

pub(crate) fn resolve_supertraits(sources: &mut SourceSet, diagnostics: &mut Diagnostics) {
    let known: Vec<QualifiedName> = sources.interfaces().map(|i| i.name.clone()).collect();
    let mut resolved: HashMap<(QualifiedName, usize), QualifiedName> = HashMap::new();

    for interface in sources.interfaces() {
        for (index, supertrait) in interface.supertraits.iter().enumerate() {
            if supertrait.resolved.is_some() {
                continue;
            }
            match resolve(&known, &interface.name.package, &supertrait.path) {
                Resolution::Found(name) => {
                    trace!(interface = %interface.name, supertrait = %name, "resolved supertrait");
                    resolved.insert((interface.name.clone(), index), name);
                }
                Resolution::Ambiguous(matches) => {
                    let names: Vec<String> = matches.iter().map(ToString::to_string).collect();
                    diagnostics.push(Diagnostic::warning(
                        format!(
                            "supertrait `{}` is ambiguous ({}); its methods are ignored",
                            supertrait.path,
                            names.join(", ")
                        ),
                        Origin::new(interface.name.to_string())
                            .with_span(interface.span)
                            .with_file(sources.file_of(&interface.name.package).cloned()),
                    ));
                }
                Resolution::Missing => {
                    trace!(interface = %interface.name, supertrait = %supertrait.path, "external supertrait");
                }
            }
        }
    }

    for interface in sources.interfaces_mut() {
        for (index, supertrait) in interface.supertraits.iter_mut().enumerate() {
            if let Some(name) = resolved.remove(&(interface.name.clone(), index)) {
                supertrait.resolved = Some(name);
            }
        }
    }
}
