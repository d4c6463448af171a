//! Supertrait traversal over a [`SourceSet`].

use std::collections::{HashSet, VecDeque};

use forma_ir::{DeclaredMethod, InterfaceDecl, QualifiedName, SourceSet};
use tracing::trace;

/// The trait itself followed by its supertraits, breadth first. Each trait
/// appears once; supertraits outside the source set are skipped.
pub fn supertrait_closure<'a>(
    sources: &'a SourceSet,
    interface: &'a InterfaceDecl,
) -> Vec<&'a InterfaceDecl> {
    let mut visited: HashSet<&QualifiedName> = HashSet::new();
    let mut queue = VecDeque::from([interface]);
    let mut closure = Vec::new();
    visited.insert(&interface.name);

    while let Some(current) = queue.pop_front() {
        closure.push(current);
        for supertrait in &current.supertraits {
            let Some(name) = &supertrait.resolved else {
                trace!(path = %supertrait.path, "ignoring supertrait outside the source set");
                continue;
            };
            let Some(decl) = sources.interface(name) else {
                continue;
            };
            if visited.insert(&decl.name) {
                queue.push_back(decl);
            }
        }
    }
    closure
}

/// Every method reachable from `interface`, most derived first.
///
/// A method overrides any method with the same name and parameter types
/// declared further up the hierarchy.
pub fn reachable_methods(sources: &SourceSet, interface: &InterfaceDecl) -> Vec<DeclaredMethod> {
    let mut seen = HashSet::new();
    let mut methods = Vec::new();
    for decl in supertrait_closure(sources, interface) {
        for method in &decl.methods {
            if seen.insert(method.override_key()) {
                methods.push(DeclaredMethod::new(decl.name.clone(), method.clone()));
            } else {
                trace!(
                    interface = %decl.name,
                    method = %method.name,
                    "method is overridden by a more derived trait"
                );
            }
        }
    }
    methods
}
