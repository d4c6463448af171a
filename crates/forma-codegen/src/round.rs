//! One processing pass over a source set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use convert_case::{Case, Casing as _};
use forma_ir::{
    Diagnostic, Diagnostics, InterfaceDecl, ModelDescriptor, Origin, QualifiedName, SourceSet,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::builder::{BuilderPlan, synthesize};
use crate::config::GenerationConfig;
use crate::emit::render_file;
use crate::error::interface_origin;
use crate::model::assemble;

/// A rendered model, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub model: ModelDescriptor,
    pub plan: Option<BuilderPlan>,
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub contents: String,
}

/// Everything a round produced.
#[derive(Debug, Default)]
pub struct RoundReport {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Diagnostics,
}

impl RoundReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

pub struct Round {
    config: GenerationConfig,
}

impl Round {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Assembles and renders every model in `sources`. A failing model only
    /// contributes diagnostics; its siblings are unaffected.
    pub fn process(&self, sources: &SourceSet) -> RoundReport {
        let models: Vec<&InterfaceDecl> = sources.models().collect();
        info!(models = models.len(), parallel = self.config.parallel, "processing round");

        let outcomes: Vec<Result<GeneratedFile, Diagnostics>> = if self.config.parallel {
            models
                .par_iter()
                .map(|interface| self.generate(sources, interface))
                .collect()
        } else {
            models
                .iter()
                .map(|interface| self.generate(sources, interface))
                .collect()
        };

        let mut report = RoundReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(file) => report.files.push(file),
                Err(diagnostics) => report.diagnostics.append(diagnostics),
            }
        }
        reject_shared_paths(sources, &mut report);
        if report.has_errors() {
            warn!(
                generated = report.files.len(),
                errors = report.diagnostics.error_count(),
                "round finished with errors"
            );
        } else {
            debug!(generated = report.files.len(), "round finished");
        }
        report
    }

    fn generate(
        &self,
        sources: &SourceSet,
        interface: &InterfaceDecl,
    ) -> Result<GeneratedFile, Diagnostics> {
        let Some(annotation) = &interface.model else {
            return Err(Diagnostics::new());
        };
        let model = assemble(sources, interface, annotation).map_err(|err| err.diagnostics)?;
        let plan = synthesize(&model);
        let contents = render_file(&model, plan.as_ref(), &self.config).map_err(|err| {
            Diagnostics::from(Diagnostic::error(
                err.to_string(),
                interface_origin(sources, interface),
            ))
        })?;
        Ok(GeneratedFile {
            path: output_path(&model),
            model,
            plan,
            contents,
        })
    }
}

/// Models that would write the same file are all reported and none of
/// them is kept.
fn reject_shared_paths(sources: &SourceSet, report: &mut RoundReport) {
    let mut owners: HashMap<&Path, Vec<&QualifiedName>> = HashMap::new();
    for file in &report.files {
        owners
            .entry(file.path.as_path())
            .or_default()
            .push(&file.model.interface);
    }
    let shared: HashMap<PathBuf, Vec<QualifiedName>> = owners
        .into_iter()
        .filter(|(_, models)| models.len() > 1)
        .map(|(path, models)| (path.to_owned(), models.into_iter().cloned().collect()))
        .collect();
    if shared.is_empty() {
        return;
    }

    for file in std::mem::take(&mut report.files) {
        let Some(models) = shared.get(&file.path) else {
            report.files.push(file);
            continue;
        };
        let others: Vec<String> = models
            .iter()
            .filter(|model| **model != file.model.interface)
            .map(|model| format!("`{model}`"))
            .collect();
        let origin = match sources.interface(&file.model.interface) {
            Some(interface) => interface_origin(sources, interface),
            None => Origin::new(file.model.interface.to_string()),
        };
        warn!(path = %file.path.display(), model = %file.model.interface, "output path is shared");
        report.diagnostics.push(Diagnostic::error(
            format!(
                "generated file `{}` would also be written by {}",
                file.path.display(),
                others.join(", ")
            ),
            origin,
        ));
    }
}

/// `<package path>/<snake_case class>.rs`
pub fn output_path(model: &ModelDescriptor) -> PathBuf {
    let mut path: PathBuf = model.package().segments().iter().collect();
    path.push(format!("{}.rs", model.class_name().to_case(Case::Snake)));
    path
}

#[cfg(test)]
mod tests {
    use forma_ir::{
        FragmentOrigin, FragmentSite, MethodDecl, ModelAnnotation, ModelKind, PackageDecl,
        SettingsFragment, TypeRef,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn getter(name: &str, ty: &str) -> MethodDecl {
        MethodDecl::builder()
            .name(name)
            .return_type(TypeRef::new(ty))
            .build()
    }

    fn model_trait(name: &str, methods: Vec<MethodDecl>) -> InterfaceDecl {
        InterfaceDecl::builder()
            .name(QualifiedName::parse(name))
            .methods(methods)
            .model(ModelAnnotation::new(ModelKind::Immutable))
            .build()
    }

    fn sources() -> SourceSet {
        let mut sources = SourceSet::new();
        sources.add_package(
            PackageDecl::builder()
                .path(forma_ir::ModulePath::parse("models"))
                .file(PathBuf::from("models.rs"))
                .build(),
        );
        sources.add_interface(model_trait("models::User", vec![getter("get_name", "String")]));
        sources.add_interface(model_trait(
            "models::Broken",
            vec![getter("get_x", "u8"), getter("is_x", "bool")],
        ));
        sources.add_interface(model_trait("models::Account", vec![getter("get_id", "u64")]));
        sources.add_interface(
            InterfaceDecl::builder()
                .name(QualifiedName::parse("models::Plain"))
                .build(),
        );
        sources
    }

    #[test]
    fn test_failures_do_not_affect_siblings() {
        for parallel in [false, true] {
            let round = Round::new(GenerationConfig::builder().parallel(parallel).build());
            let report = round.process(&sources());
            let generated: Vec<String> = report
                .files
                .iter()
                .map(|f| f.model.name.to_string())
                .collect();
            assert_eq!(generated, ["models::ImmutableUser", "models::ImmutableAccount"]);
            assert_eq!(report.diagnostics.error_count(), 1);
            let diagnostic = report.diagnostics.iter().next().unwrap();
            assert_eq!(diagnostic.origin.element, "models::Broken::is_x");
            assert_eq!(diagnostic.origin.file, Some(PathBuf::from("models.rs")));
        }
    }

    #[test]
    fn test_output_path() {
        let report = Round::new(GenerationConfig::default()).process(&sources());
        let paths: Vec<PathBuf> = report.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            [
                PathBuf::from("models/immutable_user.rs"),
                PathBuf::from("models/immutable_account.rs")
            ]
        );
    }

    #[test]
    fn test_parallel_and_sequential_rounds_agree() {
        let sources = sources();
        let sequential = Round::new(GenerationConfig::builder().parallel(false).build()).process(&sources);
        let parallel = Round::new(GenerationConfig::default()).process(&sources);
        assert_eq!(sequential.files, parallel.files);
        assert_eq!(sequential.diagnostics, parallel.diagnostics);
    }

    #[test]
    fn test_models_sharing_an_output_path_are_rejected() {
        let mut sources = SourceSet::new();
        for name in ["m::A", "m::B"] {
            let mut fragment = SettingsFragment::new(FragmentOrigin::new(
                FragmentSite::ModelAnnotation {
                    interface: QualifiedName::parse(name),
                    kind: ModelKind::Immutable,
                },
            ));
            fragment.class_name = Some("Record".to_owned());
            let annotation = ModelAnnotation {
                settings: Some(fragment),
                ..ModelAnnotation::new(ModelKind::Immutable)
            };
            sources.add_interface(
                InterfaceDecl::builder()
                    .name(QualifiedName::parse(name))
                    .methods(vec![getter("get_id", "u64")])
                    .model(annotation)
                    .build(),
            );
        }
        sources.add_interface(model_trait("m::C", vec![getter("get_id", "u64")]));

        let report = Round::new(GenerationConfig::builder().parallel(false).build()).process(&sources);
        let paths: Vec<PathBuf> = report.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, [PathBuf::from("m/immutable_c.rs")]);

        let errors: Vec<(String, String)> = report
            .diagnostics
            .iter()
            .map(|d| (d.origin.element.clone(), d.message.clone()))
            .collect();
        let path = Path::new("m").join("record.rs");
        assert_eq!(
            errors,
            [
                (
                    "m::A".to_owned(),
                    format!("generated file `{}` would also be written by `m::B`", path.display())
                ),
                (
                    "m::B".to_owned(),
                    format!("generated file `{}` would also be written by `m::A`", path.display())
                ),
            ]
        );
    }
}
