//! Builder strategy selection and the staged builder's stage chain.

use forma_ir::{BuilderKind, BuilderStrategy, ModelDescriptor, SettingsCollection};
use tracing::debug;

use crate::init_tracker::InitTracker;
use crate::naming::attribute_type_component;

/// Chooses the builder for a model from its settings. Never fails.
pub fn select_strategy(settings: &SettingsCollection, class_name: &str) -> Option<BuilderStrategy> {
    let kind = *settings.builder.value();
    if kind.is_none() {
        return None;
    }
    let mut to_builder = *settings.to_builder.value();
    if to_builder && kind == BuilderKind::Staged {
        debug!(
            class = class_name,
            "staged builders can only be entered through their first stage; ignoring to_builder"
        );
        to_builder = false;
    }
    Some(
        BuilderStrategy::builder()
            .kind(kind)
            .builder_method_name(settings.builder_method_name.value())
            .build_method_name(settings.build_method_name.value())
            .type_name(format!("{class_name}Builder"))
            .to_builder(to_builder)
            .build(),
    )
}

/// One state of a staged builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderStage {
    /// Sets one mandatory attribute and moves on to stage `next`.
    Dedicated {
        trait_name: String,
        attribute: String,
        next: usize,
    },
    /// Sets optional attributes and builds.
    Final {
        trait_name: String,
        optional: Vec<String>,
    },
}

impl BuilderStage {
    pub fn trait_name(&self) -> &str {
        match self {
            BuilderStage::Dedicated { trait_name, .. } | BuilderStage::Final { trait_name, .. } => {
                trait_name
            }
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, BuilderStage::Final { .. })
    }
}

/// Everything the emitter needs to render a model's builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderPlan {
    pub strategy: BuilderStrategy,
    /// Stage chain of a staged builder, final stage last. Empty otherwise.
    pub stages: Vec<BuilderStage>,
    /// Bit assignment of a runtime-checked builder.
    pub tracker: Option<InitTracker>,
    /// Error type returned by a runtime-checked `build`.
    pub error_type: Option<String>,
}

impl BuilderPlan {
    /// The stage returned by the builder entry point.
    pub fn first_stage(&self) -> Option<&BuilderStage> {
        self.stages.first()
    }

    pub fn final_stage(&self) -> Option<&BuilderStage> {
        self.stages.last().filter(|stage| stage.is_final())
    }

    /// Follows the stage chain from the entry point. Every stage is visited
    /// once and the walk ends on the final stage.
    pub fn reachable_stages(&self) -> Vec<&BuilderStage> {
        let mut reached = Vec::new();
        let mut index = 0;
        while let Some(stage) = self.stages.get(index) {
            reached.push(stage);
            match stage {
                BuilderStage::Dedicated { next, .. } if *next > index => index = *next,
                _ => break,
            }
        }
        reached
    }
}

/// Plans the builder of a model, if it has one.
pub fn synthesize(model: &ModelDescriptor) -> Option<BuilderPlan> {
    let strategy = model.builder.clone()?;
    let class_name = model.class_name();
    let plan = match strategy.kind {
        BuilderKind::None => return None,
        BuilderKind::Unchecked => BuilderPlan {
            strategy,
            stages: Vec::new(),
            tracker: None,
            error_type: None,
        },
        BuilderKind::RuntimeChecked => BuilderPlan {
            strategy,
            stages: Vec::new(),
            tracker: Some(InitTracker::new(
                model.attributes.mandatory().map(|a| a.name.clone()),
            )),
            error_type: Some(format!("{class_name}BuilderError")),
        },
        BuilderKind::Staged => BuilderPlan {
            stages: stage_chain(model),
            strategy,
            tracker: None,
            error_type: None,
        },
    };
    debug!(
        class = class_name,
        kind = %plan.strategy.kind,
        stages = plan.stages.len(),
        "planned builder"
    );
    Some(plan)
}

pub(crate) fn dedicated_stage_name(class_name: &str, attribute: &str) -> String {
    format!("{class_name}{}Stage", attribute_type_component(attribute))
}

pub(crate) fn final_stage_name(class_name: &str) -> String {
    format!("{class_name}FinalStage")
}

fn stage_chain(model: &ModelDescriptor) -> Vec<BuilderStage> {
    let class_name = model.class_name();
    let mut stages: Vec<BuilderStage> = model
        .attributes
        .mandatory()
        .enumerate()
        .map(|(index, attribute)| BuilderStage::Dedicated {
            trait_name: dedicated_stage_name(class_name, &attribute.name),
            attribute: attribute.name.clone(),
            next: index + 1,
        })
        .collect();
    stages.push(BuilderStage::Final {
        trait_name: final_stage_name(class_name),
        optional: model
            .attributes
            .optional()
            .map(|a| a.name.clone())
            .collect(),
    });
    stages
}

#[cfg(test)]
mod tests {
    use forma_ir::{
        AttributeDescriptor, AttributeSet, DeclaredMethod, FragmentOrigin, FragmentSite,
        MethodClassification, MethodDecl, ModelKind, ModulePath, QualifiedName, SettingsFragment,
        TypeRef,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn attribute(name: &str, ty: &str) -> AttributeDescriptor {
        let ty = TypeRef::new(ty);
        AttributeDescriptor::builder()
            .name(name)
            .identifier(name)
            .mandatory(!(ty.is_option() || ty.is_primitive_scalar()))
            .getter(DeclaredMethod::new(
                QualifiedName::parse("models::User"),
                MethodDecl::builder()
                    .name(format!("get_{name}"))
                    .return_type(ty.clone())
                    .build(),
            ))
            .ty(ty)
            .build()
    }

    fn settings(kind: BuilderKind, to_builder: bool) -> SettingsCollection {
        let mut fragment = SettingsFragment::new(FragmentOrigin::new(FragmentSite::Package(
            ModulePath::parse("models"),
        )));
        fragment.builder = Some(kind);
        fragment.to_builder = Some(to_builder);
        SettingsCollection::from_fragments(&[&fragment], ModelKind::Immutable)
    }

    fn model(kind: BuilderKind, attributes: AttributeSet) -> ModelDescriptor {
        let settings = settings(kind, true);
        ModelDescriptor::builder()
            .name(QualifiedName::parse("models::ImmutableUser"))
            .interface(QualifiedName::parse("models::User"))
            .kind(ModelKind::Immutable)
            .maybe_builder(select_strategy(&settings, "ImmutableUser"))
            .settings(settings)
            .classification(MethodClassification::new())
            .attributes(attributes)
            .build()
    }

    fn user_attributes() -> AttributeSet {
        [
            attribute("name", "String"),
            attribute("active", "bool"),
            attribute("email", "String"),
            attribute("nickname", "Option<String>"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_no_builder_by_default() {
        let defaults = SettingsCollection::defaults(ModelKind::Immutable);
        assert_eq!(select_strategy(&defaults, "ImmutableUser"), None);
    }

    #[test]
    fn test_strategy_names() {
        let strategy = select_strategy(&settings(BuilderKind::Unchecked, true), "ImmutableUser")
            .unwrap();
        assert_eq!(strategy.type_name, "ImmutableUserBuilder");
        assert_eq!(strategy.builder_method_name, "builder");
        assert_eq!(strategy.build_method_name, "build");
        assert!(strategy.to_builder);
    }

    #[test]
    fn test_staged_builder_ignores_to_builder() {
        let strategy =
            select_strategy(&settings(BuilderKind::Staged, true), "ImmutableUser").unwrap();
        assert!(!strategy.to_builder);
    }

    #[test]
    fn test_staged_chain_has_one_stage_per_mandatory_attribute() {
        let plan = synthesize(&model(BuilderKind::Staged, user_attributes())).unwrap();
        assert_eq!(
            plan.stages,
            vec![
                BuilderStage::Dedicated {
                    trait_name: "ImmutableUserEmailStage".to_owned(),
                    attribute: "email".to_owned(),
                    next: 1,
                },
                BuilderStage::Dedicated {
                    trait_name: "ImmutableUserNameStage".to_owned(),
                    attribute: "name".to_owned(),
                    next: 2,
                },
                BuilderStage::Final {
                    trait_name: "ImmutableUserFinalStage".to_owned(),
                    optional: vec!["active".to_owned(), "nickname".to_owned()],
                },
            ]
        );
        assert_eq!(plan.reachable_stages().len(), 3);
        assert!(plan.final_stage().is_some());
    }

    #[test]
    fn test_staged_chain_without_mandatory_attributes_starts_final() {
        let attributes = [attribute("active", "bool")].into_iter().collect();
        let plan = synthesize(&model(BuilderKind::Staged, attributes)).unwrap();
        assert_eq!(plan.stages.len(), 1);
        assert!(plan.first_stage().unwrap().is_final());
    }

    #[test]
    fn test_staged_chain_reaches_n_plus_one_stages() {
        for n in 0..6 {
            let attributes = (0..n)
                .map(|i| attribute(&format!("field{}", (b'a' + i) as char), "String"))
                .collect();
            let plan = synthesize(&model(BuilderKind::Staged, attributes)).unwrap();
            let reachable = plan.reachable_stages();
            assert_eq!(reachable.len(), usize::from(n) + 1);
            assert!(reachable.last().unwrap().is_final());
            assert!(reachable[..usize::from(n)].iter().all(|s| !s.is_final()));
        }
    }

    #[test]
    fn test_runtime_checked_plan_tracks_mandatory_attributes() {
        let plan = synthesize(&model(BuilderKind::RuntimeChecked, user_attributes())).unwrap();
        let tracker = plan.tracker.unwrap();
        assert_eq!(tracker.attributes().collect::<Vec<_>>(), ["email", "name"]);
        assert_eq!(plan.error_type.as_deref(), Some("ImmutableUserBuilderError"));
        assert!(plan.stages.is_empty());
    }
}
