use std::fmt;
use std::str::FromStr;

use crate::UnknownValueError;

/// Builder flavour requested by the `builder` setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BuilderKind {
    /// No builder is generated.
    #[default]
    None,
    /// Unset attributes fall back to `Default::default()`.
    Unchecked,
    /// `build` returns an error naming every mandatory attribute left unset.
    RuntimeChecked,
    /// One stage per mandatory attribute; `build` is only reachable once all
    /// of them are set.
    Staged,
}

impl BuilderKind {
    pub fn is_none(self) -> bool {
        self == BuilderKind::None
    }
}

impl FromStr for BuilderKind {
    type Err = UnknownValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "none" => Ok(BuilderKind::None),
            "unchecked" => Ok(BuilderKind::Unchecked),
            "runtime_checked" => Ok(BuilderKind::RuntimeChecked),
            "staged" => Ok(BuilderKind::Staged),
            other => Err(UnknownValueError {
                kind: "builder",
                value: other.to_owned(),
                expected: "none, unchecked, runtime_checked, staged",
            }),
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuilderKind::None => "none",
            BuilderKind::Unchecked => "unchecked",
            BuilderKind::RuntimeChecked => "runtime_checked",
            BuilderKind::Staged => "staged",
        })
    }
}

/// The builder a model will get, with every name already resolved.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct BuilderStrategy {
    pub kind: BuilderKind,
    /// Associated function on the model that starts a builder.
    #[builder(into)]
    pub builder_method_name: String,
    /// Builder method that produces the model.
    #[builder(into)]
    pub build_method_name: String,
    /// Name of the generated builder type.
    #[builder(into)]
    pub type_name: String,
    /// Also generate `to_builder` on the model. Never set for staged builders.
    #[builder(default)]
    pub to_builder: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_kind_round_trips_through_text() {
        for kind in [
            BuilderKind::None,
            BuilderKind::Unchecked,
            BuilderKind::RuntimeChecked,
            BuilderKind::Staged,
        ] {
            assert_eq!(kind.to_string().parse::<BuilderKind>(), Ok(kind));
        }
        assert!("checked".parse::<BuilderKind>().is_err());
    }
}
