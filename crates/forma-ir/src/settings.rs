//! The settings schema, sparse fragments and fully resolved collections.
//!
//! The schema is closed: [`settings_schema!`] below is the single list of
//! known settings, and expands to [`SettingName`], [`SettingsFragment`] and
//! [`SettingsCollection`] so the three can never drift apart.

use std::fmt;

use crate::attribute::{Inclusion, Visibility};
use crate::builder::BuilderKind;
use crate::decl::{ModelKind, ModulePath, QualifiedName, SourceSpan};

/// Where a settings fragment was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FragmentSite {
    /// `settings(...)` nested in the model annotation of a trait.
    ModelAnnotation {
        interface: QualifiedName,
        kind: ModelKind,
    },
    /// `#[settings(...)]` on a trait.
    Interface(QualifiedName),
    /// `#![settings(...)]` in a package.
    Package(ModulePath),
    /// `#![immutable_model(settings(...))]` or `#![mutable_model(settings(...))]`
    /// in a package.
    PackageModel { package: ModulePath, kind: ModelKind },
}

impl fmt::Display for FragmentSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentSite::ModelAnnotation { interface, kind } => {
                write!(f, "settings in #[{kind}] on trait `{interface}`")
            }
            FragmentSite::Interface(name) => write!(f, "#[settings] on trait `{name}`"),
            FragmentSite::Package(path) => write!(f, "#![settings] in {}", package_label(path)),
            FragmentSite::PackageModel { package, kind } => {
                write!(f, "#![{kind}(settings)] in {}", package_label(package))
            }
        }
    }
}

fn package_label(path: &ModulePath) -> String {
    if path.is_root() {
        "the root package".to_owned()
    } else {
        format!("package `{path}`")
    }
}

/// Provenance of a fragment: its site and, when known, its position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentOrigin {
    pub site: FragmentSite,
    pub span: Option<SourceSpan>,
}

impl FragmentOrigin {
    pub fn new(site: FragmentSite) -> Self {
        Self { site, span: None }
    }

    pub fn at(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }
}

impl fmt::Display for FragmentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} (line {})", self.site, span.line),
            None => write!(f, "{}", self.site),
        }
    }
}

/// Types that can be the value of a setting.
pub trait SettingValue: Clone + PartialEq + fmt::Debug {
    /// The value as a user would write it.
    fn render(&self) -> String;
}

impl SettingValue for String {
    fn render(&self) -> String {
        format!("{self:?}")
    }
}

impl SettingValue for bool {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for Vec<String> {
    fn render(&self) -> String {
        format!("{self:?}")
    }
}

impl SettingValue for Visibility {
    fn render(&self) -> String {
        format!("{:?}", self.to_string())
    }
}

impl SettingValue for Inclusion {
    fn render(&self) -> String {
        format!("{:?}", self.to_string())
    }
}

impl SettingValue for BuilderKind {
    fn render(&self) -> String {
        format!("{:?}", self.to_string())
    }
}

/// Why a setting has the value it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    setting: SettingName,
    origin: Option<FragmentOrigin>,
    description: String,
}

impl Provenance {
    fn declared(setting: SettingName, value: &impl SettingValue, origin: &FragmentOrigin) -> Self {
        Self {
            setting,
            origin: Some(origin.clone()),
            description: format!(
                "setting '{}' with value {}, from {origin}",
                setting.as_str(),
                value.render()
            ),
        }
    }

    fn default_for(setting: SettingName) -> Self {
        Self {
            setting,
            origin: None,
            description: format!("default setting '{}'", setting.as_str()),
        }
    }

    pub fn setting(&self) -> SettingName {
        self.setting
    }

    /// The fragment the value came from, or `None` for a default.
    pub fn origin(&self) -> Option<&FragmentOrigin> {
        self.origin.as_ref()
    }

    pub fn is_default(&self) -> bool {
        self.origin.is_none()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// A resolved setting value with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting<T> {
    value: T,
    provenance: Provenance,
}

impl<T> Setting<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn description(&self) -> &str {
        self.provenance.description()
    }
}

/// Resolves one setting against fragments in precedence order.
///
/// The first fragment that defines the setting with a value other than the
/// inherited default wins. Restating the inherited default is transparent.
fn resolve_setting<'a, T: SettingValue + 'a>(
    setting: SettingName,
    candidates: impl IntoIterator<Item = (&'a FragmentOrigin, Option<&'a T>)>,
    inherited: T,
) -> Setting<T> {
    for (origin, value) in candidates {
        let Some(value) = value else {
            continue;
        };
        if *value == inherited {
            continue;
        }
        return Setting {
            value: value.clone(),
            provenance: Provenance::declared(setting, value, origin),
        };
    }
    Setting {
        value: inherited,
        provenance: Provenance::default_for(setting),
    }
}

macro_rules! settings_schema {
    (
        $kind:ident;
        $(
            $(#[doc = $doc:literal])*
            $variant:ident $field:ident: $ty:ty {
                immutable: $immutable:expr,
                mutable: $mutable:expr $(,)?
            }
        )*
    ) => {
        /// Name of a known setting.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum SettingName {
            $( $(#[doc = $doc])* $variant, )*
        }

        impl SettingName {
            pub const ALL: &'static [SettingName] = &[$(SettingName::$variant),*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( SettingName::$variant => stringify!($field), )*
                }
            }

            pub fn from_name(name: &str) -> Option<SettingName> {
                SettingName::ALL.iter().copied().find(|setting| setting.as_str() == name)
            }
        }

        impl fmt::Display for SettingName {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        /// Settings explicitly declared at one site. Unset fields are `None`.
        #[derive(Debug, Clone, PartialEq)]
        pub struct SettingsFragment {
            origin: FragmentOrigin,
            $( $(#[doc = $doc])* pub $field: Option<$ty>, )*
        }

        impl SettingsFragment {
            pub fn new(origin: FragmentOrigin) -> Self {
                Self {
                    origin,
                    $( $field: None, )*
                }
            }

            pub fn origin(&self) -> &FragmentOrigin {
                &self.origin
            }

            pub fn defines(&self, setting: SettingName) -> bool {
                match setting {
                    $( SettingName::$variant => self.$field.is_some(), )*
                }
            }

            /// Names of the settings this fragment defines.
            pub fn defined(&self) -> Vec<SettingName> {
                SettingName::ALL
                    .iter()
                    .copied()
                    .filter(|setting| self.defines(*setting))
                    .collect()
            }

            pub fn is_empty(&self) -> bool {
                $( self.$field.is_none() && )* true
            }
        }

        /// Every known setting resolved to a concrete value.
        #[derive(Debug, Clone, PartialEq)]
        pub struct SettingsCollection {
            $( $(#[doc = $doc])* pub $field: Setting<$ty>, )*
        }

        impl SettingsCollection {
            /// The defaults of a model kind, with no fragments applied.
            pub fn defaults($kind: ModelKind) -> Self {
                Self::from_fragments(&[], $kind)
            }

            /// Resolves every setting against `fragments`, most specific first.
            pub fn from_fragments(fragments: &[&SettingsFragment], $kind: ModelKind) -> Self {
                Self {
                    $(
                        $field: resolve_setting(
                            SettingName::$variant,
                            fragments
                                .iter()
                                .map(|fragment| (&fragment.origin, fragment.$field.as_ref())),
                            if $kind.is_mutable() { $mutable } else { $immutable },
                        ),
                    )*
                }
            }

            pub fn provenance(&self, setting: SettingName) -> &Provenance {
                match setting {
                    $( SettingName::$variant => &self.$field.provenance, )*
                }
            }

            /// The rendered value of a setting.
            pub fn render(&self, setting: SettingName) -> String {
                match setting {
                    $( SettingName::$variant => self.$field.value.render(), )*
                }
            }
        }
    };
}

settings_schema! {
    kind;

    /// Package of the generated type; `*` is the model trait's package.
    PackageName package_name: String {
        immutable: "*".to_owned(),
        mutable: "*".to_owned(),
    }
    /// Name of the generated type; `*` is the model trait's name.
    ClassName class_name: String {
        immutable: "Immutable*".to_owned(),
        mutable: "Mutable*".to_owned(),
    }
    /// Prefix of getter methods. May be empty for fluent names.
    GetterPrefix getter_prefix: String {
        immutable: "get".to_owned(),
        mutable: "get".to_owned(),
    }
    /// Prefix of boolean getter methods.
    BooleanGetterPrefix boolean_getter_prefix: String {
        immutable: "is".to_owned(),
        mutable: "is".to_owned(),
    }
    /// Types other than `bool` that boolean getters may return.
    BooleanTypes boolean_types: Vec<String> {
        immutable: vec!["Option<bool>".to_owned()],
        mutable: vec!["Option<bool>".to_owned()],
    }
    /// Prefix of generated setter methods.
    SetterPrefix setter_prefix: String {
        immutable: "set".to_owned(),
        mutable: "set".to_owned(),
    }
    /// Visibility of generated fields.
    FieldVisibility field_visibility: Visibility {
        immutable: Visibility::Private,
        mutable: Visibility::Private,
    }
    /// Which attributes are skipped when serializing.
    FieldTransience field_transience: Inclusion {
        immutable: Inclusion::ExcludeAll,
        mutable: Inclusion::ExcludeAll,
    }
    /// Which attributes take part in `PartialEq` and `Hash`.
    Equality equality: Inclusion {
        immutable: Inclusion::IncludeAll,
        mutable: Inclusion::IncludeAll,
    }
    /// Which attributes appear in the `Debug` representation.
    ToString to_string: Inclusion {
        immutable: Inclusion::IncludeAll,
        mutable: Inclusion::IncludeAll,
    }
    /// Which attributes get a setter on mutable models.
    Setters setters: Inclusion {
        immutable: Inclusion::ExcludeAll,
        mutable: Inclusion::IncludeAll,
    }
    /// Builder strategy to generate.
    Builder builder: BuilderKind {
        immutable: BuilderKind::None,
        mutable: BuilderKind::None,
    }
    /// Name of the associated function that creates a builder.
    BuilderMethodName builder_method_name: String {
        immutable: "builder".to_owned(),
        mutable: "builder".to_owned(),
    }
    /// Name of the builder method that produces the model.
    BuildMethodName build_method_name: String {
        immutable: "build".to_owned(),
        mutable: "build".to_owned(),
    }
    /// Generate a `to_builder` method on the model.
    ToBuilder to_builder: bool {
        immutable: false,
        mutable: false,
    }
    /// Derive `serde::Serialize` and `serde::Deserialize` on the model.
    Serde serde: bool {
        immutable: false,
        mutable: false,
    }
}
