//! Attribute features, inclusion policies and resolved attribute descriptors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::UnknownValueError;
use crate::decl::{DeclaredMethod, TypeRef};

/// Visibility of a generated field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// No modifier.
    #[default]
    Private,
    /// `pub(crate)`.
    Crate,
    /// `pub`.
    Pub,
}

impl FromStr for Visibility {
    type Err = UnknownValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "private" => Ok(Visibility::Private),
            "crate" | "pub(crate)" => Ok(Visibility::Crate),
            "pub" => Ok(Visibility::Pub),
            other => Err(UnknownValueError {
                kind: "visibility",
                value: other.to_owned(),
                expected: "private, crate, pub",
            }),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Visibility::Private => "private",
            Visibility::Crate => "crate",
            Visibility::Pub => "pub",
        })
    }
}

/// Global policy for an attribute feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inclusion {
    /// Every attribute has the feature unless it is explicitly excluded.
    IncludeAll,
    /// No attribute has the feature unless it is explicitly included.
    ExcludeAll,
}

impl Inclusion {
    /// Whether an attribute carrying `marker` (if any) has the feature.
    ///
    /// A marker that agrees with the policy is redundant, not an error.
    pub fn resolve(self, marker: Option<Marker>) -> bool {
        match (self, marker) {
            (_, Some(Marker::Include)) => true,
            (_, Some(Marker::Exclude)) => false,
            (Inclusion::IncludeAll, None) => true,
            (Inclusion::ExcludeAll, None) => false,
        }
    }
}

impl FromStr for Inclusion {
    type Err = UnknownValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "include_all" => Ok(Inclusion::IncludeAll),
            "exclude_all" => Ok(Inclusion::ExcludeAll),
            other => Err(UnknownValueError {
                kind: "inclusion policy",
                value: other.to_owned(),
                expected: "include_all, exclude_all",
            }),
        }
    }
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Inclusion::IncludeAll => "include_all",
            Inclusion::ExcludeAll => "exclude_all",
        })
    }
}

/// Features that can be switched per attribute with include/exclude markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Equality,
    ToString,
    Setter,
    Transient,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Equality,
        Feature::ToString,
        Feature::Setter,
        Feature::Transient,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Equality => "equality",
            Feature::ToString => "to_string",
            Feature::Setter => "setter",
            Feature::Transient => "transient",
        }
    }
}

impl FromStr for Feature {
    type Err = UnknownValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == value.trim())
            .ok_or_else(|| UnknownValueError {
                kind: "feature",
                value: value.trim().to_owned(),
                expected: "equality, to_string, setter, transient",
            })
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An explicit per-method marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Include,
    Exclude,
}

/// The include/exclude markers found on one method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureMarkers(BTreeMap<Feature, Marker>);

impl FeatureMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, feature: Feature, marker: Marker) -> Self {
        self.0.insert(feature, marker);
        self
    }

    /// Records a marker, returning the marker previously recorded for the
    /// same feature.
    pub fn insert(&mut self, feature: Feature, marker: Marker) -> Option<Marker> {
        self.0.insert(feature, marker)
    }

    pub fn get(&self, feature: Feature) -> Option<Marker> {
        self.0.get(&feature).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, Marker)> + '_ {
        self.0.iter().map(|(feature, marker)| (*feature, *marker))
    }
}

/// A `#[deprecated]` marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Deprecation {
    pub since: Option<String>,
    pub note: Option<String>,
}

/// One resolved model attribute.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct AttributeDescriptor {
    /// Name derived from the getter, e.g. `userName`.
    #[builder(into)]
    pub name: String,
    /// Identifier used for fields and parameters, e.g. `user_name`.
    #[builder(into)]
    pub identifier: String,
    pub ty: TypeRef,
    #[builder(default)]
    pub is_final: bool,
    #[builder(default)]
    pub transient: bool,
    #[builder(default)]
    pub field_visibility: Visibility,
    #[builder(default)]
    pub setter: bool,
    #[builder(default = true)]
    pub in_equality: bool,
    #[builder(default = true)]
    pub in_to_string: bool,
    /// A builder must set this attribute before it can build.
    #[builder(default = true)]
    pub mandatory: bool,
    /// The getter this attribute overrides.
    pub getter: DeclaredMethod,
    pub deprecation: Option<Deprecation>,
}

/// Attributes of a model, ordered and keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet(BTreeMap<String, AttributeDescriptor>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute, returning the attribute it replaced if the name
    /// was already taken.
    pub fn insert(&mut self, attribute: AttributeDescriptor) -> Option<AttributeDescriptor> {
        self.0.insert(attribute.name.clone(), attribute)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.0.values()
    }

    pub fn mandatory(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.iter().filter(|a| a.mandatory)
    }

    pub fn optional(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.iter().filter(|a| !a.mandatory)
    }
}

impl FromIterator<AttributeDescriptor> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = AttributeDescriptor>>(iter: I) -> Self {
        let mut set = AttributeSet::new();
        for attribute in iter {
            set.insert(attribute);
        }
        set
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a AttributeDescriptor;
    type IntoIter = std::collections::btree_map::Values<'a, String, AttributeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}
