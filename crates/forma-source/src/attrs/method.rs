use darling::ast::NestedMeta;
use darling::{FromAttributes, FromMeta};
use forma_ir::{Feature, FeatureMarkers, Marker, Visibility};

use super::Parsed;

/// `#[forma(include(...), exclude(...), visibility = "...")]` on a trait
/// method. Each key may appear once.
#[derive(Debug, Default, FromAttributes)]
#[darling(default, attributes(forma))]
pub struct MethodArgs {
    pub include: Option<FeatureList>,
    pub exclude: Option<FeatureList>,
    pub visibility: Option<Parsed<Visibility>>,
}

impl MethodArgs {
    /// The markers of this method. A feature that is both included and
    /// excluded is an error.
    pub fn markers(&self) -> darling::Result<FeatureMarkers> {
        let mut markers = FeatureMarkers::new();
        let mut errors = darling::Error::accumulator();
        let included = self.include.iter().flat_map(|list| list.0.iter());
        let excluded = self.exclude.iter().flat_map(|list| list.0.iter());
        for (feature, marker) in included
            .map(|f| (f, Marker::Include))
            .chain(excluded.map(|f| (f, Marker::Exclude)))
        {
            match markers.insert(*feature, marker) {
                Some(previous) if previous != marker => errors.push(darling::Error::custom(format!(
                    "`{feature}` is both included and excluded"
                ))),
                Some(_) => errors.push(darling::Error::custom(format!(
                    "`{feature}` is listed twice"
                ))),
                None => {}
            }
        }
        errors.finish_with(markers)
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility.map(|v| v.0)
    }
}

/// `include(equality, setter)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureList(pub Vec<Feature>);

impl FromMeta for FeatureList {
    fn from_list(items: &[NestedMeta]) -> darling::Result<Self> {
        let mut errors = darling::Error::accumulator();
        let mut features = Vec::with_capacity(items.len());
        for item in items {
            let feature = match item {
                NestedMeta::Meta(syn::Meta::Path(path)) => path
                    .get_ident()
                    .ok_or_else(|| darling::Error::custom("expected a feature name"))
                    .and_then(|ident| {
                        ident
                            .to_string()
                            .parse::<Feature>()
                            .map_err(|err| darling::Error::custom(err.to_string()))
                    })
                    .map_err(|err| err.with_span(path)),
                other => Err(darling::Error::custom("expected a feature name").with_span(other)),
            };
            if let Some(feature) = errors.handle(feature) {
                features.push(feature);
            }
        }
        errors.finish_with(FeatureList(features))
    }
}
