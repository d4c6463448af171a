//! Configuration for code generation.

/// Runtime options of a generation round. Model settings come from the
/// model definition sources; these only affect how files are rendered.
///
/// Use the builder pattern to construct:
/// ```ignore
/// let config = GenerationConfig::builder()
///     .trait_root("crate::models")
///     .parallel(false)
///     .build();
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct GenerationConfig {
    /// Path the model definition sources are mounted at in the consuming
    /// crate. Model traits are referred to as `<trait_root>::<package>::<Trait>`.
    #[builder(into, default = "crate".to_owned())]
    pub trait_root: String,

    /// Start every file with an `@generated` header.
    #[builder(default = true)]
    pub header: bool,

    /// Add `#[allow(...)]` attributes to suppress warnings in generated code.
    #[builder(default = true)]
    pub allow_warnings: bool,

    /// Assemble models on the rayon thread pool.
    #[builder(default = true)]
    pub parallel: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.trait_root, "crate");
        assert!(config.header);
        assert!(config.allow_warnings);
        assert!(config.parallel);
    }
}
