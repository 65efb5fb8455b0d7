//! Ingestion configuration.

use std::path::PathBuf;

use filings_core::{DataError, EdgarConfig, FilingFormSet, Result};
use filings_mdna::{ExtractOptions, ScorerKind};

/// Default output root.
pub const DEFAULT_OUTPUT_ROOT: &str = "data/parquet";

/// File name of the reference cache inside the cache root.
pub const CACHE_FILE_NAME: &str = "reference.sqlite";

/// Configuration of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Registry access.
    pub edgar: EdgarConfig,
    /// Directory receiving one sub-directory per company.
    pub output_root: PathBuf,
    /// Directory of the persistent reference cache; in-memory when unset.
    pub cache_root: Option<PathBuf>,
    /// Caller's form hints, merged with discovered forms.
    pub forms: FilingFormSet,
    /// Whether to extract MD&A sections.
    pub mdna: bool,
    /// MD&A extraction tunables.
    pub extract: ExtractOptions,
    /// MD&A candidate scorer.
    pub scorer: ScorerKind,
}

impl IngestConfig {
    /// Creates a configuration with defaults for everything but the identity.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            edgar: EdgarConfig::new(identity),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            cache_root: None,
            forms: FilingFormSet::empty(),
            mdna: true,
            extract: ExtractOptions::default(),
            scorer: ScorerKind::default(),
        }
    }

    /// Reads `EDGAR_IDENTITY` (or `EDGAR_EMAIL`), `DATA_DIR` and `CACHE_DIR`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from a variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let identity = non_empty("EDGAR_IDENTITY")
            .or_else(|| non_empty("EDGAR_EMAIL"))
            .ok_or_else(|| {
                DataError::InvalidParameter(
                    "EDGAR_IDENTITY (or EDGAR_EMAIL) must name a contact for the registry".to_string(),
                )
            })?;

        let mut config = Self::new(identity);
        if let Some(dir) = non_empty("DATA_DIR") {
            config.output_root = PathBuf::from(dir);
        }
        config.cache_root = non_empty("CACHE_DIR").map(PathBuf::from);
        Ok(config)
    }

    /// Replaces the registry configuration.
    #[must_use]
    pub fn with_edgar(mut self, edgar: EdgarConfig) -> Self {
        self.edgar = edgar;
        self
    }

    /// Sets the output root.
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Sets the reference cache directory.
    #[must_use]
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }

    /// Sets the form hints.
    #[must_use]
    pub fn with_forms(mut self, forms: FilingFormSet) -> Self {
        self.forms = forms;
        self
    }

    /// Enables or disables MD&A extraction.
    #[must_use]
    pub const fn with_mdna(mut self, enabled: bool) -> Self {
        self.mdna = enabled;
        self
    }

    /// Sets the MD&A extraction options.
    #[must_use]
    pub const fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }

    /// Sets the MD&A scorer.
    #[must_use]
    pub const fn with_scorer(mut self, scorer: ScorerKind) -> Self {
        self.scorer = scorer;
        self
    }

    /// Path of the persistent cache file, when a cache root is set.
    #[must_use]
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache_root.as_ref().map(|root| root.join(CACHE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = IngestConfig::from_vars(lookup(&[("EDGAR_EMAIL", "ops@example.com")])).unwrap();

        assert_eq!(config.edgar.identity, "ops@example.com");
        assert_eq!(config.output_root, PathBuf::from(DEFAULT_OUTPUT_ROOT));
        assert!(config.cache_path().is_none());
        assert!(config.mdna);
    }

    #[test]
    fn test_identity_takes_precedence_over_email() {
        let config = IngestConfig::from_vars(lookup(&[
            ("EDGAR_IDENTITY", "Research Desk desk@example.com"),
            ("EDGAR_EMAIL", "ops@example.com"),
            ("DATA_DIR", "/tmp/out"),
            ("CACHE_DIR", "/tmp/cache"),
        ]))
        .unwrap();

        assert_eq!(config.edgar.identity, "Research Desk desk@example.com");
        assert_eq!(config.output_root, PathBuf::from("/tmp/out"));
        assert_eq!(
            config.cache_path(),
            Some(PathBuf::from("/tmp/cache").join(CACHE_FILE_NAME))
        );
    }

    #[test]
    fn test_missing_identity() {
        let err = IngestConfig::from_vars(lookup(&[("EDGAR_EMAIL", "  ")])).unwrap_err();
        assert!(matches!(err, DataError::InvalidParameter(_)));
    }
}
