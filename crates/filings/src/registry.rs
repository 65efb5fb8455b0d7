//! Statement source registry with fallback behavior.

use std::sync::Arc;

use tracing::{debug, warn};

use filings_core::{
    DataError, FetchError, FetchRequest, PrimaryFetchError, StatementSource, Statements,
};

/// Statements together with the name of the source that produced them.
#[derive(Debug, Clone)]
pub struct SourcedStatements {
    /// Source name ("filings" or "facts").
    pub source: String,
    /// Statement tables.
    pub statements: Statements,
}

/// Ordered statement sources, tried until one succeeds.
///
/// The first registered source is the primary one; every later source is a
/// fallback used only when all earlier sources failed.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn StatementSource>>,
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SourceRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source after the ones already registered.
    pub fn register(&mut self, source: Arc<dyn StatementSource>) {
        debug!(source = source.name(), "Registering statement source");
        self.sources.push(source);
    }

    /// Register a source, builder style.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn StatementSource>) -> Self {
        self.register(source);
        self
    }

    /// Names of the registered sources in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Fetch statements, trying sources in order until one succeeds.
    ///
    /// Returns the last source's error when every source fails.
    pub async fn fetch(
        &self,
        request: FetchRequest<'_>,
    ) -> Result<SourcedStatements, FetchError> {
        let mut last_error = None;
        for source in &self.sources {
            debug!(
                source = source.name(),
                cik = %request.company.canonical_id,
                "Fetching statements"
            );

            match source.fetch_statements(request).await {
                Ok(statements) => {
                    return Ok(SourcedStatements {
                        source: source.name().to_string(),
                        statements,
                    });
                }
                Err(e) => {
                    warn!(
                        source = source.name(),
                        cik = %request.company.canonical_id,
                        error = %e,
                        "Source failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            PrimaryFetchError::Data(DataError::InvalidParameter(
                "no statement sources registered".to_string(),
            ))
            .into()
        }))
    }
}
