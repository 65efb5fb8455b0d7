//! Seam traits between the pipeline and the registry.
//!
//! - [`StatementSource`] - Produces statement tables for one company
//! - [`IdentifierLookup`] - Maps a ticker to a CIK

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::{FetchError, Result},
    form::FilingFormSet,
    types::{CompanyIdentity, FilingRef, Statements},
};

/// Everything a statement source may need for one company.
#[derive(Clone, Copy, Debug)]
pub struct FetchRequest<'a> {
    /// Resolved company.
    pub company: &'a CompanyIdentity,
    /// Forms to request.
    pub forms: &'a FilingFormSet,
    /// Filing history, most recent first.
    pub filings: &'a [FilingRef],
}

/// A source of financial statement tables.
///
/// The pipeline holds an ordered list of sources and falls through to the
/// next one when a source fails.
#[async_trait]
pub trait StatementSource: Send + Sync + Debug {
    /// Short tag used in artifact names (e.g. "filings", "facts").
    fn name(&self) -> &str;

    /// Returns a description of this source.
    fn description(&self) -> &str;

    /// Fetches statement tables keyed by kind.
    ///
    /// Kinds with no rows are omitted from the result.
    async fn fetch_statements(
        &self,
        request: FetchRequest<'_>,
    ) -> std::result::Result<Statements, FetchError>;
}

/// A ticker to CIK lookup.
#[async_trait]
pub trait IdentifierLookup: Send + Sync + Debug {
    /// Returns the name of this lookup.
    fn name(&self) -> &str;

    /// Looks up the CIK for an upper-cased ticker.
    ///
    /// Returns [`DataError::NotFound`](crate::DataError::NotFound) for unknown tickers.
    async fn lookup_cik(&self, ticker: &str) -> Result<String>;

    /// Looks up a ticker for a CIK (without leading zeros).
    ///
    /// The default implementation knows no reverse mapping.
    async fn lookup_ticker(&self, _cik: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
