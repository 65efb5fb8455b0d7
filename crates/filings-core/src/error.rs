//! Error types for filing ingestion.
//!
//! [`DataError`] covers transport, parsing, caching and I/O failures. The
//! stage errors ([`ResolutionError`], [`PrimaryFetchError`],
//! [`FallbackFetchError`], [`ExtractionError`], [`AnalysisAmbiguityError`])
//! describe which part of a company's ingestion failed; they are isolated per
//! company or per filing and collected as [`StageFailure`]s.

use std::fmt;

use thiserror::Error;

use crate::types::Period;

/// Errors that can occur while fetching, parsing, caching or writing data.
#[derive(Error, Debug)]
pub enum DataError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// The registry answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http {
        /// Status code returned by the server.
        status: u16,
        /// The requested URL.
        url: String,
    },

    /// The requested identifier or resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error parsing data returned by the registry.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Error producing an output artifact.
    #[error("Output error: {0}")]
    Output(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

/// An identifier could not be mapped to a CIK by any lookup.
///
/// The caller has to ask the user for an explicit CIK.
#[derive(Error, Debug)]
#[error("could not resolve '{token}' to a CIK (directory: {directory}; secondary: {secondary})")]
pub struct ResolutionError {
    /// The token as supplied by the user.
    pub token: String,
    /// Why the directory lookup failed.
    pub directory: String,
    /// Why the secondary lookup failed.
    pub secondary: String,
}

/// The filing-level source could not produce statements for a company.
///
/// Recovered by running the company-facts source.
#[derive(Error, Debug)]
pub enum PrimaryFetchError {
    /// A filing carries no XBRL instance this source can read.
    #[error("unknown submission format for accession {accession}: {detail}")]
    UnknownSubmissionFormat {
        /// Accession number of the offending filing.
        accession: String,
        /// What was missing or unexpected.
        detail: String,
    },

    /// The filing history lists no filing of the requested forms.
    #[error("no filings of forms [{0}] in filing history")]
    NoFilings(String),

    /// Filings were read but no fact sits on a primary statement.
    #[error("no statement facts found in {0} filings")]
    NoStatementFacts(usize),

    /// Transport or parse failure underneath.
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Neither company-facts endpoint produced usable data.
#[derive(Error, Debug)]
#[error("fallback fetch failed for CIK {cik}: {source}")]
pub struct FallbackFetchError {
    /// CIK being fetched.
    pub cik: String,
    /// Underlying failure.
    #[source]
    pub source: DataError,
}

/// Failure of one [`StatementSource`](crate::source::StatementSource).
#[derive(Error, Debug)]
pub enum FetchError {
    /// The filing-level source failed.
    #[error(transparent)]
    Primary(#[from] PrimaryFetchError),

    /// The company-facts source failed.
    #[error(transparent)]
    Fallback(#[from] FallbackFetchError),
}

/// The MD&A section could not be extracted from a filing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No heading pattern matched at the start of any line.
    #[error("no MD&A heading found for form {0}")]
    NoHeading(String),

    /// The form has no item structure to search.
    #[error("MD&A extraction is not supported for form {0}")]
    UnsupportedForm(String),

    /// The filing yielded no documents to search.
    #[error("filing has no documents")]
    NoDocuments,

    /// The best candidate is shorter than the configured minimum.
    #[error("MD&A candidate too short ({len} chars, minimum {min})")]
    TooShort {
        /// Length of the selected section.
        len: usize,
        /// Configured minimum.
        min: usize,
    },
}

/// A statement table holds more than one value for one (concept, period).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("ambiguous source data: {count} values for concept '{concept}' in period {period}")]
pub struct AnalysisAmbiguityError {
    /// Duplicated concept.
    pub concept: String,
    /// Duplicated period.
    pub period: Period,
    /// Number of rows found.
    pub count: usize,
}

/// Pipeline stage at which a failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Identifier resolution.
    Resolve,
    /// Form discovery.
    Discover,
    /// Statement fetch (both sources).
    Fetch,
    /// MD&A extraction for one filing.
    Mdna,
    /// Analysis of one statement kind.
    Analysis,
    /// Writing an artifact.
    Output,
}

impl Stage {
    /// Returns the lowercase stage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Discover => "discover",
            Self::Fetch => "fetch",
            Self::Mdna => "mdna",
            Self::Analysis => "analysis",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One isolated failure: (identifier, stage, error).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageFailure {
    /// Identifier as supplied by the user.
    pub identifier: String,
    /// Stage that failed.
    pub stage: Stage,
    /// Rendered error.
    pub message: String,
}

impl StageFailure {
    /// Creates a failure record from any displayable error.
    #[must_use]
    pub fn new(identifier: impl Into<String>, stage: Stage, error: impl fmt::Display) -> Self {
        Self {
            identifier: identifier.into(),
            stage,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.identifier, self.stage, self.message)
    }
}
