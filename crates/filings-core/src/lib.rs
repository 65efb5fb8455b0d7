#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for SEC filing ingestion.
//!
//! This crate provides the foundational abstractions shared by every stage:
//!
//! - [`StatementSource`](source::StatementSource) - Produces statement tables
//! - [`IdentifierLookup`](source::IdentifierLookup) - Ticker to CIK lookups
//! - [`ReferenceCache`](cache::ReferenceCache) - Caching abstraction
//! - [`EdgarConfig`](config::EdgarConfig) - Registry access configuration

/// Cache trait for reference data.
pub mod cache;
/// Registry access configuration.
pub mod config;
/// Error types for every pipeline stage.
pub mod error;
/// Periodic form vocabulary.
pub mod form;
/// Statement source and identifier lookup traits.
pub mod source;
/// Core data types (CompanyIdentity, Period, StatementTable, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::ReferenceCache;
pub use config::{EdgarConfig, Endpoints};
pub use error::{
    AnalysisAmbiguityError, DataError, ExtractionError, FallbackFetchError, FetchError,
    PrimaryFetchError, ResolutionError, Result, Stage, StageFailure,
};
pub use form::{FilingFormSet, FormType};
pub use source::{FetchRequest, IdentifierLookup, StatementSource};
pub use types::{
    CompanyIdentity, FilingDocument, FilingRef, MdnaSection, Period, StatementKind, StatementRow,
    StatementTable, Statements, normalize_cik,
};
