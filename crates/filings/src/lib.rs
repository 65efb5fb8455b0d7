#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC filing ingestion.
//!
//! This crate ties the pipeline together. It re-exports the core types and
//! provides the [`Ingestor`], which resolves identifiers, fetches statements
//! with fallback between sources, extracts MD&A sections, runs the analysis
//! and writes everything under one directory per company.
//!
//! # Example
//!
//! ```no_run
//! use filings::{IngestConfig, Ingestor};
//!
//! #[tokio::main]
//! async fn main() -> filings::Result<()> {
//!     let config = IngestConfig::from_env()?.with_output_root("data/parquet");
//!     let ingestor = Ingestor::new(config)?;
//!
//!     let report = ingestor.ingest(&["AAPL", "NVO"]).await;
//!     for path in &report.outputs {
//!         println!("{}", path.display());
//!     }
//!     for failure in &report.failures {
//!         eprintln!("{failure}");
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use filings_core::*;

/// Ingestion configuration.
pub mod config;
/// Per-company ingestion pipeline.
pub mod pipeline;
/// Statement source registry with fallback behavior.
pub mod registry;
/// Artifact writer.
pub mod writer;

pub use config::IngestConfig;
pub use filings_analysis::{AnalysisKind, AnalysisTable, StatementAnalysis, analyze};
pub use filings_cache::{InMemoryCache, SqliteCache};
pub use filings_edgar::{CompanyFactsSource, EdgarClient, FilingXbrlSource, Resolver};
pub use filings_mdna::{ExtractOptions, MdnaExtractor, ScorerKind, extract_mdna};
pub use pipeline::{IngestionReport, Ingestor, analyze_output_root};
pub use registry::{SourceRegistry, SourcedStatements};
pub use writer::OutputWriter;
