#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR registry access.
//!
//! This crate provides everything that talks to the registry:
//!
//! - Ticker to CIK resolution with a cached secondary lookup
//! - Filing history and periodic form discovery
//! - Statement sources reading per-filing XBRL or the company-facts feed
//! - Filing index pages and raw documents for MD&A extraction
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use filings_cache::InMemoryCache;
//! use filings_core::{EdgarConfig, FetchRequest, FilingFormSet, StatementSource};
//! use filings_edgar::{EdgarClient, FilingXbrlSource, Resolver, discover_forms};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EdgarClient::new(EdgarConfig::new("MyApp contact@example.com"))?;
//!     let resolver = Resolver::edgar(client.clone(), Arc::new(InMemoryCache::new()));
//!
//!     let company = resolver.resolve("AAPL").await?;
//!     let discovery = discover_forms(&client, &company).await;
//!     let forms = discovery.forms(&FilingFormSet::empty());
//!
//!     let statements = FilingXbrlSource::new(client)
//!         .fetch_statements(FetchRequest {
//!             company: &company,
//!             forms: &forms,
//!             filings: discovery.filings(),
//!         })
//!         .await?;
//!     for (kind, table) in &statements {
//!         println!("{kind}: {} rows", table.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Filing index pages and raw documents.
pub mod archive;
/// Rate-limited HTTP client.
pub mod client;
/// Company-facts statement source.
pub mod facts;
/// Per-filing XBRL statement source.
pub mod filing;
/// Filing history and form discovery.
pub mod history;
/// Registry response models.
pub mod models;
/// Identifier resolution.
pub mod resolve;
/// XBRL instance and presentation parsing.
pub mod xbrl;

pub use archive::{IndexEntry, fetch_filing_documents, fetch_filing_index, mdna_documents, parse_filing_index};
pub use client::EdgarClient;
pub use facts::{ClassificationRules, CompanyFactsSource, build_statements};
pub use filing::FilingXbrlSource;
pub use history::{Discovery, FilingHistory, MAX_HISTORY_ROWS, discover_forms, select_recent_filings};
pub use resolve::{REFERENCE_NAMESPACE, Resolver, TickerDirectory, TickerFile, is_numeric_id, parse_ticker_file};
pub use xbrl::{StatementConcepts, XbrlFact, XbrlInstance, classify_role, locate_documents, parse_instance, parse_presentation};
