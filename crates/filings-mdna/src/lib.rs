#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Candidate section spans.
pub mod candidates;
/// MD&A extraction.
pub mod extract;
/// HTML to plain text.
pub mod flatten;
/// Heading patterns per form.
pub mod patterns;
/// Candidate selection.
pub mod scorer;

pub use candidates::{Candidate, DEFAULT_END_MARKER_GRACE, find_candidates};
pub use extract::{DEFAULT_MIN_SECTION_CHARS, ExtractOptions, MdnaExtractor, extract_mdna};
pub use flatten::{flatten_documents, flatten_html};
pub use patterns::{SectionPatterns, patterns_for};
pub use scorer::{KeywordFilter, LongestSpan, ScorerKind, SectionScorer};
