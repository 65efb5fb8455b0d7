//! MD&A extraction.

use std::sync::Arc;

use filings_core::{ExtractionError, FilingDocument, FormType, MdnaSection};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::candidates::{DEFAULT_END_MARKER_GRACE, find_candidates};
use crate::flatten::flatten_documents;
use crate::patterns::patterns_for;
use crate::scorer::{LongestSpan, SectionScorer};

/// Default minimum section length in characters.
pub const DEFAULT_MIN_SECTION_CHARS: usize = 50;

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Failed to compile BLANK_LINES"));

/// Tunables for [`MdnaExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Bytes after a heading inside which end markers are ignored.
    pub end_marker_grace: usize,
    /// Sections shorter than this many characters count as not found.
    pub min_section_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            end_marker_grace: DEFAULT_END_MARKER_GRACE,
            min_section_chars: DEFAULT_MIN_SECTION_CHARS,
        }
    }
}

/// Extracts MD&A sections with a pluggable scorer.
#[derive(Debug, Clone)]
pub struct MdnaExtractor {
    options: ExtractOptions,
    scorer: Arc<dyn SectionScorer>,
}

impl Default for MdnaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MdnaExtractor {
    /// Creates an extractor with default options and the [`LongestSpan`] scorer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
            scorer: Arc::new(LongestSpan),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub const fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn SectionScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extracts the MD&A section from a filing's documents.
    pub fn extract(
        &self,
        documents: &[FilingDocument],
        form: FormType,
    ) -> Result<MdnaSection, ExtractionError> {
        let patterns = patterns_for(form)?;
        if documents.is_empty() {
            return Err(ExtractionError::NoDocuments);
        }

        let text = flatten_documents(documents);
        let candidates = find_candidates(&text, patterns, self.options.end_marker_grace);
        debug!(
            form = %form,
            chars = text.len(),
            candidates = candidates.len(),
            scorer = self.scorer.name(),
            "Searching for MD&A"
        );

        let selected = self
            .scorer
            .select(&text, &candidates)
            .ok_or_else(|| ExtractionError::NoHeading(form.code().to_string()))?;

        let section = BLANK_LINES
            .replace_all(selected.text(&text), "\n\n")
            .trim()
            .to_string();
        let len = section.chars().count();
        if section.is_empty() || len < self.options.min_section_chars {
            return Err(ExtractionError::TooShort {
                len,
                min: self.options.min_section_chars,
            });
        }

        Ok(MdnaSection {
            text: section,
            start: selected.start,
            end: selected.end,
            heading: selected.heading.clone(),
            form,
        })
    }
}

/// Extracts the MD&A section with the default extractor.
pub fn extract_mdna(
    documents: &[FilingDocument],
    form: FormType,
) -> Result<MdnaSection, ExtractionError> {
    MdnaExtractor::new().extract(documents, form)
}
