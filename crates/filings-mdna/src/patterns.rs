//! Heading and next-item patterns per form.

use filings_core::{ExtractionError, FormType};
use once_cell::sync::Lazy;
use regex::Regex;

/// Patterns delimiting the MD&A section of one form.
#[derive(Debug)]
pub struct SectionPatterns {
    /// Form the patterns apply to.
    pub form: FormType,
    /// Section headings, most specific first.
    pub starts: Vec<Regex>,
    /// Headings of the items that follow the section.
    pub ends: Vec<Regex>,
    /// Heading before which no candidate may start, if any.
    pub gate: Option<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("Failed to compile MD&A pattern"))
        .collect()
}

static ANNUAL_DOMESTIC: Lazy<SectionPatterns> = Lazy::new(|| SectionPatterns {
    form: FormType::AnnualDomestic,
    starts: compile(&[
        r"Item\s+7\.?\s*[:\-]?\s*Management'?s?\s+Discussion\s+and\s+Analysis",
        r"Item\s+7\b",
        r"Management'?s?\s+Discussion\s+and\s+Analysis\s+of\s+Financial",
    ]),
    ends: compile(&[r"Item\s+7A\b", r"Item\s+8\b"]),
    gate: compile(&[r"Part\s+II\b"]).into_iter().next(),
});

static QUARTERLY_DOMESTIC: Lazy<SectionPatterns> = Lazy::new(|| SectionPatterns {
    form: FormType::QuarterlyDomestic,
    starts: compile(&[
        r"Item\s+2\.?\s*[:\-]?\s*Management'?s?\s+Discussion\s+and\s+Analysis",
        r"Item\s+2\b",
    ]),
    ends: compile(&[r"Item\s+3\b", r"Item\s+4\b"]),
    gate: None,
});

static ANNUAL_FOREIGN: Lazy<SectionPatterns> = Lazy::new(|| SectionPatterns {
    form: FormType::AnnualForeignPrimary,
    starts: compile(&[
        r"Item\s+5\.?\s*[:\-]?\s*Operating\s+and\s+Financial\s+Review",
        r"Item\s+5\b",
    ]),
    ends: compile(&[r"Item\s+6\b"]),
    gate: None,
});

/// Patterns for a form.
///
/// 40-F filings wrap the issuer's home-country annual report and have no
/// item structure to search.
pub fn patterns_for(form: FormType) -> Result<&'static SectionPatterns, ExtractionError> {
    match form {
        FormType::AnnualDomestic => Ok(&*ANNUAL_DOMESTIC),
        FormType::QuarterlyDomestic => Ok(&*QUARTERLY_DOMESTIC),
        FormType::AnnualForeignPrimary => Ok(&*ANNUAL_FOREIGN),
        FormType::AnnualForeignSecondary => Err(ExtractionError::UnsupportedForm(form.code().to_string())),
    }
}

/// True when `pos` is the first byte of a line.
#[must_use]
pub fn at_line_start(text: &str, pos: usize) -> bool {
    pos == 0 || text.as_bytes().get(pos - 1) == Some(&b'\n')
}
