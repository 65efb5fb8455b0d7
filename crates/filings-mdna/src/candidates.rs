//! Candidate section spans.

use std::collections::BTreeMap;

use crate::patterns::{SectionPatterns, at_line_start};

/// Default distance (bytes) after a heading inside which end markers are ignored.
///
/// Tables of contents list the following items right after the heading.
pub const DEFAULT_END_MARKER_GRACE: usize = 800;

/// A possible MD&A span in the flattened filing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Byte offset of the heading.
    pub start: usize,
    /// Byte offset (exclusive) of the next-item marker, or the text length.
    pub end: usize,
    /// Pattern that matched the heading.
    pub heading: String,
}

impl Candidate {
    /// Span length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for an empty span.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// The candidate's text.
    #[must_use]
    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Byte offset where the section opened at `start` ends.
fn section_end(text: &str, start: usize, patterns: &SectionPatterns, grace: usize) -> usize {
    let remainder = &text[start..];
    patterns
        .ends
        .iter()
        .filter_map(|re| {
            re.find_iter(remainder)
                .map(|m| m.start())
                .filter(|&offset| offset >= grace)
                .find(|&offset| at_line_start(text, start + offset))
        })
        .min()
        .map_or(text.len(), |offset| start + offset)
}

/// Lists every candidate span, ordered by start offset.
///
/// A candidate opens at each line-start match of a heading pattern; when
/// several patterns match at one offset the earliest pattern names it. If
/// the patterns carry a gate, candidates before the first line-start gate
/// match are dropped. Each candidate closes at the first line-start end
/// marker at least `grace` bytes past its start.
#[must_use]
pub fn find_candidates(text: &str, patterns: &SectionPatterns, grace: usize) -> Vec<Candidate> {
    let floor = patterns
        .gate
        .as_ref()
        .and_then(|gate| {
            gate.find_iter(text)
                .map(|m| m.start())
                .find(|&pos| at_line_start(text, pos))
        })
        .unwrap_or(0);

    let mut starts: BTreeMap<usize, &str> = BTreeMap::new();
    for re in &patterns.starts {
        for m in re.find_iter(text) {
            if m.start() >= floor && at_line_start(text, m.start()) {
                starts.entry(m.start()).or_insert(re.as_str());
            }
        }
    }

    starts
        .into_iter()
        .map(|(start, heading)| Candidate {
            start,
            end: section_end(text, start, patterns, grace),
            heading: heading.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::patterns_for;
    use filings_core::FormType;

    #[test]
    fn test_ten_k_candidates_after_part_ii() {
        let text = "Table of Contents\nItem 7. Management's Discussion and Analysis\n\
                    PART II\nItem 7. Management's Discussion and Analysis of Financial Condition\n\
                    Revenue grew.\nItem 7A. Market Risk\nItem 8. Financial Statements";
        let patterns = patterns_for(FormType::AnnualDomestic).unwrap();

        let candidates = find_candidates(text, patterns, 0);
        assert_eq!(candidates.len(), 1);
        let section = candidates[0].text(text);
        assert!(section.starts_with("Item 7. Management's"));
        assert!(section.ends_with("Revenue grew.\n"));
        assert_eq!(candidates[0].heading, patterns.starts[0].as_str());
    }

    #[test]
    fn test_in_sentence_references_are_not_headings() {
        let text = "See Item 2 for details.\nItem 2. Management's Discussion and Analysis\nSales rose.";
        let patterns = patterns_for(FormType::QuarterlyDomestic).unwrap();

        let candidates = find_candidates(text, patterns, 0);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].end, text.len());
    }

    #[test]
    fn test_end_markers_within_grace_are_ignored() {
        let text = "Item 5. Operating and Financial Review\nItem 6\nbody text\nItem 6. Directors";
        let patterns = patterns_for(FormType::AnnualForeignPrimary).unwrap();

        let strict = find_candidates(text, patterns, 0);
        assert_eq!(strict[0].text(text), "Item 5. Operating and Financial Review\n");

        let lenient = find_candidates(text, patterns, 45);
        assert!(lenient[0].text(text).ends_with("body text\n"));
    }

    #[test]
    fn test_no_heading_yields_no_candidates() {
        let patterns = patterns_for(FormType::AnnualDomestic).unwrap();
        assert!(find_candidates("nothing to see", patterns, DEFAULT_END_MARKER_GRACE).is_empty());
    }
}
