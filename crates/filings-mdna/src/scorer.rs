//! Candidate selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::candidates::Candidate;

/// Picks one candidate span as the MD&A section.
pub trait SectionScorer: Send + Sync + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Selects a candidate, or none if no candidate qualifies.
    fn select<'a>(&self, text: &str, candidates: &'a [Candidate]) -> Option<&'a Candidate>;
}

/// Longest span, earliest on ties.
fn longest<'a>(candidates: impl IntoIterator<Item = &'a Candidate>) -> Option<&'a Candidate> {
    candidates.into_iter().fold(None, |best, c| match best {
        Some(b) if b.len() >= c.len() => Some(b),
        _ => Some(c),
    })
}

/// Picks the longest candidate.
///
/// A table of contents entry ends quickly, the real section runs until the
/// next item. This fails when a stray heading opens a span that swallows
/// the rest of the filing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestSpan;

impl SectionScorer for LongestSpan {
    fn name(&self) -> &str {
        "longest"
    }

    fn select<'a>(&self, _text: &str, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
        longest(candidates)
    }
}

/// Prefers candidates mentioning typical MD&A subsections, then the longest.
///
/// Falls back to the longest candidate when none mentions a keyword.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(["Results of Operations", "Liquidity"])
    }
}

impl KeywordFilter {
    /// Creates a filter over the given keywords (matched case-insensitively).
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    fn mentions_keyword(&self, section: &str) -> bool {
        let lower = section.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

impl SectionScorer for KeywordFilter {
    fn name(&self) -> &str {
        "keyword"
    }

    fn select<'a>(&self, text: &str, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
        longest(
            candidates
                .iter()
                .filter(|c| self.mentions_keyword(c.text(text))),
        )
        .or_else(|| longest(candidates))
    }
}

/// Scorer selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScorerKind {
    /// [`LongestSpan`].
    #[default]
    Longest,
    /// [`KeywordFilter`] with its default keywords.
    Keyword,
}

impl ScorerKind {
    /// Builds the scorer.
    #[must_use]
    pub fn build(self) -> Arc<dyn SectionScorer> {
        match self {
            Self::Longest => Arc::new(LongestSpan),
            Self::Keyword => Arc::new(KeywordFilter::default()),
        }
    }
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "longest" => Ok(Self::Longest),
            "keyword" => Ok(Self::Keyword),
            other => Err(format!("unknown scorer '{other}' (expected longest or keyword)")),
        }
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Longest => "longest",
            Self::Keyword => "keyword",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(start: usize, end: usize) -> Candidate {
        Candidate {
            start,
            end,
            heading: "Item 2".to_string(),
        }
    }

    // A 10-Q's Part II Item 2 (share repurchases) runs to the end of the
    // filing and outgrows the real MD&A.
    const TEXT: &str = "Item 2. MD&A\nResults of Operations improved.\nItem 2. Unregistered Sales of Equity Securities\nNone during the quarter, nothing else to report here at all.";

    fn candidates() -> Vec<Candidate> {
        let second = TEXT.find("Item 2. Unregistered").unwrap();
        vec![candidate(0, second), candidate(second, TEXT.len())]
    }

    #[test]
    fn test_longest_span() {
        let candidates = candidates();
        let selected = LongestSpan.select(TEXT, &candidates).unwrap();
        assert!(selected.text(TEXT).starts_with("Item 2. Unregistered"));
    }

    #[test]
    fn test_longest_span_prefers_earliest_on_ties() {
        let candidates = vec![candidate(0, 10), candidate(10, 20)];
        assert_eq!(LongestSpan.select("", &candidates).unwrap().start, 0);
        assert!(LongestSpan.select("", &[]).is_none());
    }

    #[test]
    fn test_keyword_filter() {
        let candidates = candidates();
        let selected = KeywordFilter::default().select(TEXT, &candidates).unwrap();
        assert!(selected.text(TEXT).starts_with("Item 2. MD&A"));

        let unmatched = KeywordFilter::new(["Critical Accounting"]);
        let fallback = unmatched.select(TEXT, &candidates).unwrap();
        assert_eq!(fallback.start, candidates[1].start);
    }

    #[test]
    fn test_scorer_kind_from_str() {
        assert_eq!("Keyword".parse::<ScorerKind>().unwrap(), ScorerKind::Keyword);
        assert_eq!(ScorerKind::default().build().name(), "longest");
        assert!("fancy".parse::<ScorerKind>().is_err());
    }
}
