//! HTML to plain text.

use filings_core::FilingDocument;
use scraper::{Html, Node};

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "head"];

fn skipped(node: &scraper::node::Element) -> bool {
    SKIPPED_ELEMENTS.contains(&node.name())
}

/// Flattens one HTML document to text, one line per non-blank text node.
///
/// Whitespace inside a text node collapses to single spaces. Text inside
/// `script`, `style` and `head` is dropped.
#[must_use]
pub fn flatten_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines: Vec<String> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(skipped);
        if hidden {
            continue;
        }

        let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// Flattens a filing's documents and joins them in ordinal order.
#[must_use]
pub fn flatten_documents(documents: &[FilingDocument]) -> String {
    let mut ordered: Vec<&FilingDocument> = documents.iter().collect();
    ordered.sort_by_key(|d| d.ordinal);

    ordered
        .into_iter()
        .map(|d| flatten_html(&d.html))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
