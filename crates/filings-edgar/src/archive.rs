//! Filing archive access: index pages and raw documents.
//!
//! A filing's index page lists every document it contains (Seq, Description,
//! Document, Type). The MD&A stage reads the documents of the filing's own
//! form type plus annual-report exhibits (EX-13), which is where many issuers
//! put the narrative sections.

use filings_core::{CompanyIdentity, DataError, FilingDocument, FilingRef, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::client::EdgarClient;

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("Failed to compile CELL_SELECTOR"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Failed to compile LINK_SELECTOR"));

/// One row of a filing index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Sequence number within the filing.
    pub seq: Option<u32>,
    /// Free-text description.
    pub description: String,
    /// Document file name.
    pub document: String,
    /// Document type (e.g. "10-K", "EX-13").
    pub doc_type: String,
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// File name of a document cell: the link target's last path segment.
fn document_name(cell: &ElementRef<'_>) -> Option<String> {
    let from_link = cell
        .select(&LINK_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| href.rsplit('/').next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    from_link.or_else(|| {
        cell_text(cell)
            .split_whitespace()
            .next()
            .map(str::to_string)
    })
}

/// Parses the document tables of a filing index page.
///
/// Column positions are taken from each table's header row.
#[must_use]
pub fn parse_filing_index(html: &str) -> Vec<IndexEntry> {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for table in document.select(&TABLE_SELECTOR) {
        let mut rows = table.select(&ROW_SELECTOR);
        let Some(header) = rows.next() else {
            continue;
        };
        let headers: Vec<String> = header
            .select(&CELL_SELECTOR)
            .map(|c| cell_text(&c).to_lowercase())
            .collect();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let (Some(document_col), Some(type_col)) = (column("document"), column("type")) else {
            continue;
        };
        let seq_col = column("seq");
        let description_col = column("description");

        for row in rows {
            let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();
            let Some(doc_cell) = cells.get(document_col) else {
                continue;
            };
            let Some(name) = document_name(doc_cell) else {
                continue;
            };
            entries.push(IndexEntry {
                seq: seq_col
                    .and_then(|i| cells.get(i))
                    .and_then(|c| cell_text(c).parse().ok()),
                description: description_col
                    .and_then(|i| cells.get(i))
                    .map(cell_text)
                    .unwrap_or_default(),
                document: name,
                doc_type: cells.get(type_col).map(cell_text).unwrap_or_default(),
            });
        }
    }

    entries
}

fn is_html(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".htm") || lower.ends_with(".html")
}

/// Documents to search for MD&A, in sequence order.
///
/// Keeps HTML documents typed as the filing's form or as an EX-13 exhibit.
#[must_use]
pub fn mdna_documents(entries: &[IndexEntry], form: &str) -> Vec<String> {
    let mut selected: Vec<&IndexEntry> = entries
        .iter()
        .filter(|e| is_html(&e.document))
        .filter(|e| {
            let doc_type = e.doc_type.trim().to_uppercase();
            doc_type == form.trim().to_uppercase() || doc_type.starts_with("EX-13")
        })
        .collect();
    selected.sort_by_key(|e| e.seq.unwrap_or(u32::MAX));

    let mut names: Vec<String> = Vec::with_capacity(selected.len());
    for entry in selected {
        if !names.contains(&entry.document) {
            names.push(entry.document.clone());
        }
    }
    names
}

/// Fetches the index page of a filing (`-index.htm`, then `-index.html`).
pub async fn fetch_filing_index(
    client: &EdgarClient,
    company: &CompanyIdentity,
    filing: &FilingRef,
) -> Result<Vec<IndexEntry>> {
    let folder = filing.accession_no_dashes();
    let mut last_err = DataError::NotFound(format!("index page of {}", filing.accession));

    for suffix in ["-index.htm", "-index.html"] {
        let name = format!("{}{}", filing.accession, suffix);
        let url = client
            .endpoints()
            .archive_file(&company.canonical_id, &folder, &name);
        match client.get_text(&url).await {
            Ok(html) => return Ok(parse_filing_index(&html)),
            Err(e) => {
                debug!(url = %url, error = %e, "Index page not available");
                last_err = e;
            }
        }
    }

    Err(last_err)
}

/// Fetches the raw documents of a filing that may hold its MD&A.
///
/// Falls back to the primary document named in the filing history when the
/// index page cannot be read or lists no matching document. A document that
/// cannot be fetched is skipped; the call fails only when every listed
/// document failed. Returns an empty list when nothing is listed at all.
pub async fn fetch_filing_documents(
    client: &EdgarClient,
    company: &CompanyIdentity,
    filing: &FilingRef,
) -> Result<Vec<FilingDocument>> {
    let mut names = match fetch_filing_index(client, company, filing).await {
        Ok(entries) => mdna_documents(&entries, &filing.form),
        Err(e) => {
            warn!(accession = %filing.accession, error = %e, "Filing index unavailable");
            Vec::new()
        }
    };

    if names.is_empty() {
        if let Some(primary) = filing.primary_document.as_deref().filter(|d| is_html(d)) {
            names.push(primary.to_string());
        }
    }

    let folder = filing.accession_no_dashes();
    let mut documents = Vec::with_capacity(names.len());
    let mut last_err = None;
    for (ordinal, name) in names.into_iter().enumerate() {
        let url = client
            .endpoints()
            .archive_file(&company.canonical_id, &folder, &name);
        match client.get_text(&url).await {
            Ok(html) => {
                debug!(accession = %filing.accession, document = %name, bytes = html.len(), "Fetched document");
                documents.push(FilingDocument::new(ordinal, name, html));
            }
            Err(e) => {
                warn!(accession = %filing.accession, document = %name, error = %e, "Skipping document");
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) if documents.is_empty() => Err(e),
        _ => Ok(documents),
    }
}
