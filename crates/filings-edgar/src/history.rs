//! Filing history and form discovery.
//!
//! The submissions feed tells which periodic forms a company actually files
//! (a foreign private issuer files 20-F, never 10-K), its primary ticker, and
//! the filings both the statement sources and the MD&A stage work from.

use filings_core::{CompanyIdentity, DataError, FilingFormSet, FilingRef, FormType, Result};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::client::EdgarClient;
use crate::models::CompanySubmissions;

/// Most recent filings kept in the history table.
pub const MAX_HISTORY_ROWS: usize = 500;

/// A company's filing history, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilingHistory {
    /// Company name.
    pub name: String,
    /// Tickers, primary first.
    pub tickers: Vec<String>,
    /// Filings, most recent first.
    pub filings: Vec<FilingRef>,
}

impl From<CompanySubmissions> for FilingHistory {
    fn from(submissions: CompanySubmissions) -> Self {
        let recent = submissions.filings.recent;
        let optional = |values: &[String], i: usize| {
            values
                .get(i)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let filings = recent
            .accession_number
            .iter()
            .enumerate()
            .filter(|(_, accession)| !accession.trim().is_empty())
            .map(|(i, accession)| FilingRef {
                accession: accession.trim().to_string(),
                form: recent.form.get(i).map(|f| f.trim().to_string()).unwrap_or_default(),
                filing_date: recent
                    .filing_date
                    .get(i)
                    .map(|d| d.trim().to_string())
                    .unwrap_or_default(),
                report_date: optional(recent.report_date.as_slice(), i),
                primary_document: optional(recent.primary_document.as_slice(), i),
            })
            .collect();

        Self {
            name: submissions.name,
            tickers: submissions.tickers,
            filings,
        }
    }
}

impl FilingHistory {
    /// Fetches the filing history of a company.
    pub async fn fetch(client: &EdgarClient, company: &CompanyIdentity) -> Result<Self> {
        let url = client.endpoints().submissions(&company.padded_cik());
        let submissions: CompanySubmissions = client.get_json(&url).await?;
        let history = Self::from(submissions);
        debug!(
            cik = %company.canonical_id,
            filings = history.filings.len(),
            "Fetched filing history"
        );
        Ok(history)
    }

    /// The primary ticker, upper-cased.
    #[must_use]
    pub fn primary_ticker(&self) -> Option<String> {
        self.tickers
            .first()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
    }

    /// Periodic forms present in the history (exact form codes only).
    #[must_use]
    pub fn periodic_forms(&self) -> FilingFormSet {
        self.filings.iter().filter_map(FilingRef::form_type).collect()
    }

    /// The most recent `max_per_form` filings of each requested form, most recent first.
    #[must_use]
    pub fn select_filings(&self, forms: &FilingFormSet, max_per_form: usize) -> Vec<FilingRef> {
        select_recent_filings(&self.filings, forms, max_per_form)
    }

    /// Converts the history into a metadata frame.
    ///
    /// Columns: ticker, cik, company, accession, form, filing_date,
    /// report_date, primary_document. At most [`MAX_HISTORY_ROWS`] rows.
    pub fn to_frame(&self, company: &CompanyIdentity) -> Result<DataFrame> {
        let filings = &self.filings[..self.filings.len().min(MAX_HISTORY_ROWS)];
        let n = filings.len();
        let company_name = if self.name.is_empty() {
            company.label().to_string()
        } else {
            self.name.clone()
        };

        DataFrame::new(vec![
            Column::new("ticker".into(), vec![company.label(); n]),
            Column::new("cik".into(), vec![company.padded_cik(); n]),
            Column::new("company".into(), vec![company_name; n]),
            Column::new(
                "accession".into(),
                filings.iter().map(|f| f.accession.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "form".into(),
                filings.iter().map(|f| f.form.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "filing_date".into(),
                filings.iter().map(|f| f.filing_date.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "report_date".into(),
                filings.iter().map(|f| f.report_date.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "primary_document".into(),
                filings
                    .iter()
                    .map(|f| f.primary_document.clone())
                    .collect::<Vec<_>>(),
            ),
        ])
        .map_err(|e| DataError::Output(e.to_string()))
    }
}

/// Keeps the first `max_per_form` filings of each requested form.
///
/// `filings` is expected most recent first, as the submissions feed lists
/// them. Amendments never match a form exactly and are skipped.
#[must_use]
pub fn select_recent_filings(
    filings: &[FilingRef],
    forms: &FilingFormSet,
    max_per_form: usize,
) -> Vec<FilingRef> {
    let mut seen: HashMap<FormType, usize> = HashMap::new();
    filings
        .iter()
        .filter(|filing| {
            let Some(form) = filing.form_type() else {
                return false;
            };
            if !forms.contains(form) {
                return false;
            }
            let count = seen.entry(form).or_insert(0);
            if *count >= max_per_form {
                return false;
            }
            *count += 1;
            true
        })
        .cloned()
        .collect()
}

/// Outcome of form discovery for one company.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Filing history, when the feed could be read.
    pub history: Option<FilingHistory>,
    /// Periodic forms found in the history; empty when the feed failed.
    pub discovered: FilingFormSet,
    /// Why the feed could not be read, if it could not.
    pub error: Option<String>,
}

impl Discovery {
    /// Forms to request given the caller's hint.
    #[must_use]
    pub fn forms(&self, hint: &FilingFormSet) -> FilingFormSet {
        FilingFormSet::select(&self.discovered, hint)
    }

    /// Filings of the history, or none when the feed failed.
    #[must_use]
    pub fn filings(&self) -> &[FilingRef] {
        self.history
            .as_ref()
            .map_or(&[][..], |h| h.filings.as_slice())
    }
}

/// Discovers which periodic forms a company files.
///
/// A feed failure is not an error: it yields an empty discovered set and the
/// caller's hint (or the default forms) take over.
pub async fn discover_forms(client: &EdgarClient, company: &CompanyIdentity) -> Discovery {
    match FilingHistory::fetch(client, company).await {
        Ok(history) => {
            let discovered = history.periodic_forms();
            info!(cik = %company.canonical_id, forms = %discovered, "Discovered periodic forms");
            Discovery {
                history: Some(history),
                discovered,
                error: None,
            }
        }
        Err(e) => Discovery {
            history: None,
            discovered: FilingFormSet::empty(),
            error: Some(e.to_string()),
        },
    }
}
