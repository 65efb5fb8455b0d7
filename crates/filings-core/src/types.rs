//! Core data types for filing ingestion.
//!
//! This module defines the structures shared by every stage:
//!
//! - [`CompanyIdentity`] - Resolved company identifier
//! - [`Period`] - Reporting period (instant or duration)
//! - [`StatementKind`] - Which financial statement a table represents
//! - [`StatementRow`] / [`StatementTable`] - Long-form statement data
//! - [`FilingRef`] - One entry of a company's filing history
//! - [`FilingDocument`] - Raw HTML of one document of a filing
//! - [`MdnaSection`] - Extracted MD&A text

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{DataError, Result};
use crate::form::FormType;

/// A company resolved to its registry key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyIdentity {
    /// Identifier exactly as supplied by the user.
    pub raw_input: String,
    /// CIK without leading zeros.
    pub canonical_id: String,
    /// Ticker used for output naming, when known.
    pub display_ticker: Option<String>,
}

impl CompanyIdentity {
    /// Creates an identity, stripping leading zeros from the CIK.
    #[must_use]
    pub fn new(raw_input: impl Into<String>, cik: &str) -> Self {
        Self {
            raw_input: raw_input.into(),
            canonical_id: normalize_cik(cik),
            display_ticker: None,
        }
    }

    /// Sets the display ticker (uppercased).
    #[must_use]
    pub fn with_display_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.display_ticker = Some(ticker.into().trim().to_uppercase());
        self
    }

    /// Backfills the display ticker if none is set yet.
    pub fn backfill_ticker(&mut self, ticker: Option<&str>) {
        if self.display_ticker.is_none() {
            if let Some(t) = ticker.map(str::trim).filter(|t| !t.is_empty()) {
                self.display_ticker = Some(t.to_uppercase());
            }
        }
    }

    /// CIK zero-padded to the 10 digits used by `data.sec.gov`.
    #[must_use]
    pub fn padded_cik(&self) -> String {
        format!("{:0>10}", self.canonical_id)
    }

    /// Directory / file label: the display ticker when known, else the CIK.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_ticker
            .as_deref()
            .unwrap_or(&self.canonical_id)
    }
}

/// Strips leading zeros from a CIK, keeping a single `0` for an all-zero input.
#[must_use]
pub fn normalize_cik(cik: &str) -> String {
    let trimmed = cik.trim().trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// A reporting period.
///
/// Instants (balance sheet items) have no start date. Periods order by end
/// date first, so a series sorts chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// First day of a duration; `None` for instants.
    pub start: Option<NaiveDate>,
    /// Last day of the period (or the instant).
    pub end: NaiveDate,
}

impl Period {
    /// Creates an instant period.
    #[must_use]
    pub const fn instant(end: NaiveDate) -> Self {
        Self { start: None, end }
    }

    /// Creates a duration period.
    #[must_use]
    pub const fn duration(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end,
        }
    }

    /// Parses the registry's `start`/`end` strings (`YYYY-MM-DD`).
    pub fn parse(start: Option<&str>, end: &str) -> Result<Self> {
        let end = parse_date(end)?;
        let start = start.map(parse_date).transpose()?;
        Ok(Self { start, end })
    }

    /// Returns true for instant periods.
    #[must_use]
    pub const fn is_instant(&self) -> bool {
        self.start.is_none()
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.end
            .cmp(&other.end)
            .then_with(|| self.start.cmp(&other.start))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(start) => write!(f, "{start}..{}", self.end),
            None => write!(f, "{}", self.end),
        }
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once("..") {
            Some((start, end)) => Self::parse(Some(start), end),
            None => Self::parse(None, s),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("invalid date '{s}': {e}")))
}

/// Which financial statement a table represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// Income statement.
    IncomeStatement,
    /// Balance sheet.
    BalanceSheet,
    /// Cash flow statement.
    CashFlow,
    /// Concepts no classification rule matched.
    Unclassified,
}

impl StatementKind {
    /// All statement kinds.
    pub const ALL: [Self; 4] = [
        Self::IncomeStatement,
        Self::BalanceSheet,
        Self::CashFlow,
        Self::Unclassified,
    ];

    /// Returns the snake-case name used in artifact file names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IncomeStatement => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cash_flow",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One long-form statement value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    /// Concept name, verbatim from the source.
    pub concept: String,
    /// Reporting period.
    pub period: Period,
    /// Reported value.
    pub value: f64,
    /// Unit of measure (e.g. "USD", "shares").
    pub unit: String,
    /// Form the value was reported on.
    pub form: Option<String>,
    /// Accession number of the reporting filing.
    pub accession: Option<String>,
    /// Fiscal year.
    pub fiscal_year: Option<i32>,
    /// Fiscal period (e.g. "FY", "Q2").
    pub fiscal_period: Option<String>,
    /// Date the reporting filing was filed.
    pub filed: Option<NaiveDate>,
}

impl StatementRow {
    /// Creates a row with the required fields.
    #[must_use]
    pub fn new(concept: impl Into<String>, period: Period, value: f64, unit: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            period,
            value,
            unit: unit.into(),
            form: None,
            accession: None,
            fiscal_year: None,
            fiscal_period: None,
            filed: None,
        }
    }

    /// Sets the reporting filing's form and accession number.
    #[must_use]
    pub fn with_filing(mut self, form: impl Into<String>, accession: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self.accession = Some(accession.into());
        self
    }

    /// Sets the filing date.
    #[must_use]
    pub const fn with_filed(mut self, filed: NaiveDate) -> Self {
        self.filed = Some(filed);
        self
    }
}

/// A long-form statement table.
///
/// Both statement sources produce this shape; the analysis stage pivots it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    /// Statement represented by the table.
    pub kind: StatementKind,
    /// Long-form rows.
    pub rows: Vec<StatementRow>,
}

/// Statement tables keyed by kind.
pub type Statements = BTreeMap<StatementKind, StatementTable>;

impl StatementTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    /// Creates a table from rows.
    #[must_use]
    pub const fn from_rows(kind: StatementKind, rows: Vec<StatementRow>) -> Self {
        Self { kind, rows }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Collapses values reported more than once.
    ///
    /// Rows sharing (concept, unit, period) keep the most recently filed value;
    /// exact repeats disappear silently. Returns how many distinct values were
    /// superseded by a later filing.
    pub fn normalize(&mut self) -> usize {
        let mut latest: BTreeMap<(String, String, Period), StatementRow> = BTreeMap::new();
        let mut superseded = 0usize;

        for row in self.rows.drain(..) {
            let key = (row.concept.clone(), row.unit.clone(), row.period);
            match latest.get_mut(&key) {
                Some(existing) => {
                    let differs = existing.value != row.value;
                    if row.filed >= existing.filed {
                        if differs {
                            superseded += 1;
                        }
                        *existing = row;
                    } else if differs {
                        superseded += 1;
                    }
                }
                None => {
                    latest.insert(key, row);
                }
            }
        }

        self.rows = latest.into_values().collect();
        superseded
    }

    /// Converts the table into a polars frame.
    ///
    /// Columns: concept, period_start, period_end, value, unit, form,
    /// accession, fiscal_year, fiscal_period, filed.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        DataFrame::new(vec![
            Column::new(
                "concept".into(),
                rows.iter().map(|r| r.concept.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "period_start".into(),
                rows.iter()
                    .map(|r| r.period.start.map(|d| d.to_string()))
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                "period_end".into(),
                rows.iter()
                    .map(|r| r.period.end.to_string())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                "value".into(),
                rows.iter().map(|r| r.value).collect::<Vec<_>>(),
            ),
            Column::new(
                "unit".into(),
                rows.iter().map(|r| r.unit.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "form".into(),
                rows.iter().map(|r| r.form.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "accession".into(),
                rows.iter().map(|r| r.accession.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "fiscal_year".into(),
                rows.iter().map(|r| r.fiscal_year).collect::<Vec<_>>(),
            ),
            Column::new(
                "fiscal_period".into(),
                rows.iter()
                    .map(|r| r.fiscal_period.clone())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                "filed".into(),
                rows.iter()
                    .map(|r| r.filed.map(|d| d.to_string()))
                    .collect::<Vec<_>>(),
            ),
        ])
        .map_err(|e| DataError::Output(e.to_string()))
    }

    /// Rebuilds a table from a frame written by [`to_frame`](Self::to_frame).
    ///
    /// Only concept, period_start, period_end, value and unit are required.
    pub fn from_frame(kind: StatementKind, df: &DataFrame) -> Result<Self> {
        let parse_err = |e: PolarsError| DataError::Parse(e.to_string());

        let concepts = df.column("concept").map_err(parse_err)?.str().map_err(parse_err)?;
        let starts = df
            .column("period_start")
            .map_err(parse_err)?
            .str()
            .map_err(parse_err)?;
        let ends = df
            .column("period_end")
            .map_err(parse_err)?
            .str()
            .map_err(parse_err)?;
        let values = df.column("value").map_err(parse_err)?.f64().map_err(parse_err)?;
        let units = df.column("unit").map_err(parse_err)?.str().map_err(parse_err)?;

        let optional_str = |name: &str| df.column(name).ok().and_then(|c| c.str().ok().cloned());
        let forms = optional_str("form");
        let accessions = optional_str("accession");
        let fiscal_periods = optional_str("fiscal_period");
        let filed = optional_str("filed");
        let fiscal_years = df
            .column("fiscal_year")
            .ok()
            .and_then(|c| c.i32().ok().cloned());

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let concept = concepts
                .get(i)
                .ok_or_else(|| DataError::Parse(format!("row {i}: missing concept")))?;
            let end = ends
                .get(i)
                .ok_or_else(|| DataError::Parse(format!("row {i}: missing period_end")))?;
            let Some(value) = values.get(i) else {
                continue;
            };
            let period = Period::parse(starts.get(i), end)?;
            let mut row = StatementRow::new(concept, period, value, units.get(i).unwrap_or(""));
            row.form = forms.as_ref().and_then(|c| c.get(i)).map(str::to_string);
            row.accession = accessions.as_ref().and_then(|c| c.get(i)).map(str::to_string);
            row.fiscal_period = fiscal_periods
                .as_ref()
                .and_then(|c| c.get(i))
                .map(str::to_string);
            row.fiscal_year = fiscal_years.as_ref().and_then(|c| c.get(i));
            row.filed = filed
                .as_ref()
                .and_then(|c| c.get(i))
                .map(parse_date)
                .transpose()?;
            rows.push(row);
        }

        Ok(Self { kind, rows })
    }
}

/// One filing from a company's filing history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRef {
    /// Accession number with dashes (e.g. `0000320193-24-000123`).
    pub accession: String,
    /// Form code as reported.
    pub form: String,
    /// Filing date (`YYYY-MM-DD`).
    pub filing_date: String,
    /// Period of report, when reported.
    pub report_date: Option<String>,
    /// Primary document file name, when reported.
    pub primary_document: Option<String>,
}

impl FilingRef {
    /// Accession number without dashes, as used in archive folder paths.
    #[must_use]
    pub fn accession_no_dashes(&self) -> String {
        self.accession.replace('-', "")
    }

    /// The recognised form type, if any.
    #[must_use]
    pub fn form_type(&self) -> Option<FormType> {
        FormType::from_code(&self.form)
    }

    /// Filing date without dashes, for artifact names.
    #[must_use]
    pub fn compact_filing_date(&self) -> String {
        let compact: String = self.filing_date.chars().filter(char::is_ascii_digit).collect();
        if compact.is_empty() {
            "unknown".to_string()
        } else {
            compact
        }
    }

    /// Parsed filing date.
    #[must_use]
    pub fn filed(&self) -> Option<NaiveDate> {
        parse_date(&self.filing_date).ok()
    }
}

/// Raw HTML of one document in a (possibly multi-document) filing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilingDocument {
    /// Position of the document within the filing.
    pub ordinal: usize,
    /// Document file name.
    pub name: String,
    /// Raw HTML.
    pub html: String,
}

impl FilingDocument {
    /// Creates a document.
    #[must_use]
    pub fn new(ordinal: usize, name: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            ordinal,
            name: name.into(),
            html: html.into(),
        }
    }
}

/// An extracted MD&A section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MdnaSection {
    /// Plain text of the section.
    pub text: String,
    /// Start offset (bytes) in the flattened filing text.
    pub start: usize,
    /// End offset (bytes, exclusive) in the flattened filing text.
    pub end: usize,
    /// Heading pattern whose match opened the section.
    pub heading: String,
    /// Form the filing was searched as.
    pub form: FormType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_identity_normalizes_cik() {
        let identity = CompanyIdentity::new("0000320193", "0000320193");
        assert_eq!(identity.canonical_id, "320193");
        assert_eq!(identity.padded_cik(), "0000320193");
        assert_eq!(identity.label(), "320193");

        let mut identity = identity;
        identity.backfill_ticker(Some("aapl"));
        identity.backfill_ticker(Some("OTHER"));
        assert_eq!(identity.label(), "AAPL");
    }

    #[test]
    fn test_period_display_roundtrip() {
        let instant = Period::instant(date(2024, 9, 28));
        let duration = Period::duration(date(2023, 10, 1), date(2024, 9, 28));

        assert_eq!(instant.to_string(), "2024-09-28");
        assert_eq!(duration.to_string(), "2023-10-01..2024-09-28");
        assert_eq!("2023-10-01..2024-09-28".parse::<Period>().unwrap(), duration);
        assert!(instant < duration);
        assert!(Period::instant(date(2023, 9, 30)) < instant);
    }

    #[test]
    fn test_normalize_keeps_latest_filed() {
        let period = Period::instant(date(2023, 12, 31));
        let mut table = StatementTable::from_rows(
            StatementKind::BalanceSheet,
            vec![
                StatementRow::new("Assets", period, 100.0, "USD").with_filed(date(2024, 2, 1)),
                StatementRow::new("Assets", period, 100.0, "USD").with_filed(date(2025, 2, 1)),
                StatementRow::new("Cash", period, 10.0, "USD").with_filed(date(2024, 2, 1)),
                StatementRow::new("Cash", period, 12.0, "USD").with_filed(date(2025, 2, 1)),
            ],
        );

        let superseded = table.normalize();

        assert_eq!(superseded, 1);
        assert_eq!(table.len(), 2);
        let cash = table.rows.iter().find(|r| r.concept == "Cash").unwrap();
        assert_eq!(cash.value, 12.0);
    }

    #[test]
    fn test_frame_roundtrip() {
        let table = StatementTable::from_rows(
            StatementKind::IncomeStatement,
            vec![
                StatementRow::new(
                    "Revenues",
                    Period::duration(date(2023, 1, 1), date(2023, 12, 31)),
                    1_000.0,
                    "USD",
                )
                .with_filing("10-K", "0000000001-24-000001")
                .with_filed(date(2024, 2, 1)),
            ],
        );

        let df = table.to_frame().unwrap();
        assert_eq!(df.height(), 1);

        let back = StatementTable::from_frame(StatementKind::IncomeStatement, &df).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_filing_ref_helpers() {
        let filing = FilingRef {
            accession: "0000320193-24-000123".to_string(),
            form: "10-K".to_string(),
            filing_date: "2024-11-01".to_string(),
            report_date: Some("2024-09-28".to_string()),
            primary_document: Some("aapl-20240928.htm".to_string()),
        };

        assert_eq!(filing.accession_no_dashes(), "000032019324000123");
        assert_eq!(filing.form_type(), Some(FormType::AnnualDomestic));
        assert_eq!(filing.compact_filing_date(), "20241101");
        assert_eq!(filing.filed(), Some(date(2024, 11, 1)));
    }
}
