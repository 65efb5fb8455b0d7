//! Response types of the EDGAR JSON endpoints.

use serde::Deserialize;
use std::collections::HashMap;

/// Company ticker information from SEC JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    pub cik_str: u64,
    /// Ticker symbol
    pub ticker: String,
    /// Company name
    #[serde(default)]
    pub title: String,
}

/// The ticker directory snapshot, keyed by an arbitrary row index.
pub type CompanyTickers = HashMap<String, CompanyTickerInfo>;

/// Company submissions (filing history) feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySubmissions {
    /// Company name
    #[serde(default)]
    pub name: String,
    /// Tickers the company trades under, primary first
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Filing lists
    #[serde(default)]
    pub filings: SubmissionFilings,
}

/// Filing lists of the submissions feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionFilings {
    /// Most recent filings, column-oriented
    #[serde(default)]
    pub recent: RecentFilings,
}

/// Column-oriented recent filings; index `i` of every vector is one filing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    /// Accession numbers (with dashes)
    #[serde(default)]
    pub accession_number: Vec<String>,
    /// Form codes
    #[serde(default)]
    pub form: Vec<String>,
    /// Filing dates
    #[serde(default)]
    pub filing_date: Vec<String>,
    /// Period of report dates
    #[serde(default)]
    pub report_date: Vec<String>,
    /// Primary document file names
    #[serde(default)]
    pub primary_document: Vec<String>,
}

/// Response from the SEC EDGAR Company Facts API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFactsResponse {
    /// Entity name
    #[serde(default)]
    pub entity_name: String,
    /// Facts organized by taxonomy and tag
    #[serde(default)]
    pub facts: HashMap<String, HashMap<String, TagFacts>>,
}

/// Facts for a specific XBRL tag.
#[derive(Debug, Clone, Deserialize)]
pub struct TagFacts {
    /// Label
    #[serde(default)]
    pub label: Option<String>,
    /// Units (USD, shares, etc.) containing the actual fact values
    #[serde(default)]
    pub units: HashMap<String, Vec<FactValue>>,
}

/// A single fact value with metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct FactValue {
    /// Start date of a duration period
    #[serde(default)]
    pub start: Option<String>,
    /// End date of the period
    pub end: String,
    /// Value
    pub val: f64,
    /// Accession number
    #[serde(default)]
    pub accn: Option<String>,
    /// Fiscal year
    #[serde(default)]
    pub fy: Option<i32>,
    /// Fiscal period
    #[serde(default)]
    pub fp: Option<String>,
    /// Form type
    #[serde(default)]
    pub form: Option<String>,
    /// Filed date
    #[serde(default)]
    pub filed: Option<String>,
}

/// JSON listing of an archive folder (`index.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveListing {
    /// The listed folder
    #[serde(default)]
    pub directory: ArchiveDirectory,
}

/// Folder entry of an archive listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveDirectory {
    /// Files in the folder
    #[serde(default)]
    pub item: Vec<ArchiveItem>,
}

/// One file of an archive folder.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveItem {
    /// File name
    pub name: String,
}

impl ArchiveListing {
    /// Iterates the file names in the folder.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directory.item.iter().map(|item| item.name.as_str())
    }
}
