//! Registry access configuration.
//!
//! [`EdgarConfig`] is an explicit value threaded into every registry client.
//! Tests point [`Endpoints`] at a mock server and inject their own identity.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DataError, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default minimum spacing between two requests.
pub const DEFAULT_MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

/// Default number of filings per form used by the filing-level source and MD&A.
pub const DEFAULT_MAX_FILINGS_PER_FORM: usize = 5;

/// Default freshness window of the cached ticker reference file.
pub const DEFAULT_TICKER_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Base URLs of the registry hosts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Host serving submissions and company facts (`https://data.sec.gov`).
    pub data_base: String,
    /// Host serving archives and reference files (`https://www.sec.gov`).
    pub www_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            data_base: "https://data.sec.gov".to_string(),
            www_base: "https://www.sec.gov".to_string(),
        }
    }
}

impl Endpoints {
    /// Serves every endpoint from one base URL (used with mock servers).
    #[must_use]
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            data_base: base.clone(),
            www_base: base,
        }
    }

    /// Filing history feed for a 10-digit CIK.
    #[must_use]
    pub fn submissions(&self, padded_cik: &str) -> String {
        format!("{}/submissions/CIK{padded_cik}.json", self.data_base)
    }

    /// Company facts feed for a 10-digit CIK.
    #[must_use]
    pub fn company_facts(&self, padded_cik: &str) -> String {
        format!("{}/api/xbrl/companyfacts/CIK{padded_cik}.json", self.data_base)
    }

    /// Ticker directory snapshot.
    #[must_use]
    pub fn company_tickers(&self) -> String {
        format!("{}/files/company_tickers.json", self.www_base)
    }

    /// Ticker reference file (`ticker\tcik` lines).
    #[must_use]
    pub fn ticker_file(&self) -> String {
        format!("{}/include/ticker.txt", self.www_base)
    }

    /// Archive folder of one filing.
    #[must_use]
    pub fn archive_folder(&self, cik: &str, accession_no_dashes: &str) -> String {
        format!(
            "{}/Archives/edgar/data/{cik}/{accession_no_dashes}",
            self.www_base
        )
    }

    /// JSON listing of an archive folder.
    #[must_use]
    pub fn archive_listing(&self, cik: &str, accession_no_dashes: &str) -> String {
        format!("{}/index.json", self.archive_folder(cik, accession_no_dashes))
    }

    /// A file inside an archive folder.
    #[must_use]
    pub fn archive_file(&self, cik: &str, accession_no_dashes: &str, name: &str) -> String {
        format!("{}/{name}", self.archive_folder(cik, accession_no_dashes))
    }
}

/// Configuration for registry access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgarConfig {
    /// Contact identity sent as the `User-Agent` header (e.g. "Name you@example.com").
    pub identity: String,
    /// Registry base URLs.
    pub endpoints: Endpoints,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Minimum spacing between two requests.
    pub min_request_interval: Duration,
    /// Most recent filings of each form to read.
    pub max_filings_per_form: usize,
    /// Freshness window of the cached ticker reference file.
    pub ticker_cache_ttl: Duration,
}

impl EdgarConfig {
    /// Creates a configuration with default endpoints and limits.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into().trim().to_string(),
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
            min_request_interval: DEFAULT_MIN_REQUEST_INTERVAL,
            max_filings_per_form: DEFAULT_MAX_FILINGS_PER_FORM,
            ticker_cache_ttl: DEFAULT_TICKER_CACHE_TTL,
        }
    }

    /// Sets the endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the minimum spacing between requests.
    #[must_use]
    pub const fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    /// Sets the per-form filing cap.
    #[must_use]
    pub const fn with_max_filings_per_form(mut self, max: usize) -> Self {
        self.max_filings_per_form = max;
        self
    }

    /// Sets the ticker reference file TTL.
    #[must_use]
    pub const fn with_ticker_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ticker_cache_ttl = ttl;
        self
    }

    /// Checks that the configuration can be used against the registry.
    ///
    /// The registry rejects anonymous clients, so an empty identity is an error.
    pub fn validate(&self) -> Result<()> {
        if self.identity.is_empty() {
            return Err(DataError::InvalidParameter(
                "a contact identity (EDGAR_IDENTITY or EDGAR_EMAIL) is required".to_string(),
            ));
        }
        if self.max_filings_per_form == 0 {
            return Err(DataError::InvalidParameter(
                "max_filings_per_form must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
