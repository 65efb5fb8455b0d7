//! Identifier resolution.
//!
//! A token is either a CIK (all digits) or a ticker. Tickers are looked up in
//! the directory snapshot first and in the ticker reference file second; a
//! [`ResolutionError`] is raised only when both fail.

use async_trait::async_trait;
use filings_core::{
    CompanyIdentity, DataError, IdentifierLookup, ReferenceCache, ResolutionError, Result,
    normalize_cik,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::client::EdgarClient;
use crate::models::CompanyTickers;

/// Cache namespace for downloaded reference files.
pub const REFERENCE_NAMESPACE: &str = "reference";

/// Ticker lookup backed by the `company_tickers.json` directory snapshot.
///
/// The snapshot is downloaded once per instance.
#[derive(Debug)]
pub struct TickerDirectory {
    client: EdgarClient,
    snapshot: OnceCell<CompanyTickers>,
}

impl TickerDirectory {
    /// Create a directory lookup.
    #[must_use]
    pub fn new(client: EdgarClient) -> Self {
        Self {
            client,
            snapshot: OnceCell::new(),
        }
    }

    async fn snapshot(&self) -> Result<&CompanyTickers> {
        self.snapshot
            .get_or_try_init(|| async {
                debug!("Fetching company tickers from SEC");
                let url = self.client.endpoints().company_tickers();
                self.client.get_json::<CompanyTickers>(&url).await
            })
            .await
    }
}

#[async_trait]
impl IdentifierLookup for TickerDirectory {
    fn name(&self) -> &str {
        "company_tickers.json"
    }

    async fn lookup_cik(&self, ticker: &str) -> Result<String> {
        let ticker_upper = ticker.trim().to_uppercase();
        let snapshot = self.snapshot().await?;

        snapshot
            .values()
            .find(|company| company.ticker.to_uppercase() == ticker_upper)
            .map(|company| {
                debug!("Found CIK {} for ticker {}", company.cik_str, ticker_upper);
                company.cik_str.to_string()
            })
            .ok_or(DataError::NotFound(ticker_upper))
    }

    async fn lookup_ticker(&self, cik: &str) -> Result<Option<String>> {
        let cik = normalize_cik(cik);
        let snapshot = self.snapshot().await?;

        // Several rows can share a CIK; the lowest row index is the primary listing.
        let ticker = snapshot
            .iter()
            .filter(|(_, company)| company.cik_str.to_string() == cik)
            .min_by_key(|(idx, _)| idx.parse::<u64>().unwrap_or(u64::MAX))
            .map(|(_, company)| company.ticker.trim().to_uppercase())
            .filter(|t| !t.is_empty());
        Ok(ticker)
    }
}

/// Ticker lookup backed by the `ticker.txt` reference file.
///
/// The file is kept in a [`ReferenceCache`] for the configured TTL so repeated
/// runs do not download it again.
#[derive(Clone)]
pub struct TickerFile {
    client: EdgarClient,
    cache: Arc<dyn ReferenceCache>,
}

impl std::fmt::Debug for TickerFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerFile")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl TickerFile {
    /// Create a ticker-file lookup using the given cache.
    #[must_use]
    pub fn new(client: EdgarClient, cache: Arc<dyn ReferenceCache>) -> Self {
        Self { client, cache }
    }

    async fn payload(&self) -> Result<String> {
        let url = self.client.endpoints().ticker_file();
        let ttl = self.client.config().ticker_cache_ttl;

        match self.cache.get(REFERENCE_NAMESPACE, &url, ttl).await {
            Ok(Some(payload)) => return Ok(payload),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ticker file cache read failed"),
        }

        let payload = self.client.get_text(&url).await?;
        if let Err(e) = self.cache.put(REFERENCE_NAMESPACE, &url, &payload).await {
            warn!(error = %e, "Ticker file cache write failed");
        }
        Ok(payload)
    }
}

/// Parses `ticker\tcik` lines into a lowercase-ticker map.
#[must_use]
pub fn parse_ticker_file(payload: &str) -> HashMap<String, String> {
    payload
        .lines()
        .filter_map(|line| {
            let (ticker, cik) = line.split_once('\t')?;
            let cik = cik.trim();
            if ticker.trim().is_empty() || cik.is_empty() || !cik.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            Some((ticker.trim().to_lowercase(), normalize_cik(cik)))
        })
        .collect()
}

#[async_trait]
impl IdentifierLookup for TickerFile {
    fn name(&self) -> &str {
        "ticker.txt"
    }

    async fn lookup_cik(&self, ticker: &str) -> Result<String> {
        let payload = self.payload().await?;
        let ticker_lower = ticker.trim().to_lowercase();
        parse_ticker_file(&payload)
            .remove(&ticker_lower)
            .ok_or_else(|| DataError::NotFound(ticker.trim().to_uppercase()))
    }
}

/// Resolves user tokens to [`CompanyIdentity`] values.
#[derive(Debug, Clone)]
pub struct Resolver {
    directory: Arc<dyn IdentifierLookup>,
    secondary: Arc<dyn IdentifierLookup>,
}

impl Resolver {
    /// Create a resolver from a primary and a secondary lookup.
    #[must_use]
    pub fn new(directory: Arc<dyn IdentifierLookup>, secondary: Arc<dyn IdentifierLookup>) -> Self {
        Self {
            directory,
            secondary,
        }
    }

    /// Create the registry resolver: directory snapshot, then the cached ticker file.
    #[must_use]
    pub fn edgar(client: EdgarClient, cache: Arc<dyn ReferenceCache>) -> Self {
        Self::new(
            Arc::new(TickerDirectory::new(client.clone())),
            Arc::new(TickerFile::new(client, cache)),
        )
    }

    /// Resolves a token to a company identity.
    ///
    /// All-digit tokens are taken as the CIK without any lookup.
    pub async fn resolve(&self, token: &str) -> std::result::Result<CompanyIdentity, ResolutionError> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(ResolutionError {
                token: token.to_string(),
                directory: "empty identifier".to_string(),
                secondary: "empty identifier".to_string(),
            });
        }

        if is_numeric_id(trimmed) {
            debug!(token = %trimmed, "Numeric identifier taken as CIK");
            return Ok(CompanyIdentity::new(trimmed, trimmed));
        }

        let ticker = trimmed.to_uppercase();
        let directory_err = match self.directory.lookup_cik(&ticker).await {
            Ok(cik) => {
                info!(ticker = %ticker, cik = %cik, lookup = self.directory.name(), "Resolved ticker");
                return Ok(CompanyIdentity::new(trimmed, &cik).with_display_ticker(&ticker));
            }
            Err(e) => {
                warn!(
                    ticker = %ticker,
                    lookup = self.directory.name(),
                    error = %e,
                    "Directory lookup failed, trying secondary"
                );
                e
            }
        };

        match self.secondary.lookup_cik(&ticker).await {
            Ok(cik) => {
                info!(ticker = %ticker, cik = %cik, lookup = self.secondary.name(), "Resolved ticker");
                Ok(CompanyIdentity::new(trimmed, &cik).with_display_ticker(&ticker))
            }
            Err(e) => Err(ResolutionError {
                token: trimmed.to_string(),
                directory: directory_err.to_string(),
                secondary: e.to_string(),
            }),
        }
    }

    /// Looks up a display ticker for a CIK through the directory.
    ///
    /// Failures are logged and reported as `None`.
    pub async fn ticker_for(&self, cik: &str) -> Option<String> {
        match self.directory.lookup_ticker(cik).await {
            Ok(ticker) => ticker,
            Err(e) => {
                debug!(cik = %cik, error = %e, "Reverse ticker lookup failed");
                None
            }
        }
    }
}

/// Returns true for tokens that are a CIK: all ASCII digits, not all zeros.
#[must_use]
pub fn is_numeric_id(token: &str) -> bool {
    !token.is_empty()
        && token.chars().all(|c| c.is_ascii_digit())
        && !token.trim_start_matches('0').is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_cache::InMemoryCache;
    use filings_core::{EdgarConfig, Endpoints};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Default)]
    struct StaticLookup(HashMap<String, String>);

    impl StaticLookup {
        fn with(ticker: &str, cik: &str) -> Self {
            Self(HashMap::from([(ticker.to_string(), cik.to_string())]))
        }
    }

    #[async_trait]
    impl IdentifierLookup for StaticLookup {
        fn name(&self) -> &str {
            "static"
        }

        async fn lookup_cik(&self, ticker: &str) -> Result<String> {
            self.0
                .get(ticker)
                .cloned()
                .ok_or_else(|| DataError::NotFound(ticker.to_string()))
        }
    }

    #[derive(Debug)]
    struct PanickingLookup;

    #[async_trait]
    impl IdentifierLookup for PanickingLookup {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn lookup_cik(&self, ticker: &str) -> Result<String> {
            panic!("lookup must not be called for {ticker}");
        }
    }

    #[tokio::test]
    async fn test_numeric_identifier_skips_lookups() {
        let resolver = Resolver::new(Arc::new(PanickingLookup), Arc::new(PanickingLookup));

        let identity = resolver.resolve(" 0000320193 ").await.unwrap();
        assert_eq!(identity.canonical_id, "320193");
        assert_eq!(identity.display_ticker, None);
        assert_eq!(identity.raw_input, "0000320193");
    }

    #[tokio::test]
    async fn test_directory_hit_never_calls_secondary() {
        let resolver = Resolver::new(
            Arc::new(StaticLookup::with("AAPL", "320193")),
            Arc::new(PanickingLookup),
        );

        let identity = resolver.resolve("aapl").await.unwrap();
        assert_eq!(identity.canonical_id, "320193");
        assert_eq!(identity.display_ticker.as_deref(), Some("AAPL"));
    }

    #[tokio::test]
    async fn test_secondary_used_when_directory_fails() {
        let resolver = Resolver::new(
            Arc::new(StaticLookup::default()),
            Arc::new(StaticLookup::with("NVO", "353278")),
        );

        let identity = resolver.resolve("NVO").await.unwrap();
        assert_eq!(identity.canonical_id, "353278");
    }

    #[tokio::test]
    async fn test_both_failures_reported() {
        let resolver = Resolver::new(
            Arc::new(StaticLookup::default()),
            Arc::new(StaticLookup::default()),
        );

        let err = resolver.resolve("ZZZZ").await.unwrap_err();
        assert_eq!(err.token, "ZZZZ");
        assert!(err.directory.contains("ZZZZ"));
        assert!(err.secondary.contains("ZZZZ"));
        assert!(resolver.resolve("0000").await.is_err());
    }

    #[test]
    fn test_parse_ticker_file() {
        let map = parse_ticker_file("aapl\t320193\nnvo\t353278\nbad line\n\t123\n");
        assert_eq!(map.len(), 2);
        assert_eq!(map["nvo"], "353278");
    }

    fn client(server: &MockServer) -> EdgarClient {
        EdgarClient::new(
            EdgarConfig::new("Test Suite test@example.com")
                .with_endpoints(Endpoints::single(server.uri()))
                .with_min_request_interval(Duration::ZERO),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_ticker_directory_lookups() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
                    "1": {"cik_str": 1045810, "ticker": "NVDA", "title": "NVIDIA CORP"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let directory = TickerDirectory::new(client(&server));
        assert_eq!(directory.lookup_cik("nvda").await.unwrap(), "1045810");
        assert!(matches!(
            directory.lookup_cik("MSFT").await,
            Err(DataError::NotFound(_))
        ));
        assert_eq!(
            directory.lookup_ticker("0000320193").await.unwrap().as_deref(),
            Some("AAPL")
        );
    }

    #[tokio::test]
    async fn test_ticker_file_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/include/ticker.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("nvo\t353278\n"))
            .expect(1)
            .mount(&server)
            .await;

        let cache = Arc::new(InMemoryCache::new());
        let lookup = TickerFile::new(client(&server), cache.clone());

        assert_eq!(lookup.lookup_cik("NVO").await.unwrap(), "353278");
        assert_eq!(lookup.lookup_cik("NVO").await.unwrap(), "353278");
        assert_eq!(cache.len().await, 1);
    }
}
