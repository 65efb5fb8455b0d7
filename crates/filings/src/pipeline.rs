//! Per-company ingestion pipeline.
//!
//! Companies are processed one after another. Inside a company the stages
//! run in order: resolve, discover, fetch (primary then fallback source),
//! analysis, MD&A. A failure is recorded against its stage and only skips
//! what depends on it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use filings_analysis::analyze;
use filings_cache::{InMemoryCache, SqliteCache};
use filings_core::{
    CompanyIdentity, FetchRequest, FilingRef, ReferenceCache, Result, Stage, StageFailure,
    Statements,
};
use filings_edgar::{
    CompanyFactsSource, Discovery, EdgarClient, FilingXbrlSource, Resolver, discover_forms,
    fetch_filing_documents, is_numeric_id, select_recent_filings,
};
use filings_mdna::MdnaExtractor;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::registry::SourceRegistry;
use crate::writer::{OutputWriter, read_statements};

/// Outcome of an ingestion or analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    /// Every artifact written.
    pub outputs: Vec<PathBuf>,
    /// Every isolated failure.
    pub failures: Vec<StageFailure>,
    /// Companies that resolved and were processed.
    pub companies_processed: usize,
    /// Filings selected for MD&A extraction.
    pub filings_count: usize,
}

impl IngestionReport {
    /// True when no stage failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, identifier: &str, stage: Stage, error: impl std::fmt::Display) {
        warn!(identifier = %identifier, stage = %stage, error = %error, "Stage failed");
        self.failures.push(StageFailure::new(identifier, stage, error));
    }
}

/// Runs the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: IngestConfig,
    client: EdgarClient,
    resolver: Resolver,
    sources: SourceRegistry,
    extractor: MdnaExtractor,
    writer: OutputWriter,
}

impl Ingestor {
    /// Builds the pipeline from a configuration.
    ///
    /// The reference cache is a SQLite file under the cache root when one is
    /// configured, else process-local.
    pub fn new(config: IngestConfig) -> Result<Self> {
        let client = EdgarClient::new(config.edgar.clone())?;
        let cache: Arc<dyn ReferenceCache> = match config.cache_path() {
            Some(path) => Arc::new(SqliteCache::new(&path)?),
            None => Arc::new(InMemoryCache::new()),
        };
        let resolver = Resolver::edgar(client.clone(), cache);
        let sources = SourceRegistry::new()
            .with_source(Arc::new(FilingXbrlSource::new(client.clone())))
            .with_source(Arc::new(CompanyFactsSource::new(client.clone())));

        Ok(Self::from_parts(config, client, resolver, sources))
    }

    /// Builds the pipeline from prepared parts.
    #[must_use]
    pub fn from_parts(
        config: IngestConfig,
        client: EdgarClient,
        resolver: Resolver,
        sources: SourceRegistry,
    ) -> Self {
        let extractor = MdnaExtractor::new()
            .with_options(config.extract)
            .with_scorer(config.scorer.build());
        let writer = OutputWriter::new(&config.output_root);
        Self {
            config,
            client,
            resolver,
            sources,
            extractor,
            writer,
        }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingests every identifier, in order.
    pub async fn ingest<S: AsRef<str>>(&self, identifiers: &[S]) -> IngestionReport {
        let mut report = IngestionReport::default();
        for identifier in identifiers {
            self.ingest_company(identifier.as_ref().trim(), &mut report).await;
        }
        info!(
            companies = report.companies_processed,
            outputs = report.outputs.len(),
            failures = report.failures.len(),
            "Ingestion finished"
        );
        report
    }

    async fn ingest_company(&self, identifier: &str, report: &mut IngestionReport) {
        let mut company = match self.resolver.resolve(identifier).await {
            Ok(company) => company,
            Err(e) => {
                report.fail(identifier, Stage::Resolve, e);
                return;
            }
        };

        let discovery = discover_forms(&self.client, &company).await;
        if let Some(error) = &discovery.error {
            report.fail(identifier, Stage::Discover, error);
        }
        self.fill_display_ticker(&mut company, &discovery).await;
        report.companies_processed += 1;

        let forms = discovery.forms(&self.config.forms);
        info!(
            identifier = %identifier,
            cik = %company.canonical_id,
            label = %company.label(),
            forms = %forms,
            "Processing company"
        );

        if let Some(history) = &discovery.history {
            let written = history
                .to_frame(&company)
                .and_then(|mut frame| self.writer.write_history(&company, &mut frame));
            match written {
                Ok(path) => report.outputs.push(path),
                Err(e) => report.fail(identifier, Stage::Output, e),
            }
        }

        let request = FetchRequest {
            company: &company,
            forms: &forms,
            filings: discovery.filings(),
        };
        match self.sources.fetch(request).await {
            Ok(sourced) => {
                match self
                    .writer
                    .write_statements(&company, &sourced.source, &sourced.statements)
                {
                    Ok(paths) => report.outputs.extend(paths),
                    Err(e) => report.fail(identifier, Stage::Output, e),
                }
                match self.writer.company_dir(&company) {
                    Ok(dir) => write_analysis(&self.writer, &dir, identifier, &sourced.statements, report),
                    Err(e) => report.fail(identifier, Stage::Output, e),
                }
            }
            Err(e) => report.fail(identifier, Stage::Fetch, e),
        }

        if self.config.mdna {
            let filings = select_recent_filings(
                discovery.filings(),
                &forms,
                self.config.edgar.max_filings_per_form,
            );
            report.filings_count += filings.len();
            for filing in &filings {
                self.extract_mdna(&company, filing, report).await;
            }
        }
    }

    /// Display ticker: the history's primary ticker, else the directory's
    /// reverse lookup for numeric inputs.
    async fn fill_display_ticker(&self, company: &mut CompanyIdentity, discovery: &Discovery) {
        let from_history = discovery
            .history
            .as_ref()
            .and_then(|history| history.primary_ticker());
        company.backfill_ticker(from_history.as_deref());

        if company.display_ticker.is_none() && is_numeric_id(&company.raw_input) {
            let reverse = self.resolver.ticker_for(&company.canonical_id).await;
            company.backfill_ticker(reverse.as_deref());
        }
    }

    async fn extract_mdna(
        &self,
        company: &CompanyIdentity,
        filing: &FilingRef,
        report: &mut IngestionReport,
    ) {
        let identifier = format!("{} {}", company.label(), filing.accession);
        let Some(form) = filing.form_type() else {
            return;
        };

        let documents = match fetch_filing_documents(&self.client, company, filing).await {
            Ok(documents) => documents,
            Err(e) => {
                report.fail(&identifier, Stage::Mdna, e);
                return;
            }
        };

        match self.extractor.extract(&documents, form) {
            Ok(section) => match self.writer.write_mdna(company, filing, &section.text) {
                Ok(path) => report.outputs.push(path),
                Err(e) => report.fail(&identifier, Stage::Output, e),
            },
            Err(e) => report.fail(&identifier, Stage::Mdna, e),
        }
    }
}

fn write_analysis(
    writer: &OutputWriter,
    dir: &Path,
    identifier: &str,
    statements: &Statements,
    report: &mut IngestionReport,
) {
    for (kind, result) in analyze(statements) {
        let analysis = match result {
            Ok(analysis) => analysis,
            Err(e) => {
                report.fail(&format!("{identifier} {kind}"), Stage::Analysis, e);
                continue;
            }
        };
        for table in analysis.tables() {
            match writer.write_analysis(dir, table) {
                Ok(path) => report.outputs.push(path),
                Err(e) => report.fail(identifier, Stage::Output, e),
            }
        }
    }
}

/// Re-runs the analysis over every company directory under `root`.
///
/// Reads the statement tables previously written there and rewrites the
/// analysis CSVs next to them, without touching the registry.
pub fn analyze_output_root(root: &Path) -> Result<IngestionReport> {
    let writer = OutputWriter::new(root);
    let mut report = IngestionReport::default();

    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        let label = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match read_statements(&dir) {
            Ok(statements) if statements.is_empty() => continue,
            Ok(statements) => {
                report.companies_processed += 1;
                write_analysis(&writer, &dir, &label, &statements, &mut report);
            }
            Err(e) => report.fail(&label, Stage::Analysis, e),
        }
    }

    info!(
        root = %root.display(),
        companies = report.companies_processed,
        outputs = report.outputs.len(),
        "Analysis finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_core::{EdgarConfig, Endpoints, FilingFormSet, FormType, StatementKind};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NVO_FOLDER: &str = "/Archives/edgar/data/353278/000035327824000010";

    fn mdna_html() -> String {
        format!(
            "<html><body><p>Item 5. Operating and Financial Review and Prospects</p>{}<p>Item 6. Directors, Senior Management and Employees</p></body></html>",
            "<p>Sales grew 31% in Danish kroner, driven by Diabetes and Obesity care.</p>".repeat(15)
        )
    }

    fn fact(start: Option<&str>, end: &str, val: f64, fy: i32) -> serde_json::Value {
        json!({
            "start": start, "end": end, "val": val, "accn": "0000353278-24-000010",
            "fy": fy, "fp": "FY", "form": "20-F", "filed": "2024-02-05"
        })
    }

    async fn mount_directory(server: &MockServer, lists_nvo: bool) {
        let directory = if lists_nvo {
            json!({"0": {"cik_str": 353278, "ticker": "NVO", "title": "NOVO NORDISK A S"}})
        } else {
            json!({"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}})
        };
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(directory))
            .mount(server)
            .await;
    }

    async fn mount_nvo(server: &MockServer) {
        mount_directory(server, true).await;
        mount_filings(server).await;
    }

    async fn mount_filings(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/include/ticker.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("nvo\t353278\naapl\t320193\n"))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000353278.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "NOVO NORDISK A S",
                "tickers": ["NVO"],
                "filings": {"recent": {
                    "accessionNumber": ["0000353278-24-000020", "0000353278-24-000010"],
                    "form": ["6-K", "20-F"],
                    "filingDate": ["2024-05-02", "2024-02-05"],
                    "reportDate": ["", "2023-12-31"],
                    "primaryDocument": ["form6k.htm", "novo-20231231.htm"]
                }}
            })))
            .mount(server)
            .await;
        // The 20-F folder carries no XBRL instance, so the primary source fails.
        Mock::given(method("GET"))
            .and(path(format!("{NVO_FOLDER}/index.json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "directory": {"item": [{"name": "novo-20231231.htm"}]}
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{NVO_FOLDER}/novo-20231231.htm")))
            .respond_with(ResponseTemplate::new(200).set_body_string(mdna_html()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/xbrl/companyfacts/CIK0000353278.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cik": 353278,
                "entityName": "NOVO NORDISK A S",
                "facts": {"ifrs-full": {
                    "Revenue": {"units": {"DKK": [
                        fact(Some("2022-01-01"), "2022-12-31", 176_954_000_000.0, 2022),
                        fact(Some("2023-01-01"), "2023-12-31", 232_261_000_000.0, 2023)
                    ]}},
                    "Assets": {"units": {"DKK": [
                        fact(None, "2023-12-31", 314_486_000_000.0, 2023)
                    ]}},
                    "CashFlowsFromUsedInOperatingActivities": {"units": {"DKK": [
                        fact(Some("2023-01-01"), "2023-12-31", 98_902_000_000.0, 2023)
                    ]}}
                }}
            })))
            .mount(server)
            .await;
    }

    fn config(server: &MockServer, output: &Path, mdna: bool) -> IngestConfig {
        let edgar = EdgarConfig::new("Test Suite test@example.com")
            .with_endpoints(Endpoints::single(server.uri()))
            .with_min_request_interval(Duration::ZERO);
        IngestConfig::new("Test Suite test@example.com")
            .with_edgar(edgar)
            .with_output_root(output)
            .with_cache_root(output.join(".cache"))
            .with_mdna(mdna)
    }

    fn ingestor(server: &MockServer, output: &Path, mdna: bool) -> Ingestor {
        Ingestor::new(config(server, output, mdna)).unwrap()
    }

    fn names(report: &IngestionReport) -> Vec<String> {
        report
            .outputs
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_foreign_issuer_falls_back_to_company_facts() {
        let server = MockServer::start().await;
        mount_nvo(&server).await;
        let output = tempfile::tempdir().unwrap();

        let report = ingestor(&server, output.path(), true).ingest(&["353278"]).await;

        assert!(report.is_clean(), "{:?}", report.failures);
        assert_eq!(report.companies_processed, 1);
        assert_eq!(report.filings_count, 1);

        let names = names(&report);
        for expected in [
            "NVO_submissions.parquet",
            "NVO_facts_income_statement.parquet",
            "NVO_facts_balance_sheet.parquet",
            "NVO_facts_cash_flow.parquet",
            "common_size_income_statement.csv",
            "flux_income_statement.csv",
            "NVO_20-F_20240205_mdna.txt",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected} in {names:?}");
        }
        assert!(!names.iter().any(|n| n.contains("_filings_")));

        let mdna = std::fs::read_to_string(output.path().join("NVO/NVO_20-F_20240205_mdna.txt")).unwrap();
        assert!(mdna.starts_with("Item 5. Operating and Financial Review"));
        assert!(!mdna.contains("Directors"));

        let flux = std::fs::read_to_string(output.path().join("NVO/flux_income_statement.csv")).unwrap();
        let lines: Vec<&str> = flux.lines().collect();
        assert_eq!(lines[0], "period,Revenue");
        assert_eq!(lines[1], "2022-01-01..2022-12-31,");
    }

    #[tokio::test]
    async fn test_ticker_missing_from_directory_uses_ticker_file_and_20f_only() {
        let server = MockServer::start().await;
        mount_directory(&server, false).await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/Archives/edgar/data/353278/000035327824000020/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(0)
            .mount(&server)
            .await;
        mount_filings(&server).await;
        let output = tempfile::tempdir().unwrap();

        // Hints for domestic forms are overridden by the discovered 20-F.
        let hints: FilingFormSet = [FormType::AnnualDomestic, FormType::QuarterlyDomestic]
            .into_iter()
            .collect();
        let ingestor = Ingestor::new(config(&server, output.path(), true).with_forms(hints)).unwrap();

        let report = ingestor.ingest(&["NVO"]).await;

        assert!(report.is_clean(), "{:?}", report.failures);
        assert_eq!(report.companies_processed, 1);
        assert_eq!(report.filings_count, 1);
        let names = names(&report);
        assert!(names.iter().any(|n| n == "NVO_20-F_20240205_mdna.txt"), "{names:?}");
        assert!(!names.iter().any(|n| n.contains("_10-K_") || n.contains("_10-Q_")));

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().any(|r| r.url.path() == "/include/ticker.txt"));
        assert!(
            requests
                .iter()
                .filter(|r| r.url.path().starts_with("/Archives/"))
                .all(|r| r.url.path().contains("/000035327824000010/"))
        );
        server.verify().await;
    }

    #[tokio::test]
    async fn test_unresolvable_identifier_is_isolated() {
        let server = MockServer::start().await;
        mount_nvo(&server).await;
        let output = tempfile::tempdir().unwrap();

        let report = ingestor(&server, output.path(), false)
            .ingest(&["ZZZZ", "NVO"])
            .await;

        assert_eq!(report.companies_processed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].identifier, "ZZZZ");
        assert_eq!(report.failures[0].stage, Stage::Resolve);
        assert!(!names(&report).iter().any(|n| n.ends_with("_mdna.txt")));
    }

    #[tokio::test]
    async fn test_analyze_output_root_rebuilds_csvs() {
        let server = MockServer::start().await;
        mount_nvo(&server).await;
        let output = tempfile::tempdir().unwrap();
        ingestor(&server, output.path(), true).ingest(&["353278"]).await;

        let csv = output.path().join("NVO/common_size_balance_sheet.csv");
        std::fs::remove_file(&csv).unwrap();

        let report = analyze_output_root(output.path()).unwrap();
        assert_eq!(report.companies_processed, 1);
        assert!(csv.exists());

        let statements = read_statements(&output.path().join("NVO")).unwrap();
        assert_eq!(
            statements[&StatementKind::IncomeStatement].rows.len(),
            2
        );
    }

    fn live_config(output: &Path) -> IngestConfig {
        let identity = std::env::var("EDGAR_IDENTITY")
            .unwrap_or_else(|_| "filings test suite filings@example.com".to_string());
        IngestConfig::new(identity).with_output_root(output)
    }

    #[tokio::test]
    #[ignore = "requires network access to SEC EDGAR"]
    async fn test_live_apple_ticker_and_cik() {
        let output = tempfile::tempdir().unwrap();
        let ingestor = Ingestor::new(live_config(output.path())).unwrap();

        let report = ingestor.ingest(&["AAPL", "320193"]).await;

        assert_eq!(report.companies_processed, 2);
        let aapl = output.path().join("AAPL");
        assert!(aapl.join("AAPL_submissions.parquet").exists());
        assert!(aapl.join("common_size_income_statement.csv").exists());
        assert!(
            std::fs::read_dir(&aapl)
                .unwrap()
                .filter_map(|e| e.ok())
                .any(|e| e.file_name().to_string_lossy().contains("_10-K_"))
        );
    }

    #[tokio::test]
    #[ignore = "requires network access to SEC EDGAR"]
    async fn test_live_novo_nordisk_uses_20f() {
        let output = tempfile::tempdir().unwrap();
        let ingestor = Ingestor::new(live_config(output.path())).unwrap();

        let report = ingestor.ingest(&["NVO"]).await;

        assert_eq!(report.companies_processed, 1);
        let nvo = output.path().join("NVO");
        let files: Vec<String> = std::fs::read_dir(&nvo)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(files.iter().any(|f| f.ends_with("_income_statement.parquet")));
        assert!(!files.iter().any(|f| f.contains("_10-K_")));
    }
}
