//! Per-filing XBRL statement source.
//!
//! Reads each selected filing's XBRL instance and presentation linkbase from
//! the archive. Facts are placed on the statements whose presentation role
//! lists their concept, so the statements match what the company itself
//! presented. Filings packaged without a readable instance fail the source
//! as a whole, and the pipeline falls through to the company-facts source.

use async_trait::async_trait;
use filings_core::{
    CompanyIdentity, FetchError, FetchRequest, FilingRef, PrimaryFetchError, StatementKind,
    StatementRow, StatementSource, StatementTable, Statements,
};
use tracing::{debug, info};

use crate::client::EdgarClient;
use crate::history::select_recent_filings;
use crate::models::ArchiveListing;
use crate::xbrl::{locate_documents, parse_instance, parse_presentation};

/// Statement source backed by individual filings' XBRL documents.
#[derive(Debug, Clone)]
pub struct FilingXbrlSource {
    client: EdgarClient,
}

impl FilingXbrlSource {
    /// Create a new source.
    #[must_use]
    pub const fn new(client: EdgarClient) -> Self {
        Self { client }
    }

    /// Reads one filing into statement rows keyed by kind.
    async fn read_filing(
        &self,
        company: &CompanyIdentity,
        filing: &FilingRef,
    ) -> Result<Vec<(StatementKind, StatementRow)>, PrimaryFetchError> {
        let cik = &company.canonical_id;
        let folder = filing.accession_no_dashes();
        let endpoints = self.client.endpoints();

        let listing: ArchiveListing = self
            .client
            .get_json(&endpoints.archive_listing(cik, &folder))
            .await?;
        let (instance, presentation) = locate_documents(listing.names());
        let unknown = |detail: &str| PrimaryFetchError::UnknownSubmissionFormat {
            accession: filing.accession.clone(),
            detail: detail.to_string(),
        };
        let instance = instance.ok_or_else(|| unknown("no XBRL instance document"))?;
        let presentation = presentation.ok_or_else(|| unknown("no presentation linkbase"))?;

        let instance_xml = self
            .client
            .get_text(&endpoints.archive_file(cik, &folder, instance))
            .await?;
        let presentation_xml = self
            .client
            .get_text(&endpoints.archive_file(cik, &folder, presentation))
            .await?;

        let instance = parse_instance(&instance_xml)?;
        let concepts = parse_presentation(&presentation_xml)?;
        let filed = filing.filed();

        let mut rows = Vec::new();
        for (kind, members) in &concepts {
            for fact in instance.facts.iter().filter(|f| members.contains(&f.concept)) {
                let mut row = StatementRow::new(
                    fact.concept.as_str(),
                    fact.period,
                    fact.value,
                    fact.unit.as_str(),
                )
                .with_filing(filing.form.as_str(), filing.accession.as_str());
                row.fiscal_year = instance.fiscal_year;
                row.fiscal_period = instance.fiscal_period.clone();
                row.filed = filed;
                rows.push((*kind, row));
            }
        }

        debug!(
            accession = %filing.accession,
            instance = %instance_xml.len(),
            rows = rows.len(),
            "Read filing statements"
        );
        Ok(rows)
    }
}

#[async_trait]
impl StatementSource for FilingXbrlSource {
    fn name(&self) -> &str {
        "filings"
    }

    fn description(&self) -> &str {
        "Per-filing XBRL instance and presentation linkbase"
    }

    async fn fetch_statements(
        &self,
        request: FetchRequest<'_>,
    ) -> std::result::Result<Statements, FetchError> {
        let max = self.client.config().max_filings_per_form;
        let selected = select_recent_filings(request.filings, request.forms, max);
        if selected.is_empty() {
            return Err(PrimaryFetchError::NoFilings(request.forms.codes()).into());
        }

        let mut statements = Statements::new();
        for filing in &selected {
            for (kind, row) in self.read_filing(request.company, filing).await? {
                statements
                    .entry(kind)
                    .or_insert_with(|| StatementTable::new(kind))
                    .rows
                    .push(row);
            }
        }

        let mut superseded = 0;
        for table in statements.values_mut() {
            superseded += table.normalize();
        }
        statements.retain(|_, table| !table.is_empty());

        if statements.is_empty() {
            return Err(PrimaryFetchError::NoStatementFacts(selected.len()).into());
        }

        info!(
            cik = %request.company.canonical_id,
            filings = selected.len(),
            tables = statements.len(),
            superseded,
            "Built statements from filings"
        );
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xbrl::tests::{INSTANCE, PRESENTATION};
    use filings_core::{EdgarConfig, Endpoints, FilingFormSet, FormType};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FOLDER: &str = "/Archives/edgar/data/320193/000032019324000123";

    fn client(server: &MockServer) -> EdgarClient {
        EdgarClient::new(
            EdgarConfig::new("Test Suite test@example.com")
                .with_endpoints(Endpoints::single(server.uri()))
                .with_min_request_interval(Duration::ZERO),
        )
        .unwrap()
    }

    fn filings() -> Vec<FilingRef> {
        vec![
            FilingRef {
                accession: "0000320193-24-000200".to_string(),
                form: "8-K".to_string(),
                filing_date: "2024-11-15".to_string(),
                report_date: None,
                primary_document: None,
            },
            FilingRef {
                accession: "0000320193-24-000123".to_string(),
                form: "10-K".to_string(),
                filing_date: "2024-11-01".to_string(),
                report_date: Some("2024-09-28".to_string()),
                primary_document: Some("aapl-20240928.htm".to_string()),
            },
        ]
    }

    fn ten_k() -> FilingFormSet {
        [FormType::AnnualDomestic].into_iter().collect()
    }

    async fn mount_listing(server: &MockServer, names: &[&str]) {
        let items: Vec<_> = names
            .iter()
            .map(|n| serde_json::json!({ "name": n, "type": "text.gif" }))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("{FOLDER}/index.json")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "directory": { "item": items } })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_statements_from_filing() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            &["aapl-20240928.htm", "aapl-20240928_htm.xml", "aapl-20240928_pre.xml", "FilingSummary.xml"],
        )
        .await;
        Mock::given(method("GET"))
            .and(path(format!("{FOLDER}/aapl-20240928_htm.xml")))
            .respond_with(ResponseTemplate::new(200).set_body_string(INSTANCE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{FOLDER}/aapl-20240928_pre.xml")))
            .respond_with(ResponseTemplate::new(200).set_body_string(PRESENTATION))
            .mount(&server)
            .await;

        let company = CompanyIdentity::new("AAPL", "320193");
        let filings = filings();
        let forms = ten_k();
        let statements = FilingXbrlSource::new(client(&server))
            .fetch_statements(FetchRequest {
                company: &company,
                forms: &forms,
                filings: &filings,
            })
            .await
            .unwrap();

        let income = &statements[&StatementKind::IncomeStatement];
        assert_eq!(income.len(), 3);
        let revenue = income.rows.iter().find(|r| r.concept == "Revenues").unwrap();
        assert_eq!(revenue.value, 391_035_000_000.0);
        assert_eq!(revenue.form.as_deref(), Some("10-K"));
        assert_eq!(revenue.fiscal_year, Some(2024));
        assert_eq!(revenue.filed.map(|d| d.to_string()).as_deref(), Some("2024-11-01"));

        assert_eq!(statements[&StatementKind::BalanceSheet].len(), 1);
        // Net income is presented on both the income and cash flow statements.
        let cash = &statements[&StatementKind::CashFlow];
        assert_eq!(cash.len(), 2);
        assert!(cash.rows.iter().any(|r| r.concept == "NetIncomeLoss"));
    }

    #[tokio::test]
    async fn test_missing_instance_is_unknown_format() {
        let server = MockServer::start().await;
        mount_listing(&server, &["aapl-20240928.htm", "aapl-20240928_pre.xml"]).await;

        let company = CompanyIdentity::new("AAPL", "320193");
        let filings = filings();
        let forms = ten_k();
        let err = FilingXbrlSource::new(client(&server))
            .fetch_statements(FetchRequest {
                company: &company,
                forms: &forms,
                filings: &filings,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::Primary(PrimaryFetchError::UnknownSubmissionFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_matching_filings() {
        let server = MockServer::start().await;
        let company = CompanyIdentity::new("AAPL", "320193");
        let filings = filings();
        let forms: FilingFormSet = [FormType::AnnualForeignPrimary].into_iter().collect();

        let err = FilingXbrlSource::new(client(&server))
            .fetch_statements(FetchRequest {
                company: &company,
                forms: &forms,
                filings: &filings,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Primary(PrimaryFetchError::NoFilings(_))));
    }
}
