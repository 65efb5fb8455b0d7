//! Company-facts statement source.
//!
//! Reads the aggregated company-facts feed instead of individual filings, so
//! it works for every filer regardless of how its submissions are packaged.
//! Concepts are bucketed into statements by a prioritized keyword rule list.

use async_trait::async_trait;
use filings_core::{
    DataError, FallbackFetchError, FetchError, FetchRequest, FilingFormSet, FormType, Period,
    StatementKind, StatementRow, StatementSource, StatementTable, Statements,
};
use tracing::{debug, info, trace};

use crate::client::EdgarClient;
use crate::models::CompanyFactsResponse;

/// Prioritized keyword rules mapping concept names to statements.
///
/// Rules are checked in order and the first rule with a keyword contained in
/// the concept name wins. Concepts matching no rule are
/// [`StatementKind::Unclassified`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRules {
    rules: Vec<(StatementKind, Vec<String>)>,
}

const CASH_FLOW_KEYWORDS: &[&str] = &[
    "CashFlow",
    "NetCashProvidedBy",
    "Financing",
    "Investing",
    "IncreaseDecrease",
    "PaymentsTo",
    "PaymentsFor",
    "PaymentsOf",
    "ProceedsFrom",
    "RepaymentsOf",
];

const INCOME_KEYWORDS: &[&str] = &[
    "Revenue",
    "CostOf",
    "OperatingIncome",
    "NetIncome",
    "GrossProfit",
    "EarningsPerShare",
    "Expense",
    "IncomeTax",
    "ProfitLoss",
    "ComprehensiveIncome",
];

const BALANCE_KEYWORDS: &[&str] = &[
    "Assets",
    "Liabilities",
    "Equity",
    "Inventor",
    "Receivable",
    "Payable",
    "Debt",
    "PropertyPlantAndEquipment",
    "Goodwill",
    "CashAndCashEquivalentsAtCarryingValue",
];

impl Default for ClassificationRules {
    fn default() -> Self {
        Self::empty()
            .with_rule(StatementKind::CashFlow, CASH_FLOW_KEYWORDS)
            .with_rule(StatementKind::IncomeStatement, INCOME_KEYWORDS)
            .with_rule(StatementKind::BalanceSheet, BALANCE_KEYWORDS)
    }
}

impl ClassificationRules {
    /// Creates a rule list with no rules; every concept is unclassified.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule with the lowest priority so far.
    #[must_use]
    pub fn with_rule(mut self, kind: StatementKind, keywords: &[&str]) -> Self {
        self.rules
            .push((kind, keywords.iter().map(|k| (*k).to_string()).collect()));
        self
    }

    /// Returns the statement a concept belongs to.
    #[must_use]
    pub fn classify(&self, concept: &str) -> StatementKind {
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| concept.contains(k.as_str())))
            .map_or(StatementKind::Unclassified, |(kind, _)| *kind)
    }
}

/// Flattens a company-facts response into statement tables.
///
/// Every taxonomy is read. Facts reported on a form outside `forms` are
/// skipped; facts without a form are kept. Each table is normalized.
#[must_use]
pub fn build_statements(
    response: &CompanyFactsResponse,
    forms: &FilingFormSet,
    rules: &ClassificationRules,
) -> Statements {
    let mut statements = Statements::new();
    let mut skipped = 0usize;

    for (taxonomy, concepts) in &response.facts {
        for (concept, tag) in concepts {
            let kind = rules.classify(concept);
            for (unit, values) in &tag.units {
                for fact in values {
                    if let Some(form) = fact.form.as_deref() {
                        let requested = FormType::from_code(form).is_some_and(|f| forms.contains(f));
                        if !requested {
                            continue;
                        }
                    }

                    let period = match Period::parse(fact.start.as_deref(), &fact.end) {
                        Ok(period) => period,
                        Err(e) => {
                            trace!(taxonomy = %taxonomy, concept = %concept, error = %e, "Skipping fact");
                            skipped += 1;
                            continue;
                        }
                    };

                    let mut row = StatementRow::new(concept.as_str(), period, fact.val, unit.as_str());
                    row.form = fact.form.clone();
                    row.accession = fact.accn.clone();
                    row.fiscal_year = fact.fy;
                    row.fiscal_period = fact.fp.clone();
                    row.filed = fact
                        .filed
                        .as_deref()
                        .and_then(|d| Period::parse(None, d).ok())
                        .map(|p| p.end);

                    statements
                        .entry(kind)
                        .or_insert_with(|| StatementTable::new(kind))
                        .rows
                        .push(row);
                }
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "Skipped facts with unparseable periods");
    }

    for table in statements.values_mut() {
        let superseded = table.normalize();
        if superseded > 0 {
            debug!(kind = %table.kind, superseded, "Restated values superseded by later filings");
        }
    }
    statements.retain(|_, table| !table.is_empty());
    statements
}

/// Statement source backed by the company-facts feed.
#[derive(Debug, Clone)]
pub struct CompanyFactsSource {
    client: EdgarClient,
    rules: ClassificationRules,
}

impl CompanyFactsSource {
    /// Create a source with the default classification rules.
    #[must_use]
    pub fn new(client: EdgarClient) -> Self {
        Self {
            client,
            rules: ClassificationRules::default(),
        }
    }

    /// Replaces the classification rules.
    #[must_use]
    pub fn with_rules(mut self, rules: ClassificationRules) -> Self {
        self.rules = rules;
        self
    }
}

#[async_trait]
impl StatementSource for CompanyFactsSource {
    fn name(&self) -> &str {
        "facts"
    }

    fn description(&self) -> &str {
        "SEC company facts feed, bucketed by concept keyword"
    }

    async fn fetch_statements(
        &self,
        request: FetchRequest<'_>,
    ) -> std::result::Result<Statements, FetchError> {
        let cik = request.company.canonical_id.clone();
        let url = self
            .client
            .endpoints()
            .company_facts(&request.company.padded_cik());

        let response: CompanyFactsResponse =
            self.client
                .get_json(&url)
                .await
                .map_err(|source| FallbackFetchError {
                    cik: cik.clone(),
                    source,
                })?;

        let statements = build_statements(&response, request.forms, &self.rules);
        if statements.is_empty() {
            return Err(FallbackFetchError {
                cik,
                source: DataError::NotFound(format!(
                    "no facts reported on forms {}",
                    request.forms
                )),
            }
            .into());
        }

        info!(
            cik = %cik,
            entity = %response.entity_name,
            tables = statements.len(),
            rows = statements.values().map(StatementTable::len).sum::<usize>(),
            "Built statements from company facts"
        );
        Ok(statements)
    }
}
