#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use filings_core::{AnalysisAmbiguityError, StatementKind, StatementTable, Statements};
use tracing::{debug, warn};

/// Long to wide reshaping.
pub mod pivot;
/// Common-size and flux computations.
pub mod ratio;
/// Analysis output tables.
pub mod table;

pub use pivot::{WideTable, pivot, unpivot};
pub use ratio::{common_size, denominator_candidates, flux};
pub use table::{AnalysisKind, AnalysisTable};

/// Both analyses of one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementAnalysis {
    /// Common-size table.
    pub common_size: AnalysisTable,
    /// Flux table.
    pub flux: AnalysisTable,
}

impl StatementAnalysis {
    /// The two tables, common-size first.
    #[must_use]
    pub fn tables(&self) -> [&AnalysisTable; 2] {
        [&self.common_size, &self.flux]
    }
}

/// Analyses one statement table.
pub fn analyze_table(table: &StatementTable) -> Result<StatementAnalysis, AnalysisAmbiguityError> {
    let wide = pivot(table)?;
    Ok(StatementAnalysis {
        common_size: common_size(&wide),
        flux: flux(&wide),
    })
}

/// Analyses every statement present.
///
/// An ambiguous statement fails on its own; the others are still analysed.
/// Kinds absent from the input produce no entry.
#[must_use]
pub fn analyze(
    statements: &Statements,
) -> BTreeMap<StatementKind, Result<StatementAnalysis, AnalysisAmbiguityError>> {
    statements
        .iter()
        .map(|(kind, table)| {
            let result = analyze_table(table);
            match &result {
                Ok(analysis) => debug!(
                    kind = %kind,
                    periods = analysis.flux.periods.len(),
                    concepts = analysis.flux.concepts.len(),
                    "Analysed statement"
                ),
                Err(e) => warn!(kind = %kind, error = %e, "Statement not analysed"),
            }
            (*kind, result)
        })
        .collect()
}
