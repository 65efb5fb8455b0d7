//! Analysis output tables.

use std::fmt;

use filings_core::{DataError, Period, Result, StatementKind};
use polars::prelude::*;

/// Which analysis produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalysisKind {
    /// Each concept as a ratio of the statement's denominator.
    CommonSize,
    /// Change relative to the previous period.
    Flux,
}

impl AnalysisKind {
    /// Both analyses.
    pub const ALL: [Self; 2] = [Self::CommonSize, Self::Flux];

    /// Snake-case name used in file names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CommonSize => "common_size",
            Self::Flux => "flux",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A period by concept grid of derived ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisTable {
    /// Statement analysed.
    pub kind: StatementKind,
    /// Analysis applied.
    pub analysis: AnalysisKind,
    /// Row labels, ascending.
    pub periods: Vec<Period>,
    /// Column labels.
    pub concepts: Vec<String>,
    /// `cells[period][concept]`; `None` is undefined.
    pub cells: Vec<Vec<Option<f64>>>,
    /// Denominator concept (common-size only).
    pub denominator: Option<String>,
    /// Periods whose whole row is undefined.
    pub undefined_periods: usize,
}

impl AnalysisTable {
    /// Value at (period row, concept column).
    #[must_use]
    pub fn value(&self, period: usize, concept: &str) -> Option<f64> {
        let col = self.concepts.iter().position(|c| c == concept)?;
        self.cells.get(period)?.get(col).copied().flatten()
    }

    /// File name of the CSV artifact, e.g. `flux_balance_sheet.csv`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", self.analysis.as_str(), self.kind.as_str())
    }

    /// Converts the grid into a frame with a leading `period` column.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.concepts.len() + 1);
        columns.push(Column::new(
            "period".into(),
            self.periods.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ));
        for (col, concept) in self.concepts.iter().enumerate() {
            columns.push(Column::new(
                concept.as_str().into(),
                self.cells
                    .iter()
                    .map(|row| row.get(col).copied().flatten())
                    .collect::<Vec<Option<f64>>>(),
            ));
        }

        DataFrame::new(columns).map_err(|e| DataError::Output(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_frame() {
        let table = AnalysisTable {
            kind: StatementKind::CashFlow,
            analysis: AnalysisKind::Flux,
            periods: vec!["2023-12-31".parse().unwrap(), "2024-12-31".parse().unwrap()],
            concepts: vec!["A".to_string(), "B".to_string()],
            cells: vec![vec![None, None], vec![Some(0.5), None]],
            denominator: None,
            undefined_periods: 1,
        };

        let df = table.to_frame().unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("A").unwrap().null_count(), 1);
        assert_eq!(table.file_name(), "flux_cash_flow.csv");
        assert_eq!(table.value(1, "A"), Some(0.5));
    }
}
