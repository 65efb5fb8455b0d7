//! Long to wide reshaping.

use std::collections::{BTreeMap, BTreeSet};

use filings_core::{AnalysisAmbiguityError, Period, StatementKind, StatementTable};

/// A statement as a grid: one row per period (ascending), one column per concept.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    /// Statement the grid came from.
    pub kind: StatementKind,
    /// Row labels, ascending.
    pub periods: Vec<Period>,
    /// Column labels, sorted.
    pub concepts: Vec<String>,
    /// `cells[period][concept]`; `None` where the statement reports nothing.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl WideTable {
    /// Index of a concept column.
    #[must_use]
    pub fn concept_index(&self, concept: &str) -> Option<usize> {
        self.concepts.iter().position(|c| c == concept)
    }

    /// Value at (period row, concept column).
    #[must_use]
    pub fn value(&self, period: usize, concept: usize) -> Option<f64> {
        self.cells.get(period)?.get(concept).copied().flatten()
    }
}

/// Pivots a long-form table into a grid.
///
/// Fails when one (concept, period) carries more than one row, e.g. the
/// same concept reported in two units.
pub fn pivot(table: &StatementTable) -> Result<WideTable, AnalysisAmbiguityError> {
    let mut grouped: BTreeMap<(&str, Period), Vec<f64>> = BTreeMap::new();
    for row in &table.rows {
        grouped
            .entry((row.concept.as_str(), row.period))
            .or_default()
            .push(row.value);
    }

    if let Some(((concept, period), values)) = grouped.iter().find(|(_, v)| v.len() > 1) {
        return Err(AnalysisAmbiguityError {
            concept: (*concept).to_string(),
            period: *period,
            count: values.len(),
        });
    }

    let periods: Vec<Period> = grouped
        .keys()
        .map(|(_, p)| *p)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let concepts: Vec<String> = grouped
        .keys()
        .map(|(c, _)| *c)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut cells = vec![vec![None; concepts.len()]; periods.len()];
    for ((concept, period), values) in &grouped {
        let (Ok(row), Ok(col)) = (
            periods.binary_search(period),
            concepts.binary_search_by(|c| c.as_str().cmp(concept)),
        ) else {
            continue;
        };
        cells[row][col] = values.first().copied();
    }

    Ok(WideTable {
        kind: table.kind,
        periods,
        concepts,
        cells,
    })
}

/// Flattens a grid back to (concept, period, value) triples, dropping
/// undefined cells. Ordered by concept, then period.
#[must_use]
pub fn unpivot(wide: &WideTable) -> Vec<(String, Period, f64)> {
    let mut long = Vec::new();
    for (col, concept) in wide.concepts.iter().enumerate() {
        for (row, period) in wide.periods.iter().enumerate() {
            if let Some(value) = wide.value(row, col) {
                long.push((concept.clone(), *period, value));
            }
        }
    }
    long
}
