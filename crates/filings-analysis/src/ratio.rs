//! Common-size and flux computations.

use std::collections::HashMap;

use filings_core::{Period, StatementKind};
use tracing::debug;

use crate::pivot::WideTable;
use crate::table::{AnalysisKind, AnalysisTable};

/// Denominator concepts for a statement, in order of preference.
///
/// Covers US GAAP and IFRS names. Unclassified concepts have no denominator.
#[must_use]
pub const fn denominator_candidates(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::IncomeStatement => &[
            "Revenues",
            "RevenueFromContractWithCustomerExcludingAssessedTax",
            "SalesRevenueNet",
            "RevenueFromContractWithCustomerIncludingAssessedTax",
            "SalesRevenueGoodsNet",
            "Revenue",
        ],
        StatementKind::BalanceSheet => &[
            "Assets",
            "LiabilitiesAndStockholdersEquity",
            "EquityAndLiabilities",
        ],
        StatementKind::CashFlow => &[
            "NetCashProvidedByUsedInOperatingActivities",
            "CashAndCashEquivalentsPeriodIncreaseDecrease",
            "CashFlowsFromUsedInOperatingActivities",
        ],
        StatementKind::Unclassified => &[],
    }
}

fn empty_rows(wide: &WideTable) -> Vec<Vec<Option<f64>>> {
    vec![vec![None; wide.concepts.len()]; wide.periods.len()]
}

/// Expresses every concept as a ratio of the statement's denominator.
///
/// The denominator is the first preferred concept present among the
/// columns. A period whose denominator is absent or zero is undefined as a
/// whole, as is every period when no denominator concept is present.
#[must_use]
pub fn common_size(wide: &WideTable) -> AnalysisTable {
    let denominator = denominator_candidates(wide.kind)
        .iter()
        .find_map(|name| wide.concept_index(name).map(|col| (*name, col)));

    let mut cells = empty_rows(wide);
    let mut undefined_periods = 0;

    for (row, out) in cells.iter_mut().enumerate() {
        let base = denominator
            .and_then(|(_, col)| wide.value(row, col))
            .filter(|v| *v != 0.0);
        let Some(base) = base else {
            undefined_periods += 1;
            continue;
        };
        for (col, cell) in out.iter_mut().enumerate() {
            *cell = wide.value(row, col).map(|v| v / base);
        }
    }

    if undefined_periods > 0 {
        debug!(
            kind = %wide.kind,
            denominator = denominator.map_or("none", |(name, _)| name),
            undefined_periods,
            "Common-size periods without a usable denominator"
        );
    }

    AnalysisTable {
        kind: wide.kind,
        analysis: AnalysisKind::CommonSize,
        periods: wide.periods.clone(),
        concepts: wide.concepts.clone(),
        cells,
        denominator: denominator.map(|(name, _)| name.to_string()),
        undefined_periods,
    }
}

/// Length class of a period in whole months; `0` for instants.
///
/// Quarters, half years, year-to-date totals and fiscal years each land in
/// their own class regardless of a day or two of calendar drift.
fn length_months(period: &Period) -> i64 {
    period.start.map_or(0, |start| {
        let days = (period.end - start).num_days() + 1;
        (days as f64 / 30.44).round() as i64
    })
}

/// Period-over-period change: `(current - previous) / |previous|`.
///
/// The previous period is the nearest earlier one of the same length, so a
/// quarter is compared with the quarter before it and never with a fiscal
/// year or a year-to-date total. The first period of each length is
/// undefined, as is any cell whose previous value is absent or zero.
#[must_use]
pub fn flux(wide: &WideTable) -> AnalysisTable {
    let mut cells = empty_rows(wide);
    let mut last_of_length: HashMap<i64, usize> = HashMap::new();

    for (row, out) in cells.iter_mut().enumerate() {
        let length = length_months(&wide.periods[row]);
        let Some(previous_row) = last_of_length.insert(length, row) else {
            continue;
        };
        for (col, cell) in out.iter_mut().enumerate() {
            let previous = wide.value(previous_row, col).filter(|v| *v != 0.0);
            *cell = previous
                .zip(wide.value(row, col))
                .map(|(prev, cur)| (cur - prev) / prev.abs());
        }
    }

    let undefined_periods = cells
        .iter()
        .filter(|row| row.iter().all(Option::is_none))
        .count();

    AnalysisTable {
        kind: wide.kind,
        analysis: AnalysisKind::Flux,
        periods: wide.periods.clone(),
        concepts: wide.concepts.clone(),
        cells,
        denominator: None,
        undefined_periods,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::pivot;
    use filings_core::{StatementRow, StatementTable};

    fn instant(y: i32) -> Period {
        format!("{y}-12-31").parse().unwrap()
    }

    fn balance(rows: &[(&str, i32, f64)]) -> WideTable {
        let rows = rows
            .iter()
            .map(|(c, y, v)| StatementRow::new(*c, instant(*y), *v, "USD"))
            .collect();
        pivot(&StatementTable::from_rows(StatementKind::BalanceSheet, rows)).unwrap()
    }

    #[test]
    fn test_common_size_ratios() {
        let wide = balance(&[("Assets", 2023, 200.0), ("Cash", 2023, 50.0)]);
        let table = common_size(&wide);

        assert_eq!(table.denominator.as_deref(), Some("Assets"));
        assert_eq!(table.value(0, "Cash"), Some(0.25));
        assert_eq!(table.value(0, "Assets"), Some(1.0));
        assert_eq!(table.undefined_periods, 0);
    }

    #[test]
    fn test_absent_denominator_period_is_undefined() {
        let wide = balance(&[
            ("Assets", 2023, 200.0),
            ("Cash", 2023, 50.0),
            ("Cash", 2024, 70.0),
            ("Assets", 2022, 0.0),
            ("Cash", 2022, 10.0),
        ]);
        let table = common_size(&wide);

        // 2022 has a zero denominator, 2024 none at all.
        assert_eq!(table.cells[0], vec![None, None]);
        assert_eq!(table.cells[2], vec![None, None]);
        assert_eq!(table.value(1, "Cash"), Some(0.25));
        assert_eq!(table.undefined_periods, 2);
    }

    #[test]
    fn test_no_denominator_concept() {
        let wide = balance(&[("Cash", 2023, 50.0)]);
        let table = common_size(&wide);

        assert!(table.denominator.is_none());
        assert_eq!(table.undefined_periods, 1);
        assert_eq!(table.value(0, "Cash"), None);
    }

    #[test]
    fn test_flux_first_period_undefined() {
        let wide = balance(&[
            ("Assets", 2022, 100.0),
            ("Assets", 2023, 150.0),
            ("Assets", 2024, 75.0),
            ("Debt", 2022, 0.0),
            ("Debt", 2023, 10.0),
            ("Loss", 2023, -20.0),
            ("Loss", 2024, -10.0),
        ]);
        let table = flux(&wide);

        assert_eq!(table.cells[0], vec![None, None, None]);
        assert_eq!(table.value(1, "Assets"), Some(0.5));
        assert_eq!(table.value(2, "Assets"), Some(-0.5));
        // Previous value zero.
        assert_eq!(table.value(1, "Debt"), None);
        // Previous value absent.
        assert_eq!(table.value(1, "Loss"), None);
        assert_eq!(table.value(2, "Loss"), Some(0.5));
        assert_eq!(table.undefined_periods, 1);
    }

    #[test]
    fn test_flux_compares_periods_of_equal_length() {
        let period = |range: &str| -> Period { range.parse().unwrap() };
        let rows = vec![
            StatementRow::new("Revenues", period("2023-01-01..2023-12-31"), 400.0, "USD"),
            StatementRow::new("Revenues", period("2024-01-01..2024-03-31"), 100.0, "USD"),
            StatementRow::new("Revenues", period("2024-04-01..2024-06-30"), 100.0, "USD"),
            StatementRow::new("Revenues", period("2024-01-01..2024-06-30"), 200.0, "USD"),
            StatementRow::new("Revenues", period("2024-07-01..2024-09-30"), 120.0, "USD"),
            StatementRow::new("Revenues", period("2024-01-01..2024-12-31"), 440.0, "USD"),
        ];
        let wide = pivot(&StatementTable::from_rows(StatementKind::IncomeStatement, rows)).unwrap();
        let table = flux(&wide);

        let at = |range: &str| {
            let row = table.periods.iter().position(|p| *p == period(range)).unwrap();
            table.value(row, "Revenues")
        };
        assert_eq!(at("2023-01-01..2023-12-31"), None);
        assert_eq!(at("2024-01-01..2024-03-31"), None);
        assert_eq!(at("2024-01-01..2024-06-30"), None);
        assert_eq!(at("2024-04-01..2024-06-30"), Some(0.0));
        assert_eq!(at("2024-07-01..2024-09-30"), Some(0.2));
        assert_eq!(at("2024-01-01..2024-12-31"), Some(0.1));
        assert_eq!(table.undefined_periods, 3);
    }
}
