//! Artifact writer.
//!
//! Every company gets one directory under the output root, named by its
//! display ticker or CIK. Re-running overwrites artifacts in place.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use filings_analysis::AnalysisTable;
use filings_core::{
    CompanyIdentity, DataError, FilingRef, Result, StatementKind, StatementTable, Statements,
};
use polars::prelude::*;
use tracing::debug;

/// Statement source tags used in Parquet file names.
pub const SOURCE_TAGS: [&str; 2] = ["filings", "facts"];

/// Writes Parquet, CSV and text artifacts below an output root.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    /// Creates a writer rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory of one company, created if missing.
    pub fn company_dir(&self, company: &CompanyIdentity) -> Result<PathBuf> {
        let dir = self.root.join(company.label());
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Writes every statement table as `<T>_<source>_<kind>.parquet`.
    ///
    /// Statement tables left by an earlier run, from either source, are
    /// removed first, so the directory only holds the current run's tables.
    pub fn write_statements(
        &self,
        company: &CompanyIdentity,
        source: &str,
        statements: &Statements,
    ) -> Result<Vec<PathBuf>> {
        let dir = self.company_dir(company)?;
        remove_statements(&dir, company.label())?;
        let mut paths = Vec::with_capacity(statements.len());
        for (kind, table) in statements {
            let path = dir.join(statement_file_name(company.label(), source, *kind));
            write_parquet(&path, &mut table.to_frame()?)?;
            paths.push(path);
        }
        Ok(paths)
    }

    /// Writes the filing history as `<T>_submissions.parquet`.
    pub fn write_history(&self, company: &CompanyIdentity, frame: &mut DataFrame) -> Result<PathBuf> {
        let path = self
            .company_dir(company)?
            .join(format!("{}_submissions.parquet", company.label()));
        write_parquet(&path, frame)?;
        Ok(path)
    }

    /// Writes an analysis table as `<analysis>_<kind>.csv` into `dir`.
    pub fn write_analysis(&self, dir: &Path, table: &AnalysisTable) -> Result<PathBuf> {
        let path = dir.join(table.file_name());
        let mut frame = table.to_frame()?;
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)
            .map_err(|e| DataError::Output(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), rows = frame.height(), "Wrote CSV");
        Ok(path)
    }

    /// Writes an MD&A section as `<T>_<form>_<yyyymmdd>_mdna.txt`.
    pub fn write_mdna(
        &self,
        company: &CompanyIdentity,
        filing: &FilingRef,
        text: &str,
    ) -> Result<PathBuf> {
        let path = self.company_dir(company)?.join(format!(
            "{}_{}_{}_mdna.txt",
            company.label(),
            filing.form,
            filing.compact_filing_date()
        ));
        fs::write(&path, text)?;
        debug!(path = %path.display(), chars = text.len(), "Wrote MD&A");
        Ok(path)
    }
}

/// `<T>_<source>_<kind>.parquet`.
#[must_use]
pub fn statement_file_name(label: &str, source: &str, kind: StatementKind) -> String {
    format!("{label}_{source}_{}.parquet", kind.as_str())
}

fn remove_statements(dir: &Path, label: &str) -> Result<()> {
    for source in SOURCE_TAGS {
        for kind in StatementKind::ALL {
            let path = dir.join(statement_file_name(label, source, kind));
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed previous statement table"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

fn write_parquet(path: &Path, frame: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;
    ParquetWriter::new(&mut file)
        .finish(frame)
        .map_err(|e| DataError::Output(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), rows = frame.height(), "Wrote Parquet");
    Ok(())
}

/// Reads the statement tables previously written into a company directory.
///
/// When both sources wrote a table of the same kind, the `filings` table wins.
pub fn read_statements(dir: &Path) -> Result<Statements> {
    let mut statements = Statements::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let matched = StatementKind::ALL.iter().find_map(|kind| {
            SOURCE_TAGS
                .iter()
                .position(|source| name.ends_with(&format!("_{source}_{}.parquet", kind.as_str())))
                .map(|rank| (*kind, rank))
        });
        let Some((kind, rank)) = matched else {
            continue;
        };
        if rank > 0 && statements.contains_key(&kind) {
            continue;
        }

        let file = File::open(&path)?;
        let frame = ParquetReader::new(file)
            .finish()
            .map_err(|e| DataError::Parse(format!("{}: {e}", path.display())))?;
        statements.insert(kind, StatementTable::from_frame(kind, &frame)?);
    }

    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_core::{Period, StatementRow};

    fn statements(value: f64) -> Statements {
        let period: Period = "2024-01-01..2024-12-31".parse().unwrap();
        let mut statements = Statements::new();
        statements.insert(
            StatementKind::IncomeStatement,
            StatementTable::from_rows(
                StatementKind::IncomeStatement,
                vec![StatementRow::new("Revenue", period, value, "DKK").with_filing("20-F", "a1")],
            ),
        );
        statements
    }

    #[test]
    fn test_statement_file_name() {
        assert_eq!(
            statement_file_name("NVO", "facts", StatementKind::CashFlow),
            "NVO_facts_cash_flow.parquet"
        );
    }

    #[test]
    fn test_write_and_read_statements() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let company = CompanyIdentity::new("NVO", "353278").with_display_ticker("nvo");

        let facts = writer.write_statements(&company, "facts", &statements(1.0)).unwrap();
        assert!(facts[0].ends_with("NVO/NVO_facts_income_statement.parquet"));

        let read = read_statements(&dir.path().join("NVO")).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[&StatementKind::IncomeStatement].rows[0].value, 1.0);
    }

    #[test]
    fn test_read_statements_prefers_filings_when_both_present() {
        let dir = tempfile::tempdir().unwrap();
        let company_dir = dir.path().join("NVO");
        fs::create_dir_all(&company_dir).unwrap();
        for (source, value) in [("facts", 1.0), ("filings", 2.0)] {
            let statements = statements(value);
            let mut frame = statements[&StatementKind::IncomeStatement].to_frame().unwrap();
            let path = company_dir.join(statement_file_name("NVO", source, StatementKind::IncomeStatement));
            write_parquet(&path, &mut frame).unwrap();
        }

        let read = read_statements(&company_dir).unwrap();
        assert_eq!(read[&StatementKind::IncomeStatement].rows[0].value, 2.0);
    }

    #[test]
    fn test_rewrite_removes_tables_from_previous_source() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let company = CompanyIdentity::new("NVO", "353278").with_display_ticker("NVO");

        let earlier = writer.write_statements(&company, "filings", &statements(2.0)).unwrap();
        writer.write_statements(&company, "facts", &statements(1.0)).unwrap();

        assert!(!earlier[0].exists());
        let read = read_statements(&dir.path().join("NVO")).unwrap();
        assert_eq!(read[&StatementKind::IncomeStatement].rows[0].value, 1.0);
    }

    #[test]
    fn test_write_mdna_name() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let company = CompanyIdentity::new("320193", "320193");
        let filing = FilingRef {
            accession: "0000320193-24-000123".to_string(),
            form: "10-K".to_string(),
            filing_date: "2024-11-01".to_string(),
            report_date: None,
            primary_document: None,
        };

        let path = writer.write_mdna(&company, &filing, "Item 7.").unwrap();
        assert!(path.ends_with("320193/320193_10-K_20241101_mdna.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "Item 7.");
    }
}
