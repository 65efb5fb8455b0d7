//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use filings::config::DEFAULT_OUTPUT_ROOT;
use filings::{FilingFormSet, FormType, IngestConfig, IngestionReport, Ingestor, ScorerKind};
use tracing_subscriber::{EnvFilter, fmt};

/// Ingest SEC filings: statements, MD&A and analysis per company.
#[derive(Parser, Debug)]
#[command(name = "filings", author, version, about, long_about = None)]
struct Args {
    /// Tickers or CIKs to ingest
    #[arg(required_unless_present = "analyze_only")]
    identifiers: Vec<String>,

    /// Form hints, comma separated (10-K, 10-Q, 20-F, 40-F)
    #[arg(long, value_delimiter = ',')]
    forms: Vec<FormType>,

    /// Output root (default: DATA_DIR or data/parquet)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Reference cache directory (default: CACHE_DIR, else in-memory)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Contact identity sent to the registry (default: EDGAR_IDENTITY or EDGAR_EMAIL)
    #[arg(long)]
    identity: Option<String>,

    /// Skip MD&A extraction
    #[arg(long)]
    no_mdna: bool,

    /// Most recent filings per form used for statements and MD&A
    #[arg(long)]
    max_filings_per_form: Option<usize>,

    /// MD&A candidate scorer
    #[arg(long, default_value_t = ScorerKind::Longest)]
    scorer: ScorerKind,

    /// Only re-run the analysis over tables already under the output root
    #[arg(long)]
    analyze_only: bool,
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

fn build_config(args: &Args) -> filings::Result<IngestConfig> {
    let identity = args.identity.clone();
    let mut config = IngestConfig::from_vars(|key| match (key, &identity) {
        ("EDGAR_IDENTITY", Some(identity)) => Some(identity.clone()),
        _ => std::env::var(key).ok(),
    })?;

    if let Some(dir) = &args.output_dir {
        config = config.with_output_root(dir);
    }
    if let Some(dir) = &args.cache_dir {
        config = config.with_cache_root(dir);
    }
    if let Some(max) = args.max_filings_per_form {
        config.edgar = config.edgar.with_max_filings_per_form(max);
    }
    let forms: FilingFormSet = args.forms.iter().copied().collect();
    Ok(config
        .with_forms(forms)
        .with_mdna(!args.no_mdna)
        .with_scorer(args.scorer))
}

fn print_report(report: &IngestionReport) {
    for path in &report.outputs {
        println!("wrote {}", path.display());
    }
    for failure in &report.failures {
        eprintln!("failed {failure}");
    }
    println!(
        "{} companies, {} filings, {} outputs, {} failures",
        report.companies_processed,
        report.filings_count,
        report.outputs.len(),
        report.failures.len()
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let args = Args::parse();
    tracing::debug!(?args, "Parsed arguments");

    let report = if args.analyze_only {
        let root = args
            .output_dir
            .clone()
            .or_else(|| std::env::var("DATA_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT));
        match filings::analyze_output_root(&root) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("analysis failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        let ingestor = match build_config(&args).and_then(Ingestor::new) {
            Ok(ingestor) => ingestor,
            Err(e) => {
                eprintln!("setup failed: {e}");
                return ExitCode::FAILURE;
            }
        };
        ingestor.ingest(args.identifiers.as_slice()).await
    };

    print_report(&report);
    if report.companies_processed == 0 && !report.failures.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
