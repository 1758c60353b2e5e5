//! Extract command - run the full pipeline over a report directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use arep_core::{
    ExtractionOrchestrator, ExtractionOutput, FallbackTableSource, JsonTableSource,
    LayoutTableDetector, PdfExtractor, TableSource,
};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Directory holding the annual report PDFs
    #[arg(required = true)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "data_cleaned")]
    output_dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Where tables come from
    #[arg(short, long, value_enum, default_value = "auto")]
    tables: TableMode,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// One CSV per record collection
    Csv,
    /// A single JSON document
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TableMode {
    /// JSON sidecar when present, else layout detection
    Auto,
    /// Layout detection over page text only
    Layout,
    /// JSON sidecars only
    Sidecar,
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.is_dir() {
        anyhow::bail!("Input directory not found: {}", args.input.display());
    }
    fs::create_dir_all(&args.output_dir)?;

    let tables: Box<dyn TableSource> = match args.tables {
        TableMode::Auto => Box::new(FallbackTableSource::new(PdfExtractor::new())),
        TableMode::Layout => Box::new(LayoutTableDetector::new(PdfExtractor::new())),
        TableMode::Sidecar => Box::new(JsonTableSource::new()),
    };

    let year_count = config.years.fiscal_years().count();
    let orchestrator = ExtractionOrchestrator::new(config, PdfExtractor::new(), &*tables);

    info!("Extracting from {}", args.input.display());

    let pb = ProgressBar::new(year_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} years {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let output = orchestrator.run_with_progress(&args.input, |year| {
        pb.set_message(year.to_string());
        pb.inc(1);
    });

    pb.finish_with_message("Complete");

    let written = match args.format {
        OutputFormat::Csv => write_csv(&output, &args.output_dir)?,
        OutputFormat::Json => vec![write_json(&output, &args.output_dir)?],
    };

    println!();
    println!(
        "{} Extracted {} metric years, {} shareholder rows, {} rights issues in {:?}",
        style("✓").green(),
        style(output.metrics.len()).green(),
        style(output.shareholders.len()).green(),
        style(output.rights_issues.len()).green(),
        start.elapsed()
    );
    for path in &written {
        println!("  - {}", path.display());
    }
    if output.metrics.is_empty() {
        println!(
            "{} No metrics found. Check the document mapping with 'arep config get documents'.",
            style("ℹ").blue()
        );
    }

    Ok(())
}

/// Write the CSV files and return their paths.
fn write_csv(output: &ExtractionOutput, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if !output.metrics.is_empty() {
        let path = dir.join("financial_metrics.csv");
        let (columns, rows) = output.metric_rows();
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(&columns)?;
        for row in rows {
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        written.push(path);
    }

    for year in output.shareholder_years() {
        let path = dir.join(format!("shareholders_{}.csv", year));
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(["rank", "shareholder_name", "ownership_percentage"])?;
        for holder in output.shareholders_for(year) {
            wtr.write_record([
                holder.rank.to_string(),
                holder.shareholder_name.clone(),
                holder.ownership_percentage.to_string(),
            ])?;
        }
        wtr.flush()?;
        written.push(path);
    }

    if !output.rights_issues.is_empty() {
        let path = dir.join("right_issues.csv");
        let mut wtr = csv::Writer::from_path(&path)?;
        for issue in &output.rights_issues {
            wtr.serialize(issue)?;
        }
        wtr.flush()?;
        written.push(path);
    }

    debug!("Wrote {} CSV files to {}", written.len(), dir.display());
    Ok(written)
}

fn write_json(output: &ExtractionOutput, dir: &Path) -> anyhow::Result<PathBuf> {
    let path = dir.join("extraction.json");
    fs::write(&path, serde_json::to_string_pretty(output)?)?;
    Ok(path)
}
