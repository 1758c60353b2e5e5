//! Year command - resolve the fiscal year of report files.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::warn;

use arep_core::extract::rules::DocumentYearResolver;
use arep_core::{PdfExtractor, TextSource};

/// Arguments for the year command.
#[derive(Args)]
pub struct YearArgs {
    /// Report files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Leading pages scanned when the filename does not decide
    #[arg(long)]
    scan_pages: Option<usize>,
}

pub fn run(args: YearArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let mut resolver = DocumentYearResolver::from_config(&config);
    if let Some(pages) = args.scan_pages {
        resolver = resolver.with_scan_pages(pages);
    }
    let extractor = PdfExtractor::new();

    let mut unresolved = 0;
    for path in &args.files {
        let name = path.display().to_string();
        let resolution = resolver.resolve(&name, || match extractor.pages(path) {
            Ok(pages) => Some(pages),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        });

        match resolution {
            Some(r) => println!("{}: {} ({})", name, style(r.year).green(), r.source),
            None => {
                unresolved += 1;
                println!("{}: {}", name, style("unknown").yellow());
            }
        }
    }

    if unresolved == args.files.len() {
        anyhow::bail!("Could not resolve a year for any file");
    }
    Ok(())
}
