//! Configuration structures for the extraction pipeline.
//!
//! All lookup tables (filename → year, year → documents, exchange rates,
//! event labels) live here and are handed to the components that need them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::records::FiscalYear;

/// Main configuration for the arep pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArepConfig {
    /// Fiscal year ranges.
    pub years: YearConfig,

    /// Document lookup tables.
    pub documents: DocumentConfig,

    /// Exchange rates and event annotations.
    pub rates: RateConfig,

    /// Extraction tuning.
    pub extraction: ExtractionConfig,
}

/// Fiscal year ranges used by the resolvers and the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YearConfig {
    /// First fiscal year the orchestrator extracts.
    pub first_year: FiscalYear,

    /// Last fiscal year the orchestrator extracts.
    pub last_year: FiscalYear,

    /// Lowest year accepted from a table cell.
    pub table_year_min: FiscalYear,

    /// Highest year accepted from a table cell.
    pub table_year_max: FiscalYear,

    /// Lowest year accepted from filenames and document content.
    pub content_year_min: FiscalYear,

    /// Highest year accepted from filenames and document content.
    pub content_year_max: FiscalYear,
}

impl Default for YearConfig {
    fn default() -> Self {
        Self {
            first_year: 2019,
            last_year: 2023,
            table_year_min: 2019,
            table_year_max: 2024,
            content_year_min: 2019,
            content_year_max: 2023,
        }
    }
}

impl YearConfig {
    /// Fiscal years the orchestrator iterates, in ascending order.
    pub fn fiscal_years(&self) -> impl Iterator<Item = FiscalYear> {
        self.first_year..=self.last_year
    }
}

/// Document lookup tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Exact filename to fiscal year.
    pub filename_years: BTreeMap<String, FiscalYear>,

    /// Fiscal year to the ordered documents covering it. Order matters:
    /// earlier documents win when values conflict.
    pub year_documents: BTreeMap<FiscalYear, Vec<String>>,

    /// Filename to the (first, second) years of its shareholder columns.
    pub shareholder_years: BTreeMap<String, (FiscalYear, FiscalYear)>,
}

const REPORTS: [(&str, FiscalYear); 5] = [
    ("508_1590052852777.pdf", 2020),
    ("508_1621849083921.pdf", 2021),
    ("508_1653300092463.pdf", 2022),
    ("508_1684842640428.pdf", 2023),
    ("508_1716290978705.pdf", 2024),
];

impl Default for DocumentConfig {
    fn default() -> Self {
        let filename_years = REPORTS
            .iter()
            .map(|(name, year)| (name.to_string(), *year))
            .collect();

        let shareholder_years = REPORTS
            .iter()
            .map(|(name, year)| (name.to_string(), (*year, year - 1)))
            .collect();

        // Each year is covered by its own report and the next year's restatement.
        let mut year_documents = BTreeMap::new();
        year_documents.insert(2019, vec![REPORTS[0].0.to_string()]);
        for pair in REPORTS.windows(2) {
            year_documents.insert(
                pair[0].1,
                vec![pair[0].0.to_string(), pair[1].0.to_string()],
            );
        }

        Self {
            filename_years,
            year_documents,
            shareholder_years,
        }
    }
}

/// Exchange rates and descriptive event labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// Annual average LKR per USD.
    pub exchange_rates: BTreeMap<FiscalYear, f64>,

    /// Macro event label per year.
    pub events: BTreeMap<FiscalYear, String>,
}

impl Default for RateConfig {
    fn default() -> Self {
        let exchange_rates = [
            (2019, 178.78),
            (2020, 185.52),
            (2021, 198.88),
            (2022, 359.89),
            (2023, 322.77),
        ]
        .into_iter()
        .collect();

        let events = [
            (2019, "Easter Sunday Attacks (April 21)"),
            (2020, "COVID-19 Pandemic Impact"),
            (2021, "Post-COVID Recovery Phase"),
            (2022, "Economic Crisis"),
            (2023, "Economic Recovery Period"),
        ]
        .into_iter()
        .map(|(year, label)| (year, label.to_string()))
        .collect();

        Self {
            exchange_rates,
            events,
        }
    }
}

/// Extraction tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Cells scanned on each side of a keyword cell.
    pub search_radius: usize,

    /// Largest accepted absolute value; bigger numbers are mis-parses.
    pub max_magnitude: f64,

    /// Pages scanned when resolving a document year from content.
    pub content_scan_pages: usize,

    /// Shareholders kept per year.
    pub top_shareholders: usize,

    /// Minimum digit count for a shareholder data line.
    pub min_data_line_digits: usize,

    /// Literal marker preceding the shareholder block in document text.
    pub shareholder_marker: String,

    /// Lowercase marker identifying a shareholder table.
    pub shareholder_table_marker: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            search_radius: 3,
            max_magnitude: 1e12,
            content_scan_pages: 5,
            top_shareholders: 20,
            min_data_line_digits: 5,
            shareholder_marker: "Top Twenty Shareholders of the Company".to_string(),
            shareholder_table_marker: "top twenty shareholder".to_string(),
        }
    }
}

impl ArepConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Human-readable inconsistencies; empty when the configuration is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let years = &self.years;

        if years.first_year > years.last_year {
            issues.push(format!(
                "first_year {} is after last_year {}",
                years.first_year, years.last_year
            ));
        }
        if years.table_year_min > years.table_year_max {
            issues.push("table_year_min is after table_year_max".to_string());
        }
        if years.content_year_min > years.content_year_max {
            issues.push("content_year_min is after content_year_max".to_string());
        }

        for year in years.fiscal_years() {
            match self.rates.exchange_rates.get(&year) {
                Some(rate) if *rate > 0.0 => {}
                Some(rate) => issues.push(format!("exchange rate for {} is not positive: {}", year, rate)),
                None => issues.push(format!("no exchange rate for {}", year)),
            }
        }

        for year in self.documents.year_documents.keys() {
            if !(years.first_year..=years.last_year).contains(year) {
                issues.push(format!("documents mapped to {} outside the fiscal range", year));
            }
        }

        if self.extraction.top_shareholders == 0 {
            issues.push("top_shareholders must be at least 1".to_string());
        }
        if self.extraction.shareholder_marker.trim().is_empty() {
            issues.push("shareholder_marker is empty".to_string());
        }

        issues
    }
}
