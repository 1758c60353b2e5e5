//! Fiscal year resolution for documents and tables.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use std::path::Path;

use tracing::{debug, warn};

use crate::models::config::ArepConfig;
use crate::models::records::FiscalYear;
use crate::models::table::RawTable;

use super::patterns::{
    CELL_YEAR_FULL, CELL_YEAR_RANGE, CELL_YEAR_SHORT, CONTENT_YEAR_PATTERNS, DIGIT_RUN,
    FILENAME_YEAR,
};

/// Which resolution path produced a document year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSource {
    /// Exact filename lookup.
    FilenameMap,
    /// Year token inside the filename.
    FilenameToken,
    /// Scan of the document's first pages.
    Content,
}

impl std::fmt::Display for YearSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            YearSource::FilenameMap => "filename map",
            YearSource::FilenameToken => "filename",
            YearSource::Content => "content",
        };
        f.write_str(label)
    }
}

/// A resolved document year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearResolution {
    pub year: FiscalYear,
    pub source: YearSource,
}

/// Resolves the fiscal year a whole document reports on.
#[derive(Debug, Clone)]
pub struct DocumentYearResolver {
    filename_years: BTreeMap<String, FiscalYear>,
    range: RangeInclusive<FiscalYear>,
    scan_pages: usize,
}

impl DocumentYearResolver {
    /// Create a resolver over a filename lookup table and accepted year range.
    pub fn new(filename_years: BTreeMap<String, FiscalYear>, range: RangeInclusive<FiscalYear>) -> Self {
        Self {
            filename_years,
            range,
            scan_pages: 5,
        }
    }

    /// Build from pipeline configuration.
    pub fn from_config(config: &ArepConfig) -> Self {
        Self::new(
            config.documents.filename_years.clone(),
            config.years.content_year_min..=config.years.content_year_max,
        )
        .with_scan_pages(config.extraction.content_scan_pages)
    }

    /// Set how many leading pages the content scan reads.
    pub fn with_scan_pages(mut self, pages: usize) -> Self {
        self.scan_pages = pages;
        self
    }

    /// Resolve from the filename only.
    pub fn from_filename(&self, filename: &str) -> Option<YearResolution> {
        let base = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename);

        if let Some(year) = self.filename_years.get(base) {
            return Some(YearResolution {
                year: *year,
                source: YearSource::FilenameMap,
            });
        }

        let year: FiscalYear = FILENAME_YEAR.find(base)?.as_str().parse().ok()?;
        self.range.contains(&year).then_some(YearResolution {
            year,
            source: YearSource::FilenameToken,
        })
    }

    /// Resolve from page texts. Patterns are tried in order; within the first
    /// pattern that yields years, the most frequent year wins and ties go to
    /// the earliest year.
    pub fn from_content(&self, pages: &[String]) -> Option<FiscalYear> {
        let text: String = pages
            .iter()
            .take(self.scan_pages)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("");

        for pattern in CONTENT_YEAR_PATTERNS.iter() {
            let years: Vec<FiscalYear> = pattern
                .captures_iter(&text)
                .filter_map(|caps| format!("20{}", &caps[1]).parse().ok())
                .filter(|y| self.range.contains(y))
                .collect();
            if let Some(year) = most_frequent(&years) {
                return Some(year);
            }
        }

        let bare: Vec<FiscalYear> = DIGIT_RUN
            .find_iter(&text)
            .filter(|m| m.as_str().len() == 4)
            .filter_map(|m| m.as_str().parse().ok())
            .filter(|y| self.range.contains(y))
            .collect();
        most_frequent(&bare)
    }

    /// Resolve through the full priority chain. `pages` is only called when
    /// the filename paths fail.
    pub fn resolve<F>(&self, filename: &str, pages: F) -> Option<YearResolution>
    where
        F: FnOnce() -> Option<Vec<String>>,
    {
        if let Some(resolution) = self.from_filename(filename) {
            debug!("Year {} resolved from filename {}", resolution.year, filename);
            return Some(resolution);
        }

        if let Some(year) = pages().and_then(|p| self.from_content(&p)) {
            debug!("Year {} resolved from content of {}", year, filename);
            return Some(YearResolution {
                year,
                source: YearSource::Content,
            });
        }

        warn!("Could not determine year for {}", filename);
        None
    }
}

fn most_frequent(years: &[FiscalYear]) -> Option<FiscalYear> {
    let mut counts: BTreeMap<FiscalYear, usize> = BTreeMap::new();
    for year in years {
        *counts.entry(*year).or_default() += 1;
    }
    // BTreeMap iterates ascending, so the first maximum is the earliest year.
    counts
        .into_iter()
        .fold(None, |best: Option<(FiscalYear, usize)>, (year, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((year, count)),
        })
        .map(|(year, _)| year)
}

/// Finds every fiscal year mentioned in a table's cells.
#[derive(Debug, Clone)]
pub struct TableYearResolver {
    range: RangeInclusive<FiscalYear>,
}

impl TableYearResolver {
    pub fn new(range: RangeInclusive<FiscalYear>) -> Self {
        Self { range }
    }

    /// Build from pipeline configuration.
    pub fn from_config(config: &ArepConfig) -> Self {
        Self::new(config.years.table_year_min..=config.years.table_year_max)
    }

    /// Years in one cell: full years, bare two-digit years, and the ending
    /// year of ranges such as `2020/21`.
    pub fn years_in_cell(&self, cell: &str) -> BTreeSet<FiscalYear> {
        let mut years = BTreeSet::new();

        for caps in CELL_YEAR_FULL.captures_iter(cell) {
            years.insert(2000 + two_digits(&caps[1]));
        }
        for caps in CELL_YEAR_SHORT.captures_iter(cell) {
            years.insert(2000 + two_digits(&caps[1]));
        }
        for caps in CELL_YEAR_RANGE.captures_iter(cell) {
            years.insert(2000 + two_digits(&caps[2]));
        }

        years.retain(|y| self.range.contains(y));
        years
    }

    /// Years across every cell of a table, header included.
    pub fn years_in_table(&self, table: &RawTable) -> BTreeSet<FiscalYear> {
        table
            .cells()
            .flat_map(|cell| self.years_in_cell(cell))
            .collect()
    }
}

impl Default for TableYearResolver {
    fn default() -> Self {
        Self::new(2019..=2024)
    }
}

fn two_digits(s: &str) -> FiscalYear {
    s.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> DocumentYearResolver {
        DocumentYearResolver::from_config(&ArepConfig::default())
    }

    fn pages(text: &str) -> Option<Vec<String>> {
        Some(vec![text.to_string()])
    }

    #[test]
    fn test_filename_lookup() {
        let resolution = resolver().from_filename("data/508_1621849083921.pdf").unwrap();
        assert_eq!(resolution.year, 2021);
        assert_eq!(resolution.source, YearSource::FilenameMap);
    }

    #[test]
    fn test_filename_token() {
        let resolution = resolver().from_filename("annual_report_2022.pdf").unwrap();
        assert_eq!(resolution.year, 2022);
        assert_eq!(resolution.source, YearSource::FilenameToken);

        assert!(resolver().from_filename("annual_report_2018.pdf").is_none());
    }

    #[test]
    fn test_content_prefers_dated_patterns() {
        let text = "Printed 2019. Annual report for the year ended March 31, 2021 and March 31, 2021";
        assert_eq!(resolver().from_content(&pages(text).unwrap()), Some(2021));
    }

    #[test]
    fn test_content_most_frequent_and_ties() {
        let text = "FY 2020 results, FY 2021 outlook, FY 2021 guidance";
        assert_eq!(resolver().from_content(&pages(text).unwrap()), Some(2021));

        let tie = "Q1 2022 and Q3 2020";
        assert_eq!(resolver().from_content(&pages(tie).unwrap()), Some(2020));
    }

    #[test]
    fn test_content_bare_year_requires_four_digit_run() {
        assert_eq!(resolver().from_content(&pages("ref 120201 only").unwrap()), None);
        assert_eq!(resolver().from_content(&pages("copyright 2023").unwrap()), Some(2023));
    }

    #[test]
    fn test_content_only_scans_leading_pages() {
        let resolver = resolver().with_scan_pages(1);
        let pages = vec!["no year here".to_string(), "FY 2022".to_string()];
        assert_eq!(resolver.from_content(&pages), None);
    }

    #[test]
    fn test_resolve_chain() {
        let resolver = resolver();
        let resolution = resolver
            .resolve("unknown.pdf", || pages("Year Ended 2020"))
            .unwrap();
        assert_eq!(resolution, YearResolution { year: 2020, source: YearSource::Content });

        assert!(resolver.resolve("unknown.pdf", || None).is_none());
    }

    #[test]
    fn test_table_cell_years() {
        let resolver = TableYearResolver::default();

        assert_eq!(resolver.years_in_cell("31 Mar 2021"), BTreeSet::from([2021]));
        assert_eq!(resolver.years_in_cell("2020/21"), BTreeSet::from([2020, 2021]));
        assert_eq!(resolver.years_in_cell("FY 23"), BTreeSet::from([2023]));
        assert!(resolver.years_in_cell("2018").is_empty());
        assert!(resolver.years_in_cell("Revenue").is_empty());
    }

    #[test]
    fn test_table_years_scans_all_cells() {
        let table = RawTable::from_cells(
            "a.pdf",
            &["Rs. Mn", "2022", "2021"],
            &[&["Revenue", "100", "90"]],
        );
        let years = TableYearResolver::default().years_in_table(&table);
        assert_eq!(years, BTreeSet::from([2021, 2022]));
    }
}
