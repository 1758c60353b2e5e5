//! End-to-end orchestration over in-memory document sources.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use arep_core::error::{ArepError, Result};
use arep_core::{
    ArepConfig, ExtractionOrchestrator, Metric, RawTable, ScaleTag, TableSource, TextSource,
};

#[derive(Default)]
struct FakeDocuments {
    pages: HashMap<String, Vec<String>>,
    tables: HashMap<String, Vec<RawTable>>,
    /// Documents whose every read fails.
    failing: HashSet<String>,
}

impl FakeDocuments {
    fn check(&self, path: &Path) -> Result<String> {
        let name = name_of(path);
        if self.failing.contains(&name) {
            return Err(ArepError::Config(format!("corrupt document {}", name)));
        }
        Ok(name)
    }
}

fn name_of(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

impl TextSource for FakeDocuments {
    fn pages(&self, path: &Path) -> Result<Vec<String>> {
        let name = self.check(path)?;
        self.pages
            .get(&name)
            .cloned()
            .ok_or_else(|| ArepError::Config(format!("no pages for {}", path.display())))
    }
}

impl TableSource for FakeDocuments {
    fn tables(&self, path: &Path) -> Result<Vec<RawTable>> {
        let name = self.check(path)?;
        Ok(self.tables.get(&name).cloned().unwrap_or_default())
    }
}

fn shareholder_page() -> String {
    let mut text = String::from("Investor Information\nTop Twenty Shareholders of the Company\n");
    text.push_str("Name 31.03.2021 % 31.03.2020 %\n");
    for i in 1..=20 {
        text.push_str(&format!("Holder {} Ltd {},000,000 {}.50\n", i, 30 - i, 21 - i));
    }
    text
}

fn documents() -> FakeDocuments {
    let mut docs = FakeDocuments::default();

    docs.pages.insert("a.pdf".to_string(), vec![String::new()]);
    docs.tables.insert(
        "a.pdf".to_string(),
        vec![
            RawTable::from_cells(
                "a.pdf",
                &["Rs. Mn", "2020", "2019"],
                &[
                    &["Revenue", "12,345", "11,000"],
                    &["Cost of sales", "9,000", "8,100"],
                    &["Earnings per share", "4.50", "3.90"],
                ],
            ),
            RawTable::from_cells(
                "a.pdf",
                &[],
                &[
                    &["Top Twenty Shareholders"],
                    &["Shareholder", "No. of shares", "Holding %"],
                    &["A Holdings", "5,000", "12.5%"],
                    &["C Fund", "3,000", "0.75"],
                ],
            ),
        ],
    );

    docs.pages.insert(
        "b.pdf".to_string(),
        vec!["Annual Report 2021".to_string(), shareholder_page()],
    );
    docs.tables.insert(
        "b.pdf".to_string(),
        vec![
            RawTable::from_cells(
                "b.pdf",
                &["Rs. Mn", "2021", "2020"],
                &[&["Revenue", "13.1", "12.3"], &["Cost of sales", "9.2", "9.0"]],
            ),
            RawTable::from_cells(
                "b.pdf",
                &["Rights issue", "Details"],
                &[&["Ratio", "1 for 5"], &["Price per share", "Rs. 12.00"]],
            ),
        ],
    );

    docs
}

fn config() -> ArepConfig {
    let mut config = ArepConfig::default();
    config.years.first_year = 2020;
    config.years.last_year = 2021;
    config.documents.year_documents = BTreeMap::from([
        (2020, vec!["a.pdf".to_string(), "b.pdf".to_string()]),
        (2021, vec!["b.pdf".to_string()]),
    ]);
    config.documents.shareholder_years = BTreeMap::from([("b.pdf".to_string(), (2021, 2020))]);
    config
}

fn run_over(docs: &FakeDocuments, config: ArepConfig) -> arep_core::ExtractionOutput {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    ExtractionOrchestrator::new(config, docs, docs).run(dir.path())
}

fn run() -> arep_core::ExtractionOutput {
    run_over(&documents(), config())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9 * b.abs().max(1.0)
}

#[test]
fn test_metrics_reconciled_across_documents() {
    let output = run();
    assert_eq!(output.metrics.len(), 2);

    let y2020 = &output.metrics[0];
    assert_eq!(y2020.year, 2020);
    assert!(close(y2020.get(Metric::TotalRevenue).unwrap(), 12.345));
    assert_eq!(y2020.scale(Metric::TotalRevenue), Some(ScaleTag::Mn));
    assert_eq!(y2020.provenance[&Metric::TotalRevenue].document, "a.pdf");
    assert!(close(y2020.get(Metric::CostOfSales).unwrap(), 9.0));
    assert!(close(y2020.get(Metric::Eps).unwrap(), 4.5));

    let margin = y2020.gross_profit_margin.unwrap();
    assert!(close(margin, (12.345 - 9.0) / 12.345 * 100.0));
    assert!(close(y2020.usd_values[&Metric::TotalRevenue], 12.345 / 185.52));
    assert_eq!(y2020.events.as_deref(), Some("COVID-19 Pandemic Impact"));

    let y2021 = &output.metrics[1];
    assert_eq!(y2021.year, 2021);
    assert!(close(y2021.get(Metric::TotalRevenue).unwrap(), 13.1));
    assert!(y2021.get(Metric::Eps).is_none());
    assert_eq!(y2021.provenance[&Metric::CostOfSales].document, "b.pdf");
}

#[test]
fn test_text_shareholders_take_precedence_over_tables() {
    let output = run();

    let y2021 = output.shareholders_for(2021);
    assert_eq!(y2021.len(), 20);
    assert_eq!(y2021[0].shareholder_name, "Holder 1 Ltd");
    assert_eq!(y2021[19].rank, 20);

    // the text block has a single percentage column, so 2020 comes from the table
    let y2020 = output.shareholders_for(2020);
    let names: Vec<&str> = y2020.iter().map(|s| s.shareholder_name.as_str()).collect();
    assert_eq!(names, vec!["A Holdings", "C Fund"]);
    assert_eq!(output.shareholder_years(), vec![2020, 2021]);
}

#[test]
fn test_rights_issues_accumulate_per_year() {
    let output = run();

    let years: Vec<i32> = output.rights_issues.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2020, 2020, 2021, 2021]);
    assert_eq!(output.rights_issues[0].ratio, "1:5");
    assert_eq!(output.rights_issues[1].issue_price, Some(12.0));
}

#[test]
fn test_flat_metric_rows() {
    let output = run();
    let (columns, rows) = output.metric_rows();

    assert_eq!(columns[0], "year");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.len() == columns.len()));

    let scale_idx = columns
        .iter()
        .position(|c| c == "total_revenue_lkr_scale")
        .unwrap();
    assert_eq!(rows[0][scale_idx], "Mn");
}

#[test]
fn test_failing_document_does_not_abort_others() {
    let mut docs = documents();
    docs.failing.insert("c.pdf".to_string());
    docs.tables.insert(
        "c.pdf".to_string(),
        vec![RawTable::from_cells("c.pdf", &["Rs. Mn", "2020"], &[&["Revenue", "99,999"]])],
    );

    let mut config = config();
    config.documents.year_documents = BTreeMap::from([
        (2020, vec!["c.pdf".to_string(), "a.pdf".to_string(), "b.pdf".to_string()]),
        (2021, vec!["b.pdf".to_string(), "c.pdf".to_string()]),
    ]);
    config.documents.shareholder_years.insert("c.pdf".to_string(), (2020, 2019));

    let output = run_over(&docs, config);

    assert_eq!(output.metrics.len(), 2);
    let y2020 = &output.metrics[0];
    assert!(close(y2020.get(Metric::TotalRevenue).unwrap(), 12.345));
    assert_eq!(y2020.provenance[&Metric::TotalRevenue].document, "a.pdf");
    assert!(close(output.metrics[1].get(Metric::TotalRevenue).unwrap(), 13.1));

    assert_eq!(output.shareholders_for(2021).len(), 20);
    let names: Vec<&str> = output
        .shareholders_for(2020)
        .iter()
        .map(|s| s.shareholder_name.as_str())
        .collect();
    assert_eq!(names, vec!["A Holdings", "C Fund"]);

    let years: Vec<i32> = output.rights_issues.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2020, 2020, 2021, 2021]);
}
