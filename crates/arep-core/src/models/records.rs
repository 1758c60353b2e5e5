//! Extracted record types and their flat row export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ending calendar year of a fiscal period (the 2019/20 report is 2020).
pub type FiscalYear = i32;

/// Headline metrics located in report tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalRevenue,
    CostOfSales,
    OperatingExpenses,
    NetProfit,
    ShareCount,
    Eps,
    NetAssetPerShare,
}

impl Metric {
    /// All metrics in location order.
    pub const ALL: [Metric; 7] = [
        Metric::TotalRevenue,
        Metric::CostOfSales,
        Metric::OperatingExpenses,
        Metric::NetProfit,
        Metric::ShareCount,
        Metric::Eps,
        Metric::NetAssetPerShare,
    ];

    /// Output column name.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::TotalRevenue => "total_revenue_lkr",
            Metric::CostOfSales => "cost_of_sales_lkr",
            Metric::OperatingExpenses => "operating_expenses_lkr",
            Metric::NetProfit => "net_profit_lkr",
            Metric::ShareCount => "share_count",
            Metric::Eps => "eps_lkr",
            Metric::NetAssetPerShare => "net_asset_per_share_lkr",
        }
    }

    /// Column name of the USD counterpart, for LKR-denominated metrics.
    pub fn usd_column(&self) -> Option<&'static str> {
        match self {
            Metric::TotalRevenue => Some("total_revenue_usd"),
            Metric::CostOfSales => Some("cost_of_sales_usd"),
            Metric::OperatingExpenses => Some("operating_expenses_usd"),
            Metric::NetProfit => Some("net_profit_usd"),
            Metric::ShareCount => None,
            Metric::Eps => Some("eps_usd"),
            Metric::NetAssetPerShare => Some("net_asset_per_share_usd"),
        }
    }

    /// Whether the metric is an LKR amount.
    pub fn is_lkr(&self) -> bool {
        self.usd_column().is_some()
    }

    /// Row keywords that identify the metric.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Metric::TotalRevenue => &[
                "total revenue",
                "group revenue",
                "revenue",
                "total income",
                "turnover",
                "gross revenue",
                "sales revenue",
                "operating revenue",
                "sales",
                "income",
            ],
            Metric::CostOfSales => &[
                "cost of sales",
                "cost of goods sold",
                "cost of revenue",
                "direct costs",
                "cost of services",
                "cost of products sold",
                "cost of sales and services",
            ],
            Metric::OperatingExpenses => &[
                "operating expenses",
                "operating costs",
                "administrative expenses",
                "admin expenses",
                "selling and distribution",
                "general and administrative",
                "other operating expenses",
                "overhead expenses",
            ],
            Metric::NetProfit => &[
                "profit after tax",
                "net profit",
                "profit for the year",
                "profit attributable",
                "net income",
                "profit after taxation",
                "profit after income tax",
            ],
            Metric::ShareCount => &[
                "number of shares",
                "total shares",
                "shares in issue",
                "ordinary shares",
                "issued shares",
                "outstanding shares",
                "total number of shares",
            ],
            Metric::Eps => &[
                "earnings per share",
                "basic eps",
                "diluted eps",
                "eps",
                "profit per share",
                "net profit per share",
                "earnings per ordinary share",
            ],
            Metric::NetAssetPerShare => &[
                "net asset value per share",
                "nav per share",
                "net assets per share",
                "net asset per share",
                "book value per share",
                "net assets per ordinary share",
            ],
        }
    }

    /// Scale tag assumed for candidates of this metric when none is inferred
    /// from magnitude. Only LKR amounts are inferred.
    pub fn default_scale(&self) -> Option<ScaleTag> {
        if self.is_lkr() { None } else { Some(ScaleTag::Mn) }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Unit multiplier annotation for a monetary figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScaleTag {
    #[serde(rename = "Mn")]
    Mn,
    #[serde(rename = "Bn")]
    Bn,
    #[serde(rename = "K")]
    K,
    #[serde(rename = "")]
    Unscaled,
}

impl ScaleTag {
    /// Tie-break order when tallying tags; earlier wins.
    pub const PREFERENCE: [ScaleTag; 4] =
        [ScaleTag::Mn, ScaleTag::Bn, ScaleTag::K, ScaleTag::Unscaled];

    /// Underlying multiplier of the tag.
    pub fn multiplier(&self) -> f64 {
        match self {
            ScaleTag::Mn => 1e6,
            ScaleTag::Bn => 1e9,
            ScaleTag::K => 1e3,
            ScaleTag::Unscaled => 1.0,
        }
    }

    /// Tag label as written in output columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleTag::Mn => "Mn",
            ScaleTag::Bn => "Bn",
            ScaleTag::K => "K",
            ScaleTag::Unscaled => "",
        }
    }

    /// Guess a tag from the magnitude of an untagged value.
    pub fn infer(value: f64) -> Self {
        if value < 1.0 {
            ScaleTag::Bn
        } else if value > 1000.0 {
            ScaleTag::K
        } else {
            ScaleTag::Mn
        }
    }
}

impl fmt::Display for ScaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a located value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Source document name.
    pub document: String,
    /// Table index within the document.
    pub table: usize,
    /// Row index within the table.
    pub row: usize,
}

/// Metrics resolved for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Fiscal year.
    pub year: FiscalYear,

    /// Resolved values, in the unit of their scale tag.
    pub values: BTreeMap<Metric, f64>,

    /// Chosen scale tag per resolved value.
    pub scales: BTreeMap<Metric, ScaleTag>,

    /// Source of each resolved value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provenance: BTreeMap<Metric, Provenance>,

    /// USD counterparts of LKR values, same scale as their source.
    #[serde(default)]
    pub usd_values: BTreeMap<Metric, f64>,

    /// Gross profit margin in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_profit_margin: Option<f64>,

    /// Descriptive macro event label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<String>,
}

impl MetricRecord {
    /// Create an empty record for a year.
    pub fn new(year: FiscalYear) -> Self {
        Self {
            year,
            values: BTreeMap::new(),
            scales: BTreeMap::new(),
            provenance: BTreeMap::new(),
            usd_values: BTreeMap::new(),
            gross_profit_margin: None,
            events: None,
        }
    }

    /// Value of a metric in its scale unit.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    /// Scale tag of a metric.
    pub fn scale(&self, metric: Metric) -> Option<ScaleTag> {
        self.scales.get(&metric).copied()
    }

    /// Value of a metric multiplied out by its scale tag.
    pub fn absolute(&self, metric: Metric) -> Option<f64> {
        let value = self.get(metric)?;
        let scale = self.scale(metric).unwrap_or(ScaleTag::Unscaled);
        Some(value * scale.multiplier())
    }

    /// Set a metric unless it already holds a value. Returns whether it was set.
    pub fn set_if_absent(
        &mut self,
        metric: Metric,
        value: f64,
        scale: ScaleTag,
        provenance: Option<Provenance>,
    ) -> bool {
        if self.values.contains_key(&metric) {
            return false;
        }
        self.values.insert(metric, value);
        self.scales.insert(metric, scale);
        if let Some(provenance) = provenance {
            self.provenance.insert(metric, provenance);
        }
        true
    }

    /// Whether no metric was resolved.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Header of the flat metrics table.
    pub fn columns() -> Vec<String> {
        let mut columns = vec!["year".to_string()];
        for metric in Metric::ALL {
            columns.push(metric.column().to_string());
            columns.push(format!("{}_scale", metric.column()));
            if let Some(usd) = metric.usd_column() {
                columns.push(usd.to_string());
                columns.push(format!("{}_scale", usd));
            }
        }
        columns.push("gross_profit_margin".to_string());
        columns.push("events".to_string());
        columns
    }

    /// Flat row matching [`MetricRecord::columns`]; missing values are empty.
    pub fn to_row(&self) -> Vec<String> {
        fn cell(value: Option<f64>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }
        fn tag(scale: Option<ScaleTag>) -> String {
            scale.map(|s| s.as_str().to_string()).unwrap_or_default()
        }

        let mut row = vec![self.year.to_string()];
        for metric in Metric::ALL {
            let scale = self.get(metric).and(self.scale(metric));
            row.push(cell(self.get(metric)));
            row.push(tag(scale));
            if metric.is_lkr() {
                let usd = self.usd_values.get(&metric).copied();
                row.push(cell(usd));
                row.push(tag(usd.and(scale)));
            }
        }
        row.push(cell(self.gross_profit_margin));
        row.push(self.events.clone().unwrap_or_default());
        row
    }
}

/// One entry of a top-twenty shareholder list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareholderRecord {
    pub year: FiscalYear,
    pub rank: usize,
    pub shareholder_name: String,
    pub ownership_percentage: f64,
}

/// A detected rights issue event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RightsIssueRecord {
    pub year: FiscalYear,
    /// `X:Y` ratio, empty when only a price was found.
    pub ratio: String,
    pub issue_price: Option<f64>,
}

/// The three finalized record collections of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// When the run finished.
    pub generated_at: DateTime<Utc>,
    /// One record per fiscal year, ascending.
    pub metrics: Vec<MetricRecord>,
    /// Ranked shareholders, ordered by year then rank.
    pub shareholders: Vec<ShareholderRecord>,
    /// Rights issues, ordered by year.
    pub rights_issues: Vec<RightsIssueRecord>,
}

impl ExtractionOutput {
    /// Metrics as a header plus flat rows.
    pub fn metric_rows(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let rows = self.metrics.iter().map(MetricRecord::to_row).collect();
        (MetricRecord::columns(), rows)
    }

    /// Shareholders of one year, in rank order.
    pub fn shareholders_for(&self, year: FiscalYear) -> Vec<&ShareholderRecord> {
        self.shareholders.iter().filter(|s| s.year == year).collect()
    }

    /// Years that have at least one shareholder record.
    pub fn shareholder_years(&self) -> Vec<FiscalYear> {
        let mut years: Vec<FiscalYear> = self.shareholders.iter().map(|s| s.year).collect();
        years.dedup();
        years
    }
}
