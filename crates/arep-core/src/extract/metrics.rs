//! Keyword-driven metric location inside raw tables.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::config::ArepConfig;
use crate::models::records::{FiscalYear, Metric, MetricRecord, Provenance};
use crate::models::table::RawTable;

use super::rules::{
    row_scale_multiplier, NumericNormalizer, ScaleCandidate, ScaleReconciler, TableYearResolver,
};

/// Default number of cells scanned on each side of a keyword cell.
pub const DEFAULT_SEARCH_RADIUS: usize = 3;

/// A metric value found in one table.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedValue {
    /// Cell value times the row's scale hint.
    pub value: f64,
    /// Scale hint multiplier applied.
    pub row_multiplier: f64,
    /// Row index, header counted as row 0 when present.
    pub row: usize,
}

/// Candidates gathered per year and metric, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct MetricCandidates {
    by_year: BTreeMap<FiscalYear, BTreeMap<Metric, Vec<ScaleCandidate>>>,
}

impl MetricCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate.
    pub fn push(&mut self, year: FiscalYear, metric: Metric, candidate: ScaleCandidate) {
        self.by_year
            .entry(year)
            .or_default()
            .entry(metric)
            .or_default()
            .push(candidate);
    }

    /// Append another set after this one, preserving order.
    pub fn extend(&mut self, other: MetricCandidates) {
        for (year, metrics) in other.by_year {
            for (metric, candidates) in metrics {
                self.by_year
                    .entry(year)
                    .or_default()
                    .entry(metric)
                    .or_default()
                    .extend(candidates);
            }
        }
    }

    /// Candidates of one metric/year.
    pub fn get(&self, year: FiscalYear, metric: Metric) -> &[ScaleCandidate] {
        self.by_year
            .get(&year)
            .and_then(|m| m.get(&metric))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Years with at least one candidate.
    pub fn years(&self) -> impl Iterator<Item = FiscalYear> + '_ {
        self.by_year.keys().copied()
    }

    /// Build a fresh record for `year` by reconciling each metric's candidates.
    pub fn reconcile(&self, year: FiscalYear, reconciler: &ScaleReconciler) -> MetricRecord {
        let mut record = MetricRecord::new(year);
        let Some(metrics) = self.by_year.get(&year) else {
            return record;
        };

        for (metric, candidates) in metrics {
            if let Some(resolved) = reconciler.reconcile(candidates) {
                debug!(
                    "{} {}: {} {} from {} candidates",
                    year, metric, resolved.value, resolved.scale, resolved.candidates
                );
                record.set_if_absent(*metric, resolved.value, resolved.scale, resolved.provenance);
            }
        }
        record
    }
}

/// Scans table rows for metric keywords and picks nearby numbers.
#[derive(Debug, Clone)]
pub struct MetricLocator {
    radius: usize,
    normalizer: NumericNormalizer,
    table_years: TableYearResolver,
}

impl MetricLocator {
    pub fn new() -> Self {
        Self {
            radius: DEFAULT_SEARCH_RADIUS,
            normalizer: NumericNormalizer::new(),
            table_years: TableYearResolver::default(),
        }
    }

    /// Build from pipeline configuration.
    pub fn from_config(config: &ArepConfig) -> Self {
        Self {
            radius: config.extraction.search_radius,
            normalizer: NumericNormalizer::new()
                .with_max_magnitude(config.extraction.max_magnitude),
            table_years: TableYearResolver::from_config(config),
        }
    }

    /// Set the column search radius.
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// First number near a keyword cell of `row`. Each matching cell is tried
    /// in turn: forward from the keyword cell itself through `radius` cells,
    /// then backward through `radius` preceding cells.
    pub fn find_value_in_row(&self, row: &[String], keywords: &[&str]) -> Option<f64> {
        let row_text = row.join(" ").to_lowercase();
        if !keywords.iter().any(|k| row_text.contains(k)) {
            return None;
        }

        for (i, cell) in row.iter().enumerate() {
            let cell_lower = cell.trim().to_lowercase();
            if !keywords.iter().any(|k| cell_lower.contains(k)) {
                continue;
            }

            let forward_end = (i + self.radius + 1).min(row.len());
            if let Some(value) = row[i..forward_end]
                .iter()
                .find_map(|c| self.normalizer.clean(c))
            {
                return Some(value);
            }

            let backward_start = i.saturating_sub(self.radius);
            if let Some(value) = row[backward_start..i]
                .iter()
                .rev()
                .find_map(|c| self.normalizer.clean(c))
            {
                return Some(value);
            }
        }

        None
    }

    /// Locate every metric in one table; the first hit per metric wins.
    pub fn locate(&self, table: &RawTable) -> BTreeMap<Metric, LocatedValue> {
        let mut found = BTreeMap::new();

        for (row_idx, row) in table.all_rows().enumerate() {
            let row_text = row.join(" ").to_lowercase();
            let row_multiplier = row_scale_multiplier(&row_text);

            for metric in Metric::ALL {
                if found.contains_key(&metric) {
                    continue;
                }
                if let Some(value) = self.find_value_in_row(row, metric.keywords()) {
                    debug!("Found {}: {} (scale: {})", metric, value, row_multiplier);
                    found.insert(
                        metric,
                        LocatedValue {
                            value: value * row_multiplier,
                            row_multiplier,
                            row: row_idx,
                        },
                    );
                }
            }
        }

        found
    }

    /// Gather candidates from one document's tables. Each table's values are
    /// filed under every year the table mentions, or under `main_year` when it
    /// mentions none.
    pub fn collect(
        &self,
        document: &str,
        tables: &[RawTable],
        main_year: Option<FiscalYear>,
    ) -> MetricCandidates {
        let mut candidates = MetricCandidates::new();

        for (table_idx, table) in tables.iter().enumerate() {
            let mut years = self.table_years.years_in_table(table);
            if years.is_empty() {
                match main_year {
                    Some(year) => {
                        years.insert(year);
                    }
                    None => continue,
                }
            }

            let located = self.locate(table);
            if located.is_empty() {
                continue;
            }

            for year in &years {
                for (metric, hit) in &located {
                    if hit.value < 0.0 {
                        continue;
                    }
                    let candidate = ScaleCandidate::new(hit.value, metric.default_scale())
                        .with_provenance(Provenance {
                            document: document.to_string(),
                            table: table_idx,
                            row: hit.row,
                        });
                    candidates.push(*year, *metric, candidate);
                }
            }
        }

        candidates
    }
}

impl Default for MetricLocator {
    fn default() -> Self {
        Self::new()
    }
}
