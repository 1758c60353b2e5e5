//! Per-year orchestration over overlapping annual reports.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::models::config::ArepConfig;
use crate::models::records::{
    ExtractionOutput, FiscalYear, MetricRecord, RightsIssueRecord, ShareholderRecord,
};
use crate::models::table::RawTable;
use crate::pdf::{document_name, TableSource, TextSource};

use super::derived::DerivedMetricsCalculator;
use super::metrics::{MetricCandidates, MetricLocator};
use super::rights::RightsIssueExtractor;
use super::rules::{DocumentYearResolver, ScaleReconciler};
use super::shareholders::ShareholderExtractor;

/// Fiscal year to the ordered documents covering it.
pub type ExtractionPlan = BTreeMap<FiscalYear, Vec<PathBuf>>;

/// Runs every extractor over a directory of annual reports.
pub struct ExtractionOrchestrator<T, B> {
    config: ArepConfig,
    text: T,
    tables: B,
    year_resolver: DocumentYearResolver,
    locator: MetricLocator,
    reconciler: ScaleReconciler,
    derived: DerivedMetricsCalculator,
    shareholders: ShareholderExtractor,
    rights: RightsIssueExtractor,
}

/// Page text and tables of each document, read at most once per run.
struct DocumentCache<'a, T, B> {
    text: &'a T,
    tables: &'a B,
    pages: HashMap<PathBuf, Option<Vec<String>>>,
    grids: HashMap<PathBuf, Option<Vec<RawTable>>>,
}

impl<'a, T: TextSource, B: TableSource> DocumentCache<'a, T, B> {
    fn new(text: &'a T, tables: &'a B) -> Self {
        Self {
            text,
            tables,
            pages: HashMap::new(),
            grids: HashMap::new(),
        }
    }

    fn pages(&mut self, path: &Path) -> Option<&[String]> {
        let text = self.text;
        self.pages
            .entry(path.to_path_buf())
            .or_insert_with(|| match text.pages(path) {
                Ok(pages) => Some(pages),
                Err(e) => {
                    warn!("Failed to read text of {}: {}", path.display(), e);
                    None
                }
            })
            .as_deref()
    }

    fn tables(&mut self, path: &Path) -> Option<&[RawTable]> {
        let tables = self.tables;
        self.grids
            .entry(path.to_path_buf())
            .or_insert_with(|| match tables.tables(path) {
                Ok(grids) => {
                    debug!("{} tables in {}", grids.len(), path.display());
                    Some(grids)
                }
                Err(e) => {
                    warn!("Failed to read tables of {}: {}", path.display(), e);
                    None
                }
            })
            .as_deref()
    }
}

impl<T: TextSource, B: TableSource> ExtractionOrchestrator<T, B> {
    /// Create an orchestrator with its collaborators.
    pub fn new(config: ArepConfig, text: T, tables: B) -> Self {
        for issue in config.validate() {
            warn!("Configuration: {}", issue);
        }
        Self {
            year_resolver: DocumentYearResolver::from_config(&config),
            locator: MetricLocator::from_config(&config),
            reconciler: ScaleReconciler::new(),
            derived: DerivedMetricsCalculator::from_config(&config),
            shareholders: ShareholderExtractor::from_config(&config),
            rights: RightsIssueExtractor::new(),
            config,
            text,
            tables,
        }
    }

    pub fn config(&self) -> &ArepConfig {
        &self.config
    }

    /// Documents covering each fiscal year. Uses the configured mapping when
    /// present; otherwise year Y takes the document resolving to Y followed by
    /// the one resolving to Y + 1.
    pub fn plan(&self, dir: &Path) -> ExtractionPlan {
        let mut cache = DocumentCache::new(&self.text, &self.tables);
        self.plan_with(dir, &mut cache)
    }

    fn plan_with(&self, dir: &Path, cache: &mut DocumentCache<'_, T, B>) -> ExtractionPlan {
        let mut plan = ExtractionPlan::new();

        if !self.config.documents.year_documents.is_empty() {
            for (year, names) in &self.config.documents.year_documents {
                let paths: Vec<PathBuf> = names
                    .iter()
                    .map(|name| dir.join(name))
                    .filter(|path| {
                        let exists = path.is_file();
                        if !exists {
                            warn!("Document {} for {} not found", path.display(), year);
                        }
                        exists
                    })
                    .collect();
                plan.insert(*year, paths);
            }
            return plan;
        }

        let mut by_year: BTreeMap<FiscalYear, PathBuf> = BTreeMap::new();
        for path in list_documents(dir) {
            let name = document_name(&path);
            let resolution = self
                .year_resolver
                .resolve(&name, || cache.pages(&path).map(<[String]>::to_vec));
            if let Some(resolution) = resolution {
                by_year.entry(resolution.year).or_insert(path);
            }
        }

        for year in self.config.years.fiscal_years() {
            let paths: Vec<PathBuf> = [year, year + 1]
                .iter()
                .filter_map(|y| by_year.get(y).cloned())
                .collect();
            plan.insert(year, paths);
        }
        plan
    }

    /// Extract everything under `dir`.
    pub fn run(&self, dir: &Path) -> ExtractionOutput {
        self.run_with_progress(dir, |_| {})
    }

    /// Extract everything under `dir`, calling `on_year` after each fiscal year.
    pub fn run_with_progress<F>(&self, dir: &Path, mut on_year: F) -> ExtractionOutput
    where
        F: FnMut(FiscalYear),
    {
        let mut cache = DocumentCache::new(&self.text, &self.tables);
        let plan = self.plan_with(dir, &mut cache);

        let mut metrics: BTreeMap<FiscalYear, MetricRecord> = BTreeMap::new();
        let mut table_holders: Vec<ShareholderRecord> = Vec::new();
        let mut rights_issues: Vec<RightsIssueRecord> = Vec::new();

        for year in self.config.years.fiscal_years() {
            let documents = plan.get(&year).map(Vec::as_slice).unwrap_or_default();
            info!("Extracting {} from {} documents", year, documents.len());

            let mut candidates = MetricCandidates::new();
            let mut year_tables: Vec<RawTable> = Vec::new();
            for path in documents {
                let Some(tables) = cache.tables(path) else {
                    continue;
                };
                candidates.extend(self.locator.collect(&document_name(path), tables, Some(year)));
                year_tables.extend_from_slice(tables);
            }

            let record = self.derived.apply(candidates.reconcile(year, &self.reconciler));
            if !record.is_empty() {
                metrics.insert(year, record);
            }

            table_holders.extend(self.shareholders.extract_from_tables(&year_tables, year));
            rights_issues.extend(self.rights.extract(&year_tables, year));
            on_year(year);
        }

        let text_holders = self.text_shareholders(&plan, &mut cache);
        let text_years: BTreeSet<FiscalYear> = text_holders.iter().map(|s| s.year).collect();
        let fiscal_years: BTreeSet<FiscalYear> = self.config.years.fiscal_years().collect();

        let shareholders = self.shareholders.finalize(
            text_holders
                .into_iter()
                .chain(table_holders.into_iter().filter(|s| !text_years.contains(&s.year)))
                .filter(|s| fiscal_years.contains(&s.year))
                .collect(),
        );

        rights_issues.sort_by_key(|r| r.year);

        info!(
            "Extracted {} metric years, {} shareholders, {} rights issues",
            metrics.len(),
            shareholders.len(),
            rights_issues.len()
        );

        ExtractionOutput {
            generated_at: Utc::now(),
            metrics: metrics.into_values().collect(),
            shareholders,
            rights_issues,
        }
    }

    /// Shareholder blocks read from the text of the planned documents. Each
    /// year keeps the block of the first document supplying it, in plan order.
    fn text_shareholders(
        &self,
        plan: &ExtractionPlan,
        cache: &mut DocumentCache<'_, T, B>,
    ) -> Vec<ShareholderRecord> {
        let mut visited: HashSet<&PathBuf> = HashSet::new();
        let mut blocks: BTreeMap<FiscalYear, (String, Vec<ShareholderRecord>)> = BTreeMap::new();

        for path in plan.values().flatten() {
            if !visited.insert(path) {
                continue;
            }
            let name = document_name(path);
            let years = match self.config.documents.shareholder_years.get(&name) {
                Some(years) => *years,
                None => {
                    let resolved = self
                        .year_resolver
                        .resolve(&name, || cache.pages(path).map(<[String]>::to_vec));
                    match resolved {
                        Some(r) => (r.year, r.year - 1),
                        None => continue,
                    }
                }
            };

            let Some(pages) = cache.pages(path) else {
                continue;
            };
            let found = match self.shareholders.extract_from_text(&pages.join("\n"), years) {
                Ok(found) => found,
                Err(e) => {
                    warn!("No shareholder block in {}: {}", name, e);
                    continue;
                }
            };
            debug!("{} shareholder rows from text of {}", found.len(), name);

            let mut by_year: BTreeMap<FiscalYear, Vec<ShareholderRecord>> = BTreeMap::new();
            for record in found {
                by_year.entry(record.year).or_default().push(record);
            }
            for (year, block) in by_year {
                match blocks.entry(year) {
                    Entry::Occupied(kept) => {
                        debug!("Ignoring {} shareholders from {}, using {}", year, name, kept.get().0);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert((name.clone(), block));
                    }
                }
            }
        }

        blocks.into_values().flat_map(|(_, block)| block).collect()
    }
}

/// PDF files directly under `dir`, sorted by name.
fn list_documents(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    paths.sort();
    paths
}
