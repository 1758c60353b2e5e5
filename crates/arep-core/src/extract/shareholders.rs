//! Top-twenty shareholder extraction from document text and tables.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::error::ExtractionError;
use crate::models::config::ArepConfig;
use crate::models::records::{FiscalYear, ShareholderRecord};
use crate::models::table::RawTable;

use super::rules::patterns::{FOUR_DIGITS, SHAREHOLDER_ROW_DUAL, SHAREHOLDER_ROW_SINGLE};

/// Header words identifying a percentage column in single-year tables.
const PERCENTAGE_KEYWORDS: [&str; 6] =
    ["%", "percentage", "holding", "ownership", "shareholding", "stake"];

/// First-column values that are header labels, not shareholders.
const HEADER_NAMES: [&str; 2] = ["shareholder", "name"];

/// Extracts ranked shareholder lists.
#[derive(Debug, Clone)]
pub struct ShareholderExtractor {
    marker: String,
    table_marker: String,
    top_n: usize,
    min_digits: usize,
}

impl ShareholderExtractor {
    pub fn new() -> Self {
        Self::from_config(&ArepConfig::default())
    }

    /// Build from pipeline configuration.
    pub fn from_config(config: &ArepConfig) -> Self {
        Self {
            marker: config.extraction.shareholder_marker.clone(),
            table_marker: config.extraction.shareholder_table_marker.to_lowercase(),
            top_n: config.extraction.top_shareholders,
            min_digits: config.extraction.min_data_line_digits,
        }
    }

    /// Extract the shareholder block following the section marker in a
    /// document's text. `years` are the fiscal years of the first and second
    /// percentage columns. A year is only returned when all `top_n` rows
    /// matched for it.
    pub fn extract_from_text(
        &self,
        text: &str,
        years: (FiscalYear, FiscalYear),
    ) -> Result<Vec<ShareholderRecord>, ExtractionError> {
        let (_, section) = text
            .split_once(self.marker.as_str())
            .ok_or_else(|| ExtractionError::MarkerNotFound(self.marker.clone()))?;

        let lines: Vec<&str> = section.lines().collect();
        let header_idx = lines
            .iter()
            .position(|l| FOUR_DIGITS.is_match(l))
            .ok_or(ExtractionError::NoYearHeader)?;

        let data_lines: Vec<&str> = lines[header_idx + 1..]
            .iter()
            .filter(|l| !l.trim().is_empty())
            .filter(|l| l.chars().filter(char::is_ascii_digit).count() >= self.min_digits)
            .take(self.top_n)
            .copied()
            .collect();

        if data_lines.len() < self.top_n {
            return Err(ExtractionError::IncompleteBlock {
                found: data_lines.len(),
                required: self.top_n,
            });
        }

        let header_years = FOUR_DIGITS.find_iter(lines[header_idx]).count();
        if header_years < 2 {
            return Err(ExtractionError::MissingYearColumns {
                found: header_years,
            });
        }

        let mut first = Vec::new();
        let mut second = Vec::new();
        for line in data_lines {
            if let Some(caps) = SHAREHOLDER_ROW_DUAL.captures(line) {
                let name = caps[1].trim().to_string();
                if let (Some(p1), Some(p2)) = (parse_percentage(&caps[3]), parse_percentage(&caps[5])) {
                    first.push((name.clone(), p1));
                    second.push((name, p2));
                    continue;
                }
            }
            if let Some(caps) = SHAREHOLDER_ROW_SINGLE.captures(line) {
                if let Some(p1) = parse_percentage(&caps[3]) {
                    first.push((caps[1].trim().to_string(), p1));
                    continue;
                }
            }
            trace!("Unmatched shareholder line: {}", line);
        }

        let mut records = Vec::new();
        for (year, rows) in [(years.0, first), (years.1, second)] {
            if rows.len() == self.top_n {
                records.extend(rows.into_iter().enumerate().map(|(i, (name, pct))| {
                    ShareholderRecord {
                        year,
                        rank: i + 1,
                        shareholder_name: name,
                        ownership_percentage: pct,
                    }
                }));
            } else {
                debug!("Year {} has {} of {} shareholder rows", year, rows.len(), self.top_n);
            }
        }

        if records.is_empty() {
            return Err(ExtractionError::IncompleteBlock {
                found: 0,
                required: self.top_n,
            });
        }
        Ok(records)
    }

    /// Extract shareholders from tables headed "top twenty shareholder".
    /// Dual-year tables report their own years; single-year tables are filed
    /// under `year`. Ranks follow encounter order and are not yet truncated.
    pub fn extract_from_tables(&self, tables: &[RawTable], year: FiscalYear) -> Vec<ShareholderRecord> {
        let mut records: Vec<ShareholderRecord> = Vec::new();

        for table in tables {
            if !table.head_text(3).contains(&self.table_marker) {
                continue;
            }
            let Some((header, body)) = split_header(table) else {
                debug!("Shareholder table in {} has no usable header", table.document);
                continue;
            };

            let lower: Vec<String> = header.iter().map(|c| c.to_lowercase()).collect();
            let year_cols: Vec<usize> = (0..lower.len()).filter(|i| FOUR_DIGITS.is_match(&lower[*i])).collect();
            let pct_cols: Vec<usize> = (0..lower.len()).filter(|i| lower[*i].contains('%')).collect();

            if year_cols.len() >= 2 && pct_cols.len() >= 2 {
                let (Some(year1), Some(year2)) =
                    (header_year(&lower[year_cols[0]]), header_year(&lower[year_cols[1]]))
                else {
                    continue;
                };
                for row in body {
                    let Some(name) = shareholder_name(row) else {
                        continue;
                    };
                    for (y, col) in [(year1, pct_cols[0]), (year2, pct_cols[1])] {
                        if let Some(pct) = row.get(col).and_then(|c| parse_percentage(c)) {
                            let rank = records.iter().filter(|r| r.year == y).count() + 1;
                            records.push(ShareholderRecord {
                                year: y,
                                rank,
                                shareholder_name: name.clone(),
                                ownership_percentage: pct,
                            });
                        }
                    }
                }
            } else {
                let Some(pct_col) = lower
                    .iter()
                    .position(|c| PERCENTAGE_KEYWORDS.iter().any(|k| c.contains(k)))
                else {
                    continue;
                };
                let mut rank = 1;
                for row in body {
                    let Some(name) = shareholder_name(row) else {
                        continue;
                    };
                    if let Some(pct) = row.get(pct_col).and_then(|c| parse_percentage(c)) {
                        records.push(ShareholderRecord {
                            year,
                            rank,
                            shareholder_name: name,
                            ownership_percentage: pct,
                        });
                        rank += 1;
                    }
                }
            }
        }

        records
    }

    /// Per year: order by encounter rank, keep the first `top_n`, re-rank 1..N.
    pub fn finalize(&self, records: Vec<ShareholderRecord>) -> Vec<ShareholderRecord> {
        let mut by_year: BTreeMap<FiscalYear, Vec<ShareholderRecord>> = BTreeMap::new();
        for record in records {
            by_year.entry(record.year).or_default().push(record);
        }

        let mut out = Vec::new();
        for (_, mut year_records) in by_year {
            year_records.sort_by_key(|r| r.rank);
            year_records.truncate(self.top_n);
            for (i, mut record) in year_records.into_iter().enumerate() {
                record.rank = i + 1;
                out.push(record);
            }
        }
        out
    }
}

impl Default for ShareholderExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Header cells and body rows. Uses the table header when it names a
/// percentage column, otherwise the first of the leading body rows that does.
/// A header that is only a title still wins when no body row qualifies.
fn split_header(table: &RawTable) -> Option<(&[String], &[Vec<String>])> {
    if names_percentage(&table.header) {
        return Some((table.header.as_slice(), table.rows.as_slice()));
    }
    match table.rows.iter().take(3).position(|row| names_percentage(row)) {
        Some(idx) => Some((table.rows[idx].as_slice(), &table.rows[idx + 1..])),
        None if !table.header.is_empty() => Some((table.header.as_slice(), table.rows.as_slice())),
        None => None,
    }
}

fn names_percentage(row: &[String]) -> bool {
    row.iter().any(|c| {
        let c = c.to_lowercase();
        PERCENTAGE_KEYWORDS.iter().any(|k| c.contains(k))
    })
}

fn header_year(cell: &str) -> Option<FiscalYear> {
    FOUR_DIGITS.find(cell)?.as_str().parse().ok()
}

fn shareholder_name(row: &[String]) -> Option<String> {
    let name = row.first()?.trim();
    if name.is_empty() || HEADER_NAMES.contains(&name.to_lowercase().as_str()) {
        return None;
    }
    Some(name.to_string())
}

/// Percentage in (0, 100], ignoring a trailing `%`.
fn parse_percentage(text: &str) -> Option<f64> {
    let pct: f64 = text.replace('%', "").trim().parse().ok()?;
    (pct > 0.0 && pct <= 100.0).then_some(pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(year: FiscalYear, rank: usize, name: &str, pct: f64) -> ShareholderRecord {
        ShareholderRecord {
            year,
            rank,
            shareholder_name: name.to_string(),
            ownership_percentage: pct,
        }
    }

    fn dual_year_table() -> RawTable {
        RawTable::from_cells(
            "b.pdf",
            &["Name", "31 Mar 2020", "%", "31 Mar 2019", "%"],
            &[
                &["Top Twenty Shareholders", "", "", "", ""],
                &["John Doe", "1,000,000", "5.20", "900,000", "4.80"],
                &["Jane Roe", "800,000", "4.10", "", "-"],
            ],
        )
    }

    #[test]
    fn test_dual_year_table() {
        let records = ShareholderExtractor::new().extract_from_tables(&[dual_year_table()], 2021);
        assert_eq!(
            records,
            vec![
                record(2020, 1, "John Doe", 5.20),
                record(2019, 1, "John Doe", 4.80),
                record(2020, 2, "Jane Roe", 4.10),
            ]
        );
    }

    #[test]
    fn test_single_year_table_uses_supplied_year() {
        let table = RawTable::from_cells(
            "b.pdf",
            &[],
            &[
                &["Top Twenty Shareholders of the Company"],
                &["Shareholder", "No. of shares", "Holding %"],
                &["A Holdings", "5,000", "12.5%"],
                &["B Trust", "4,000", "150"],
                &["C Fund", "3,000", "0.75"],
            ],
        );
        let records = ShareholderExtractor::new().extract_from_tables(&[table], 2022);
        assert_eq!(
            records,
            vec![record(2022, 1, "A Holdings", 12.5), record(2022, 2, "C Fund", 0.75)]
        );
    }

    #[test]
    fn test_title_header_with_columns_in_first_row() {
        let table = RawTable::from_cells(
            "b.pdf",
            &["Top Twenty Shareholders of the Company"],
            &[
                &["Name", "31 Mar 2020", "%", "31 Mar 2019", "%"],
                &["John Doe", "1,000,000", "5.20", "900,000", "4.80"],
            ],
        );
        let records = ShareholderExtractor::new().extract_from_tables(&[table], 2021);
        assert_eq!(
            records,
            vec![record(2020, 1, "John Doe", 5.20), record(2019, 1, "John Doe", 4.80)]
        );
    }

    #[test]
    fn test_table_without_marker_is_skipped() {
        let table = RawTable::from_cells("b.pdf", &["Name", "%"], &[&["A", "10"]]);
        assert!(ShareholderExtractor::new().extract_from_tables(&[table], 2022).is_empty());
    }

    #[test]
    fn test_finalize_truncates_and_reranks() {
        let mut records: Vec<ShareholderRecord> = (1..=25)
            .rev()
            .map(|rank| record(2021, rank, &format!("Holder {}", rank), 1.0))
            .collect();
        records.push(record(2020, 3, "Late", 2.0));
        records.push(record(2020, 1, "Early", 3.0));

        let out = ShareholderExtractor::new().finalize(records);

        let ranks_2020: Vec<_> = out.iter().filter(|r| r.year == 2020).map(|r| (r.rank, r.shareholder_name.as_str())).collect();
        assert_eq!(ranks_2020, vec![(1, "Early"), (2, "Late")]);

        let ranks_2021: Vec<usize> = out.iter().filter(|r| r.year == 2021).map(|r| r.rank).collect();
        assert_eq!(ranks_2021, (1..=20).collect::<Vec<_>>());
        let last = out.iter().rfind(|r| r.year == 2021).unwrap();
        assert_eq!(last.shareholder_name, "Holder 20");
    }

    fn shareholder_text(rows: usize, dual: bool) -> String {
        let mut text = String::from("Preamble\nTop Twenty Shareholders of the Company\n");
        text.push_str("Name of shareholder 31.03.2021 % 31.03.2020 %\n\n");
        for i in 1..=rows {
            if dual {
                text.push_str(&format!("Holder {} Ltd {},000,000 {}.50 {},500,000 {}.25\n", i, 30 - i, 21 - i, 29 - i, 20 - i));
            } else {
                text.push_str(&format!("Holder {} Ltd {},000,000 {}.50\n", i, 30 - i, 21 - i));
            }
        }
        text.push_str("Page 12\n");
        text
    }

    #[test]
    fn test_text_block_dual_years() {
        let records = ShareholderExtractor::new()
            .extract_from_text(&shareholder_text(20, true), (2021, 2020))
            .unwrap();

        assert_eq!(records.len(), 40);
        assert_eq!(records[0], record(2021, 1, "Holder 1 Ltd", 20.5));
        assert_eq!(records[20], record(2020, 1, "Holder 1 Ltd", 19.25));
        assert_eq!(records[39].rank, 20);
    }

    #[test]
    fn test_text_block_single_column_fills_first_year_only() {
        let records = ShareholderExtractor::new()
            .extract_from_text(&shareholder_text(20, false), (2021, 2020))
            .unwrap();
        assert_eq!(records.len(), 20);
        assert!(records.iter().all(|r| r.year == 2021));
    }

    #[test]
    fn test_text_block_failures() {
        let extractor = ShareholderExtractor::new();

        assert!(matches!(
            extractor.extract_from_text("nothing here", (2021, 2020)),
            Err(ExtractionError::MarkerNotFound(_))
        ));
        assert_eq!(
            extractor.extract_from_text(&shareholder_text(12, true), (2021, 2020)),
            Err(ExtractionError::IncompleteBlock { found: 12, required: 20 })
        );
        assert_eq!(
            extractor.extract_from_text("Top Twenty Shareholders of the Company\nno digits", (2021, 2020)),
            Err(ExtractionError::NoYearHeader)
        );
    }
}
