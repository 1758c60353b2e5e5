//! Rights issue detection over table rows.

use tracing::{debug, trace};

use crate::models::records::{FiscalYear, RightsIssueRecord};
use crate::models::table::RawTable;

use super::rules::{FieldExtractor, PriceExtractor, RatioExtractor};

/// A table must mention one of these to be scanned.
const RIGHTS_KEYWORDS: [&str; 9] = [
    "right",
    "rights",
    "issue",
    "offer",
    "allotment",
    "subscription",
    "entitlement",
    "ratio",
    "price per share",
];

/// Finds rights issue ratio and price mentions row by row.
#[derive(Default)]
pub struct RightsIssueExtractor {
    ratio: RatioExtractor,
    price: PriceExtractor,
}

impl RightsIssueExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract one record per row carrying a valid ratio or a positive price.
    pub fn extract(&self, tables: &[RawTable], year: FiscalYear) -> Vec<RightsIssueRecord> {
        let mut records = Vec::new();

        for table in tables {
            let text = table.flattened_text().to_lowercase();
            if !RIGHTS_KEYWORDS.iter().any(|k| text.contains(k)) {
                continue;
            }
            for row in table.all_rows() {
                if let Some(record) = self.extract_row(&row.join(" "), year) {
                    debug!("Rights issue in {}: {:?}", table.document, record);
                    records.push(record);
                }
            }
        }

        records
    }

    /// Extract a record from a single row of text. The price is the first
    /// positive match, in price pattern order.
    pub fn extract_row(&self, row_text: &str, year: FiscalYear) -> Option<RightsIssueRecord> {
        let row_text = row_text.to_lowercase();
        let ratio = self.ratio.extract(&row_text).map(|m| {
            trace!("Ratio {} from '{}' ({:.1})", m.value, m.source, m.confidence);
            m.value
        });

        let prices = self.price.extract_all(&row_text);
        if prices.len() > 1 {
            debug!("{} price mentions in row, keeping the first positive", prices.len());
        }
        let price = prices.into_iter().find(|m| m.value > 0.0).map(|m| {
            trace!("Price {} from '{}' ({:.1})", m.value, m.source, m.confidence);
            m.value
        });

        if ratio.is_none() && price.is_none() {
            return None;
        }
        Some(RightsIssueRecord {
            year,
            ratio: ratio.map(|r| r.to_string()).unwrap_or_default(),
            issue_price: price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ratio_and_price_in_one_row() {
        let record = RightsIssueExtractor::new()
            .extract_row("Rights issue in the ratio of 1:4 at a price of Rs. 10.50", 2021)
            .unwrap();
        assert_eq!(
            record,
            RightsIssueRecord {
                year: 2021,
                ratio: "1:4".to_string(),
                issue_price: Some(10.50),
            }
        );
    }

    #[test]
    fn test_year_range_is_not_a_ratio() {
        let extractor = RightsIssueExtractor::new();
        assert_eq!(extractor.extract_row("Rights issue 2020:21 Annual Report", 2021), None);

        let record = extractor
            .extract_row("2020:21 rights issue at LKR 25", 2021)
            .unwrap();
        assert_eq!(record.ratio, "");
        assert_eq!(record.issue_price, Some(25.0));
    }

    #[test]
    fn test_price_skips_zero_amounts() {
        let extractor = RightsIssueExtractor::new();
        let record = extractor
            .extract_row("Rights issue: par value Rs. 0, issued at Rs. 15.00", 2022)
            .unwrap();
        assert_eq!(record.issue_price, Some(15.0));
        assert_eq!(extractor.extract_row("Rights issue at Rs. 0", 2022), None);
    }

    #[test]
    fn test_tables_without_keywords_are_skipped() {
        let extractor = RightsIssueExtractor::new();
        let plain = RawTable::from_cells("a.pdf", &["Item", "Value"], &[&["Cash", "1:2 Rs. 5"]]);
        assert!(extractor.extract(&[plain], 2020).is_empty());

        let rights = RawTable::from_cells(
            "a.pdf",
            &["Rights issue", "Details"],
            &[&["Ratio", "1 for 5"], &["Price per share", "Rs. 12.00"], &["Date", "12 March"]],
        );
        let records = extractor.extract(&[rights], 2020);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ratio, "1:5");
        assert_eq!(records[1].issue_price, Some(12.0));
    }
}
