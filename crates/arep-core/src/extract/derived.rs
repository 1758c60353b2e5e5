//! Currency conversion and ratio metrics.

use std::collections::BTreeMap;

use crate::models::config::ArepConfig;
use crate::models::records::{FiscalYear, Metric, MetricRecord};

/// Computes USD values, gross profit margin and event labels for a finalized record.
#[derive(Debug, Clone)]
pub struct DerivedMetricsCalculator {
    exchange_rates: BTreeMap<FiscalYear, f64>,
    events: BTreeMap<FiscalYear, String>,
}

impl DerivedMetricsCalculator {
    pub fn new(
        exchange_rates: BTreeMap<FiscalYear, f64>,
        events: BTreeMap<FiscalYear, String>,
    ) -> Self {
        Self {
            exchange_rates,
            events,
        }
    }

    /// Build from pipeline configuration.
    pub fn from_config(config: &ArepConfig) -> Self {
        Self::new(config.rates.exchange_rates.clone(), config.rates.events.clone())
    }

    /// LKR per USD for a year.
    pub fn rate(&self, year: FiscalYear) -> Option<f64> {
        self.exchange_rates.get(&year).copied().filter(|r| *r > 0.0)
    }

    /// Return `record` with derived fields filled in.
    pub fn apply(&self, mut record: MetricRecord) -> MetricRecord {
        if let Some(rate) = self.rate(record.year) {
            for metric in Metric::ALL.into_iter().filter(Metric::is_lkr) {
                if let Some(value) = record.get(metric) {
                    record.usd_values.insert(metric, value / rate);
                }
            }
        }

        if let (Some(revenue), Some(cost)) = (
            record.absolute(Metric::TotalRevenue),
            record.absolute(Metric::CostOfSales),
        ) {
            if revenue != 0.0 {
                record.gross_profit_margin = Some((revenue - cost) / revenue * 100.0);
            }
        }

        record.events = self.events.get(&record.year).cloned();
        record
    }
}

impl Default for DerivedMetricsCalculator {
    fn default() -> Self {
        Self::from_config(&ArepConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::ScaleTag;

    #[test]
    fn test_usd_conversion() {
        let mut record = MetricRecord::new(2022);
        record.set_if_absent(Metric::NetProfit, 359.89, ScaleTag::Mn, None);
        record.set_if_absent(Metric::ShareCount, 1320.0, ScaleTag::Mn, None);

        let record = DerivedMetricsCalculator::default().apply(record);

        assert!((record.usd_values[&Metric::NetProfit] - 1.0).abs() < 1e-9);
        assert!(!record.usd_values.contains_key(&Metric::ShareCount));
        assert_eq!(record.events.as_deref(), Some("Economic Crisis"));
    }

    #[test]
    fn test_gross_profit_margin_uses_absolute_values() {
        let mut record = MetricRecord::new(2021);
        record.set_if_absent(Metric::TotalRevenue, 2.0, ScaleTag::Bn, None);
        record.set_if_absent(Metric::CostOfSales, 1500.0, ScaleTag::Mn, None);

        let record = DerivedMetricsCalculator::default().apply(record);
        assert!((record.gross_profit_margin.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_rate_no_conversion() {
        let mut record = MetricRecord::new(2024);
        record.set_if_absent(Metric::TotalRevenue, 10.0, ScaleTag::Mn, None);

        let record = DerivedMetricsCalculator::default().apply(record);
        assert!(record.usd_values.is_empty());
        assert!(record.gross_profit_margin.is_none());
        assert!(record.events.is_none());
    }
}
