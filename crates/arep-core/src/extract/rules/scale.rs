//! Unit scale hints and reconciliation of conflicting scales.

use tracing::trace;

use crate::models::records::{Provenance, ScaleTag};

/// Multiplier implied by unit words anywhere in a lowercased row.
///
/// Matching is by substring, so a bare `k` inside any word counts as a
/// thousands hint.
pub fn row_scale_multiplier(row_text: &str) -> f64 {
    if ["mn", "million", "millions"].iter().any(|s| row_text.contains(s)) {
        1e6
    } else if ["bn", "billion", "billions"].iter().any(|s| row_text.contains(s)) {
        1e9
    } else if ["k", "thousand", "thousands"].iter().any(|s| row_text.contains(s)) {
        1e3
    } else {
        1.0
    }
}

/// One located value awaiting reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleCandidate {
    pub value: f64,
    /// Known tag; inferred from magnitude when absent.
    pub scale: Option<ScaleTag>,
    pub provenance: Option<Provenance>,
}

impl ScaleCandidate {
    pub fn new(value: f64, scale: Option<ScaleTag>) -> Self {
        Self {
            value,
            scale,
            provenance: None,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }
}

/// The canonical value chosen for one metric/year.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Value expressed in units of `scale`.
    pub value: f64,
    pub scale: ScaleTag,
    pub provenance: Option<Provenance>,
    /// Distinct positive candidates considered.
    pub candidates: usize,
}

/// Majority-scale reconciliation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleReconciler;

impl ScaleReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Pick the most common tag (ties broken by [`ScaleTag::PREFERENCE`]),
    /// rescale every candidate to it, and keep the first distinct positive one.
    pub fn reconcile(&self, candidates: &[ScaleCandidate]) -> Option<Reconciled> {
        let mut distinct: Vec<(f64, ScaleTag, Option<&Provenance>)> = Vec::new();
        for candidate in candidates {
            if candidate.value <= 0.0 {
                continue;
            }
            let scale = candidate.scale.unwrap_or_else(|| ScaleTag::infer(candidate.value));
            let seen = distinct
                .iter()
                .any(|(v, s, _)| v.to_bits() == candidate.value.to_bits() && *s == scale);
            if !seen {
                distinct.push((candidate.value, scale, candidate.provenance.as_ref()));
            }
        }

        let chosen = choose_scale(distinct.iter().map(|(_, s, _)| *s))?;
        let (value, scale, provenance) = distinct.first()?;
        let rescaled = value * (scale.multiplier() / chosen.multiplier());

        trace!(
            "Reconciled {} candidates to {} {:?}",
            distinct.len(),
            rescaled,
            chosen
        );

        Some(Reconciled {
            value: rescaled,
            scale: chosen,
            provenance: provenance.cloned(),
            candidates: distinct.len(),
        })
    }
}

/// Most frequent tag, earliest in preference order on ties.
fn choose_scale(tags: impl Iterator<Item = ScaleTag>) -> Option<ScaleTag> {
    let mut counts = [0usize; 4];
    let mut any = false;
    for tag in tags {
        any = true;
        if let Some(idx) = ScaleTag::PREFERENCE.iter().position(|t| *t == tag) {
            counts[idx] += 1;
        }
    }
    if !any {
        return None;
    }

    let mut best = 0;
    for idx in 1..counts.len() {
        if counts[idx] > counts[best] {
            best = idx;
        }
    }
    Some(ScaleTag::PREFERENCE[best])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(value: f64, scale: ScaleTag) -> ScaleCandidate {
        ScaleCandidate::new(value, Some(scale))
    }

    #[test]
    fn test_row_scale_multiplier() {
        assert_eq!(row_scale_multiplier("revenue rs. mn 100"), 1e6);
        assert_eq!(row_scale_multiplier("revenue (billions) 1.2"), 1e9);
        assert_eq!(row_scale_multiplier("revenue thousand 1"), 1e3);
        assert_eq!(row_scale_multiplier("revenue 100"), 1.0);
        // substring semantics: "bank" carries a k
        assert_eq!(row_scale_multiplier("bank balance 100"), 1e3);
    }

    #[test]
    fn test_majority_scale_wins() {
        let candidates = vec![
            tagged(125.43, ScaleTag::Bn),
            tagged(125_430.0, ScaleTag::Mn),
            tagged(125_431.0, ScaleTag::Mn),
        ];
        let result = ScaleReconciler::new().reconcile(&candidates).unwrap();
        assert_eq!(result.scale, ScaleTag::Mn);
        assert!((result.value - 125_430.0).abs() < 1e-6);
        assert_eq!(result.candidates, 3);
    }

    #[test]
    fn test_tie_prefers_mn_then_bn() {
        let candidates = vec![tagged(2.0, ScaleTag::K), tagged(3.0, ScaleTag::Bn)];
        let result = ScaleReconciler::new().reconcile(&candidates).unwrap();
        assert_eq!(result.scale, ScaleTag::Bn);
        assert!((result.value - 2e-6).abs() < 1e-15);
    }

    #[test]
    fn test_missing_tags_inferred_from_magnitude() {
        let candidates = vec![
            ScaleCandidate::new(0.5, None),
            ScaleCandidate::new(5000.0, None),
            ScaleCandidate::new(6000.0, None),
        ];
        let result = ScaleReconciler::new().reconcile(&candidates).unwrap();
        assert_eq!(result.scale, ScaleTag::K);
        assert!((result.value - 500_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_positive_and_duplicates_discarded() {
        let candidates = vec![
            tagged(-4.0, ScaleTag::Mn),
            tagged(0.0, ScaleTag::Mn),
            tagged(7.0, ScaleTag::Mn),
            tagged(7.0, ScaleTag::Mn),
            tagged(7.0, ScaleTag::Mn),
            tagged(0.1, ScaleTag::Bn),
            tagged(0.2, ScaleTag::Bn),
        ];
        let result = ScaleReconciler::new().reconcile(&candidates).unwrap();
        // one distinct Mn against two Bn
        assert_eq!(result.scale, ScaleTag::Bn);
        assert!((result.value - 0.007).abs() < 1e-12);
        assert_eq!(result.candidates, 3);

        assert!(ScaleReconciler::new().reconcile(&[tagged(-1.0, ScaleTag::Mn)]).is_none());
        assert!(ScaleReconciler::new().reconcile(&[]).is_none());
    }

    #[test]
    fn test_same_quantity_any_order() {
        let quantity = 42_500_000_000.0;
        let base = vec![
            tagged(quantity / 1e9, ScaleTag::Bn),
            tagged(quantity / 1e6, ScaleTag::Mn),
            tagged(quantity / 1e3, ScaleTag::K),
            tagged(quantity / 1e6, ScaleTag::Mn),
            tagged(quantity, ScaleTag::Unscaled),
        ];

        let orders: Vec<Vec<usize>> = vec![
            vec![0, 1, 2, 3, 4],
            vec![4, 3, 2, 1, 0],
            vec![2, 0, 4, 1, 3],
            vec![1, 4, 0, 3, 2],
        ];
        for order in orders {
            let candidates: Vec<_> = order.iter().map(|i| base[*i].clone()).collect();
            let result = ScaleReconciler::new().reconcile(&candidates).unwrap();
            let absolute = result.value * result.scale.multiplier();
            assert!((absolute - quantity).abs() / quantity < 1e-12);
        }
    }
}
