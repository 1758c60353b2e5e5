//! Rights issue ratio and price extraction.

use std::fmt;

use regex::Regex;

use super::{ExtractionMatch, FieldExtractor};
use super::patterns::{PRICE_PATTERNS, RATIO_COLON, RATIO_FOR, RATIO_OF, RATIO_ONE_FOR, RATIO_TO};

/// Largest numeral accepted on either side of a ratio. Rejects year ranges.
pub const MAX_RATIO_TERM: u32 = 31;

/// New shares offered per shares held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RightsRatio {
    pub offered: u32,
    pub held: u32,
}

impl fmt::Display for RightsRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.offered, self.held)
    }
}

/// Shape of a ratio pattern's captures.
#[derive(Clone, Copy)]
enum RatioShape {
    /// Both terms captured.
    Pair,
    /// Only the held term captured; offered is one.
    OneFor,
}

/// Rights ratio extractor.
pub struct RatioExtractor;

impl RatioExtractor {
    pub fn new() -> Self {
        Self
    }

    fn patterns() -> [(&'static Regex, RatioShape); 5] {
        [
            (&*RATIO_COLON, RatioShape::Pair),
            (&*RATIO_FOR, RatioShape::Pair),
            (&*RATIO_ONE_FOR, RatioShape::OneFor),
            (&*RATIO_TO, RatioShape::Pair),
            (&*RATIO_OF, RatioShape::Pair),
        ]
    }

    fn from_captures(caps: &regex::Captures<'_>, shape: RatioShape) -> Option<RightsRatio> {
        let (offered, held) = match shape {
            RatioShape::Pair => (caps[1].parse().ok()?, caps[2].parse().ok()?),
            RatioShape::OneFor => (1, caps[1].parse().ok()?),
        };
        if offered > MAX_RATIO_TERM || held > MAX_RATIO_TERM {
            return None;
        }
        Some(RightsRatio { offered, held })
    }
}

impl Default for RatioExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for RatioExtractor {
    type Output = ExtractionMatch<RightsRatio>;

    /// The first pattern that matches decides; an out-of-range match
    /// discards the ratio rather than falling through to later patterns.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let lower = text.to_lowercase();
        for (pattern, shape) in Self::patterns() {
            if let Some(caps) = pattern.captures(&lower) {
                let full_match = caps.get(0)?;
                return Self::from_captures(&caps, shape).map(|ratio| {
                    ExtractionMatch::new(ratio, 0.9, full_match.as_str())
                        .with_position(full_match.start(), full_match.end())
                });
            }
        }
        None
    }
}

/// Rights issue price extractor.
pub struct PriceExtractor;

impl PriceExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PriceExtractor {
    type Output = ExtractionMatch<f64>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        for pattern in PRICE_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                if let Ok(price) = caps[1].parse::<f64>() {
                    let full_match = caps.get(0)?;
                    return Some(
                        ExtractionMatch::new(price, 0.8, full_match.as_str())
                            .with_position(full_match.start(), full_match.end()),
                    );
                }
            }
        }
        None
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for pattern in PRICE_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let Ok(price) = caps[1].parse::<f64>() else {
                    continue;
                };
                let Some(full_match) = caps.get(0) else {
                    continue;
                };
                let overlaps = results.iter().any(|r| {
                    r.position
                        .is_some_and(|(s, e)| s < full_match.end() && full_match.start() < e)
                });
                if !overlaps {
                    results.push(
                        ExtractionMatch::new(price, 0.8, full_match.as_str())
                            .with_position(full_match.start(), full_match.end()),
                    );
                }
            }
        }

        results
    }
}
