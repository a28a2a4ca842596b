//! Weighted aggregation of indicator scores.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{IndicatorScore, IndicatorSpec};

/// Weighted total plus the attainable range used for gauge scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub total: f64,
    /// Every configured indicator scoring +1.
    pub max_possible: f64,
    /// Every configured indicator scoring -1.
    pub min_possible: f64,
    pub available_count: usize,
    pub configured_count: usize,
}

impl AggregateResult {
    /// Position of the total within [min_possible, max_possible], mapped to [0, 1].
    pub fn gauge_position(&self) -> f64 {
        let span = self.max_possible - self.min_possible;
        if span <= 0.0 {
            return 0.5;
        }
        ((self.total - self.min_possible) / span).clamp(0.0, 1.0)
    }
}

/// Sum weighted scores over the configured indicators.
///
/// The range always reflects the full configuration: an indicator with no
/// score contributes 0 to the total but still widens `max_possible` and
/// `min_possible`. Scores for keys that are not configured are ignored.
/// Weights come from the specs, so a stale `weight` on a score cannot skew
/// the total.
pub fn aggregate(scores: &[IndicatorScore], specs: &[IndicatorSpec]) -> AggregateResult {
    let by_key: HashMap<&str, &IndicatorScore> =
        scores.iter().map(|s| (s.key.as_str(), s)).collect();

    let mut total = 0.0;
    let mut weight_sum = 0.0;
    let mut available_count = 0;

    for spec in specs {
        weight_sum += spec.weight;
        if let Some(score) = by_key.get(spec.key.as_str()) {
            total += f64::from(score.raw) * spec.weight;
            if score.available {
                available_count += 1;
            }
        }
    }

    AggregateResult {
        total,
        max_possible: weight_sum,
        min_possible: -weight_sum,
        available_count,
        configured_count: specs.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Polarity;

    fn spec(key: &str, weight: f64) -> IndicatorSpec {
        IndicatorSpec::new(key, Polarity::HigherIsBullish, weight, 0.01)
    }

    fn scored(key: &str, raw: i8, weight: f64) -> IndicatorScore {
        IndicatorScore {
            key: key.into(),
            label: key.into(),
            raw,
            weight,
            weighted: f64::from(raw) * weight,
            reason: String::new(),
            available: true,
            trend: None,
        }
    }

    #[test]
    fn weighted_sum_and_range() {
        let specs = vec![spec("a", 1.5), spec("b", 1.0), spec("c", 1.5)];
        let scores = vec![scored("a", 1, 1.5), scored("b", -1, 1.0), scored("c", 1, 1.5)];
        let agg = aggregate(&scores, &specs);
        assert!((agg.total - 2.0).abs() < 1e-12);
        assert_eq!(agg.max_possible, 4.0);
        assert_eq!(agg.min_possible, -4.0);
        assert_eq!(agg.available_count, 3);
    }

    #[test]
    fn missing_indicator_still_counts_in_range() {
        let specs = vec![spec("a", 1.5), spec("b", 1.0)];
        let agg = aggregate(&[scored("a", 1, 1.5)], &specs);
        assert_eq!(agg.total, 1.5);
        assert_eq!(agg.max_possible, 2.5);
        assert_eq!(agg.min_possible, -2.5);
        assert_eq!(agg.available_count, 1);
        assert_eq!(agg.configured_count, 2);
    }

    #[test]
    fn order_does_not_matter() {
        let specs = vec![spec("a", 1.5), spec("b", 1.0)];
        let forward = aggregate(&[scored("a", 1, 1.5), scored("b", -1, 1.0)], &specs);
        let reversed = aggregate(&[scored("b", -1, 1.0), scored("a", 1, 1.5)], &specs);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let specs = vec![spec("a", 1.0)];
        let agg = aggregate(&[scored("zzz", 1, 10.0)], &specs);
        assert_eq!(agg.total, 0.0);
        assert_eq!(agg.available_count, 0);
    }

    #[test]
    fn gauge_position_spans_unit_interval() {
        let specs = vec![spec("a", 2.0)];
        assert_eq!(aggregate(&[scored("a", 1, 2.0)], &specs).gauge_position(), 1.0);
        assert_eq!(aggregate(&[scored("a", -1, 2.0)], &specs).gauge_position(), 0.0);
        assert_eq!(aggregate(&[], &specs).gauge_position(), 0.5);
    }
}
