use serde::{Deserialize, Serialize};

use crate::gate::price_above_average;

/// BTC price against its long moving average for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BtcSnapshot {
    pub price: Option<f64>,
    pub moving_average: Option<f64>,
    #[serde(default)]
    pub above_ma: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_from_ma: Option<f64>,
}

impl BtcSnapshot {
    pub fn new(price: Option<f64>, moving_average: Option<f64>) -> Self {
        let distance_from_ma = match (price, moving_average) {
            (Some(p), Some(ma)) if p.is_finite() && ma.is_finite() && ma != 0.0 => {
                Some(p / ma - 1.0)
            }
            _ => None,
        };
        Self {
            price,
            moving_average,
            above_ma: price_above_average(price, moving_average),
            distance_from_ma,
        }
    }

    /// Snapshot for a cycle with no price history at all.
    pub fn unavailable() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_above_and_distance() {
        let snap = BtcSnapshot::new(Some(110.0), Some(100.0));
        assert!(snap.above_ma);
        let distance = snap.distance_from_ma.unwrap();
        assert!((distance - 0.10).abs() < 1e-12);
    }

    #[test]
    fn missing_average_is_not_above() {
        let snap = BtcSnapshot::new(Some(110.0), None);
        assert!(!snap.above_ma);
        assert!(snap.distance_from_ma.is_none());
    }
}
