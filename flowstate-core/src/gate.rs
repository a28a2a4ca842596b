//! BTC trend gate caps the effective regime when BTC is below its long MA.
//!
//! Fails closed: equality, a missing price, or a missing moving average
//! (insufficient history) all count as "not above".

use crate::domain::{BtcSnapshot, Regime};

/// Whether BTC is strictly above its moving average.
///
/// Recomputed from price and average; the snapshot's stored `above_ma` flag
/// is not trusted, since it may come from an external payload.
pub fn gate(snapshot: &BtcSnapshot) -> bool {
    price_above_average(snapshot.price, snapshot.moving_average)
}

pub(crate) fn price_above_average(price: Option<f64>, moving_average: Option<f64>) -> bool {
    match (price, moving_average) {
        (Some(p), Some(ma)) if p.is_finite() && ma.is_finite() => p > ma,
        _ => false,
    }
}

/// Apply the gate to a hysteresis regime: Aggressive is capped to Balanced
/// when the gate fails. Other regimes pass through unchanged.
pub fn cap(regime: Regime, gate_passed: bool) -> Regime {
    match regime {
        Regime::Aggressive if !gate_passed => Regime::Balanced,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_strictly_above() {
        assert!(gate(&BtcSnapshot::new(Some(101.0), Some(100.0))));
    }

    #[test]
    fn equality_fails_closed() {
        assert!(!gate(&BtcSnapshot::new(Some(100.0), Some(100.0))));
    }

    #[test]
    fn below_fails() {
        assert!(!gate(&BtcSnapshot::new(Some(99.0), Some(100.0))));
    }

    #[test]
    fn missing_history_fails_closed() {
        assert!(!gate(&BtcSnapshot::new(Some(99.0), None)));
        assert!(!gate(&BtcSnapshot::unavailable()));
        assert!(!gate(&BtcSnapshot::new(Some(f64::NAN), Some(100.0))));
    }

    #[test]
    fn stale_above_flag_is_ignored() {
        let mut snap = BtcSnapshot::new(Some(90.0), Some(100.0));
        snap.above_ma = true;
        assert!(!gate(&snap));
    }

    #[test]
    fn cap_only_touches_aggressive() {
        assert_eq!(cap(Regime::Aggressive, false), Regime::Balanced);
        assert_eq!(cap(Regime::Aggressive, true), Regime::Aggressive);
        assert_eq!(cap(Regime::Defensive, false), Regime::Defensive);
        assert_eq!(cap(Regime::Balanced, false), Regime::Balanced);
    }
}
