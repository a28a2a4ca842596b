//! Indicator scorer: one observation in, one signed score out.
//!
//! The delta is oriented by polarity (reverse-repo draining is bullish, so a
//! negative delta on a `lower_is_bullish` series scores +1), then compared to
//! the indicator's dead-band. Missing data scores 0 and never fails.

use crate::domain::{DeltaSign, IndicatorObservation, IndicatorScore, IndicatorSpec};

/// Reason recorded for an indicator whose level or delta is missing.
pub const DATA_UNAVAILABLE: &str = "data unavailable";

/// Score a single indicator observation against its spec.
pub fn score(spec: &IndicatorSpec, obs: &IndicatorObservation) -> IndicatorScore {
    let delta = match obs.delta {
        Some(d) if obs.is_available() => d,
        _ => return unavailable(spec),
    };

    let oriented = spec.polarity.orient(delta);
    let raw: i8 = match DeltaSign::classify(oriented, spec.dead_band) {
        DeltaSign::Positive => 1,
        DeltaSign::Negative => -1,
        DeltaSign::Neutral => 0,
    };

    IndicatorScore {
        key: spec.key.clone(),
        label: spec.display_name().to_string(),
        raw,
        weight: spec.weight,
        weighted: f64::from(raw) * spec.weight,
        reason: reason(raw, delta, obs.acceleration),
        available: true,
        trend: obs.trend,
    }
}

/// Zero score for an indicator with no usable data.
pub fn unavailable(spec: &IndicatorSpec) -> IndicatorScore {
    IndicatorScore {
        key: spec.key.clone(),
        label: spec.display_name().to_string(),
        raw: 0,
        weight: spec.weight,
        weighted: 0.0,
        reason: DATA_UNAVAILABLE.to_string(),
        available: false,
        trend: None,
    }
}

fn reason(raw: i8, delta: f64, acceleration: Option<f64>) -> String {
    let pct = delta * 100.0;
    if raw == 0 {
        return format!("Flat ({pct:+.1}%)");
    }

    let movement = if delta >= 0.0 { "Rising" } else { "Falling" };
    let stance = if raw > 0 { "bullish" } else { "bearish" };
    let accelerating = matches!(acceleration, Some(a) if a.is_finite() && a * delta > 0.0);
    if accelerating {
        format!("{movement} {pct:+.1}% ({stance}, accelerating)")
    } else {
        format!("{movement} {pct:+.1}% ({stance})")
    }
}
