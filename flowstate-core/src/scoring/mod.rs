//! Indicator scoring and weighted aggregation.

pub mod aggregate;
pub mod scorer;

pub use aggregate::{aggregate, AggregateResult};
pub use scorer::{score, DATA_UNAVAILABLE};

use tracing::{debug, warn};

use crate::domain::{IndicatorObservation, IndicatorScore, IndicatorSpec};

/// Score every configured indicator, in configuration order.
///
/// Indicators without an observation score 0 with a "data unavailable"
/// reason. Observations for unconfigured keys are skipped.
pub fn score_all(specs: &[IndicatorSpec], observations: &[IndicatorObservation]) -> Vec<IndicatorScore> {
    for obs in observations {
        if !specs.iter().any(|s| s.key == obs.key) {
            warn!(key = %obs.key, "observation for unconfigured indicator ignored");
        }
    }

    specs
        .iter()
        .map(|spec| {
            let scored = match observations.iter().find(|o| o.key == spec.key) {
                Some(obs) => score(spec, obs),
                None => scorer::unavailable(spec),
            };
            if scored.available {
                debug!(key = %scored.key, raw = scored.raw, reason = %scored.reason, "indicator scored");
            } else {
                warn!(key = %scored.key, "indicator data unavailable, scoring 0");
            }
            scored
        })
        .collect()
}
