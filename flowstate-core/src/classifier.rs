//! Regime classifier: hysteresis first, then the BTC gate cap.
//!
//! The gate is applied to the hysteresis output for presentation only. The
//! persisted state keeps the score-earned regime, so when BTC reclaims its
//! moving average the cap lifts on that same cycle with no fresh
//! confirmation wait.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{BtcSnapshot, IndicatorScore, Regime, RegimeState, ScoreTrend};
use crate::explain::{explain, ExplainContext, Explanation};
use crate::gate;
use crate::hysteresis::{HysteresisPolicy, HysteresisStep};
use crate::scoring::AggregateResult;

/// Everything reported for one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub date: NaiveDate,
    /// Effective regime after the gate cap.
    pub regime: Regime,
    /// Regime held by the hysteresis state machine.
    pub hysteresis_regime: Regime,
    /// Regime implied by this cycle's score alone.
    pub raw_regime: Regime,
    pub total_score: f64,
    pub max_possible: f64,
    pub min_possible: f64,
    pub gauge_position: f64,
    pub btc_gate_passed: bool,
    pub gate_capped: bool,
    pub transitioned: bool,
    pub pending_flip: bool,
    pub cycles_until_flip: Option<u32>,
    pub consecutive_days: u32,
    pub regime_start_date: NaiveDate,
    pub days_in_regime: i64,
    pub score_trend: ScoreTrend,
    /// Trend over the last five cycles' scores; absent until five exist.
    #[serde(default)]
    pub smoothed_trend: Option<ScoreTrend>,
    pub indicators: Vec<IndicatorScore>,
    pub btc: BtcSnapshot,
    pub explanation: Explanation,
}

/// A classification together with the state to persist for the next cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub result: ClassificationResult,
    pub next_state: RegimeState,
}

#[derive(Debug, Clone, Copy)]
pub struct RegimeClassifier {
    policy: HysteresisPolicy,
}

impl RegimeClassifier {
    pub fn new(policy: HysteresisPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &HysteresisPolicy {
        &self.policy
    }

    /// Classify one cycle.
    ///
    /// With no prior state the raw regime seeds the state directly. The
    /// function is pure: identical inputs give identical output.
    pub fn classify(
        &self,
        aggregate: &AggregateResult,
        indicators: &[IndicatorScore],
        btc: &BtcSnapshot,
        state: Option<&RegimeState>,
        today: NaiveDate,
    ) -> Classification {
        let step = match state {
            Some(s) => self.policy.step(s, aggregate.total, today),
            None => self.policy.seed(aggregate.total, today),
        };
        finish(step, aggregate, indicators, btc, today)
    }
}

fn finish(
    step: HysteresisStep,
    aggregate: &AggregateResult,
    indicators: &[IndicatorScore],
    btc: &BtcSnapshot,
    today: NaiveDate,
) -> Classification {
    // Derived BTC fields are recomputed, never trusted from the caller.
    let btc = BtcSnapshot::new(btc.price, btc.moving_average);
    let hysteresis_regime = step.state.current_regime;
    let btc_gate_passed = gate::gate(&btc);
    let smoothed_trend = ScoreTrend::smoothed(&step.state.score_history);
    let regime = gate::cap(hysteresis_regime, btc_gate_passed);
    let gate_capped = regime != hysteresis_regime;
    let days_in_regime = step.state.days_in_regime(today);

    let explanation = explain(&ExplainContext {
        regime,
        hysteresis_regime,
        raw_regime: step.raw,
        days_in_regime,
        gate_capped,
        pending_flip: step.pending,
        cycles_until_flip: step.cycles_until_flip,
        btc_distance: btc.distance_from_ma,
        smoothed_trend,
        indicators,
    });

    let result = ClassificationResult {
        date: today,
        regime,
        hysteresis_regime,
        raw_regime: step.raw,
        total_score: aggregate.total,
        max_possible: aggregate.max_possible,
        min_possible: aggregate.min_possible,
        gauge_position: aggregate.gauge_position(),
        btc_gate_passed,
        gate_capped,
        transitioned: step.transitioned,
        pending_flip: step.pending,
        cycles_until_flip: step.cycles_until_flip,
        consecutive_days: step.state.consecutive_days,
        regime_start_date: step.state.regime_start_date,
        days_in_regime,
        score_trend: ScoreTrend::between(step.previous_score, aggregate.total),
        smoothed_trend,
        indicators: indicators.to_vec(),
        btc,
        explanation,
    };

    Classification {
        result,
        next_state: step.state,
    }
}
