//! Hysteresis state machine: decides when a raw classification takes effect.
//!
//! Three steps per cycle:
//! 1. Raw regime from the score alone (no gate, no history).
//! 2. Streak bookkeeping: a repeat of the previous raw regime extends the
//!    streak, anything else restarts it at 1.
//! 3. Commit a change only after `confirmation_cycles` consecutive agreeing
//!    cycles, or immediately when the score clears the Aggressive or
//!    Defensive threshold by the override margin. Entering Balanced always
//!    waits for confirmation unless `balanced_override` is set.
//!
//! Steps are pure: the input state is borrowed and the next state returned,
//! so callers decide whether (and where) it is persisted.

use chrono::NaiveDate;
use tracing::info;

use crate::config::EngineConfig;
use crate::domain::{Regime, RegimeState};

/// Thresholds and knobs driving regime transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisPolicy {
    pub aggressive_threshold: f64,
    pub defensive_threshold: f64,
    pub override_margin: f64,
    pub confirmation_cycles: u32,
    /// Allow the margin override when entering Balanced.
    pub balanced_override: bool,
}

/// Outcome of one hysteresis cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisStep {
    /// State to persist for the next cycle.
    pub state: RegimeState,
    /// Regime implied by this cycle's score alone.
    pub raw: Regime,
    /// Whether `current_regime` changed this cycle.
    pub transitioned: bool,
    /// Raw regime differs from the (post-step) current regime.
    pub pending: bool,
    /// Further agreeing cycles needed to flip, when pending.
    pub cycles_until_flip: Option<u32>,
    /// Score recorded by the previous cycle, if any.
    pub previous_score: Option<f64>,
}

impl HysteresisPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            aggressive_threshold: config.aggressive_threshold,
            defensive_threshold: config.defensive_threshold,
            override_margin: config.override_margin,
            confirmation_cycles: config.confirmation_cycles,
            balanced_override: config.balanced_margin_override,
        }
    }

    /// Step 1: classify a score with no hysteresis.
    pub fn raw_regime(&self, score: f64) -> Regime {
        if score >= self.aggressive_threshold {
            Regime::Aggressive
        } else if score <= self.defensive_threshold {
            Regime::Defensive
        } else {
            Regime::Balanced
        }
    }

    /// Whether `score` is extreme enough to enter `target` without confirmation.
    ///
    /// Balanced has no override unless `balanced_override` is set, and then
    /// only when the score sits at least the margin inside both thresholds.
    pub fn margin_override(&self, target: Regime, score: f64) -> bool {
        let margin = self.override_margin;
        match target {
            Regime::Aggressive => score >= self.aggressive_threshold + margin,
            Regime::Defensive => score <= self.defensive_threshold - margin,
            Regime::Balanced if !self.balanced_override => false,
            Regime::Balanced => {
                let from_aggressive = self.aggressive_threshold - score;
                let from_defensive = score - self.defensive_threshold;
                from_aggressive.min(from_defensive) >= margin
            }
        }
    }

    /// First-ever cycle: the raw regime is adopted directly.
    pub fn seed(&self, score: f64, today: NaiveDate) -> HysteresisStep {
        let raw = self.raw_regime(score);
        let mut state = RegimeState::seeded(raw, today);
        state.record_cycle(score, today);
        info!(regime = %raw, score, "regime state seeded");
        HysteresisStep {
            state,
            raw,
            transitioned: false,
            pending: false,
            cycles_until_flip: None,
            previous_score: None,
        }
    }

    /// Advance the state machine by one cycle.
    pub fn step(&self, state: &RegimeState, score: f64, today: NaiveDate) -> HysteresisStep {
        let raw = self.raw_regime(score);
        let previous_score = state.last_score;
        let mut next = state.clone();

        if raw == next.last_raw_regime {
            next.consecutive_days = next.consecutive_days.saturating_add(1);
        } else {
            next.consecutive_days = 1;
            next.last_raw_regime = raw;
        }

        let mut transitioned = false;
        if raw != next.current_regime {
            let confirmed = next.consecutive_days >= self.confirmation_cycles;
            let overridden = self.margin_override(raw, score);
            if confirmed || overridden {
                info!(
                    from = %next.current_regime,
                    to = %raw,
                    score,
                    consecutive = next.consecutive_days,
                    overridden = overridden && !confirmed,
                    "regime transition committed"
                );
                next.current_regime = raw;
                next.regime_start_date = today;
                next.consecutive_days = 1;
                transitioned = true;
            }
        }

        let pending = raw != next.current_regime;
        let cycles_until_flip = pending.then(|| {
            self.confirmation_cycles
                .saturating_sub(next.consecutive_days)
        });

        next.record_cycle(score, today);

        HysteresisStep {
            state: next,
            raw,
            transitioned,
            pending,
            cycles_until_flip,
            previous_score,
        }
    }
}

impl Default for HysteresisPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
