//! Persisted regime state, the only record that outlives a single cycle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Regime;

/// Current schema version for persisted regime state.
pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Number of recent total scores retained in the state.
pub const SCORE_HISTORY_LIMIT: usize = 30;

/// Hysteresis state carried from one evaluation cycle to the next.
///
/// `revision` is 1 for the first saved state and increases by exactly one per
/// successful save. Stores use it to reject writes based on a stale read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub revision: u64,
    pub current_regime: Regime,
    pub consecutive_days: u32,
    pub regime_start_date: NaiveDate,
    pub last_raw_regime: Regime,
    #[serde(default)]
    pub last_score: Option<f64>,
    #[serde(default)]
    pub last_evaluated: Option<NaiveDate>,
    /// Recent totals, oldest first, feeding the smoothed score trend.
    #[serde(default)]
    pub score_history: Vec<f64>,
    #[serde(default)]
    pub config_fingerprint: Option<String>,
}

fn default_schema_version() -> u32 {
    STATE_SCHEMA_VERSION
}

impl RegimeState {
    /// First-ever state: the raw classification is taken as confirmed.
    pub fn seeded(regime: Regime, today: NaiveDate) -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            revision: 0,
            current_regime: regime,
            consecutive_days: 1,
            regime_start_date: today,
            last_raw_regime: regime,
            last_score: None,
            last_evaluated: None,
            score_history: Vec::new(),
            config_fingerprint: None,
        }
    }

    /// Whole calendar days since the current regime was confirmed.
    pub fn days_in_regime(&self, today: NaiveDate) -> i64 {
        (today - self.regime_start_date).num_days().max(0)
    }

    /// Record this cycle's score and date, trimming history to the limit.
    pub fn record_cycle(&mut self, score: f64, today: NaiveDate) {
        self.last_score = Some(score);
        self.last_evaluated = Some(today);
        self.score_history.push(score);
        if self.score_history.len() > SCORE_HISTORY_LIMIT {
            let excess = self.score_history.len() - SCORE_HISTORY_LIMIT;
            self.score_history.drain(..excess);
        }
    }
}
