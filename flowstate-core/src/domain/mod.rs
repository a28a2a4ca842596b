//! Domain types for the regime engine.

pub mod btc;
pub mod indicator;
pub mod regime;
pub mod state;

pub use btc::BtcSnapshot;
pub use indicator::{
    DeltaSign, IndicatorObservation, IndicatorScore, IndicatorSpec, Polarity, SeriesTrend,
};
pub use regime::{Regime, ScoreTrend};
pub use state::{RegimeState, SCORE_HISTORY_LIMIT, STATE_SCHEMA_VERSION};

use serde::{Deserialize, Serialize};

/// Everything the engine needs for one cycle, as supplied by the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub observations: Vec<IndicatorObservation>,
    pub btc: BtcSnapshot,
}
