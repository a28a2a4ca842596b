//! FlowState Core — liquidity regime classification.
//!
//! This crate turns a snapshot of macro/crypto liquidity indicators into one
//! of three regimes:
//! - Per-indicator scoring with polarity and dead-bands
//! - Weighted aggregation with the full attainable score range
//! - BTC trend gate (price vs long moving average), failing closed
//! - Hysteresis state machine with confirmation cycles and margin override
//! - Classifier combining the above, plus a descriptive explanation
//! - Series transforms (calendar deltas, moving average) and state stores

pub mod classifier;
pub mod config;
pub mod domain;
pub mod engine;
pub mod explain;
pub mod gate;
pub mod hysteresis;
pub mod scoring;
pub mod series;
pub mod store;

pub use classifier::{Classification, ClassificationResult, RegimeClassifier};
pub use config::{ConfigError, EngineConfig};
pub use domain::{
    BtcSnapshot, DeltaSign, IndicatorObservation, IndicatorScore, IndicatorSpec, MarketSnapshot,
    Polarity, Regime, RegimeState, ScoreTrend, SeriesTrend,
};
pub use engine::{EngineError, RegimeEngine};
pub use explain::Explanation;
pub use hysteresis::{HysteresisPolicy, HysteresisStep};
pub use scoring::{aggregate, score, AggregateResult};
pub use store::{FileStateStore, MemoryStateStore, StateStore, StoreError};
