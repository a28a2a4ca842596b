//! Regime engine — the single entry point.
//!
//! One cycle: score → aggregate → classify → persist. The load, compute, and
//! save run under one lock so two concurrent evaluations in this process
//! cannot both read the same state; the store's revision check catches a
//! writer in another process. A result is only returned once its state is
//! saved.

use std::sync::Mutex;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::classifier::{Classification, ClassificationResult, RegimeClassifier};
use crate::config::{ConfigError, EngineConfig};
use crate::domain::{BtcSnapshot, IndicatorObservation, MarketSnapshot, RegimeState};
use crate::hysteresis::HysteresisPolicy;
use crate::scoring::{aggregate, score_all};
use crate::store::{StateStore, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("state persistence failed: {0}")]
    Store(#[from] StoreError),
}

pub struct RegimeEngine<S: StateStore> {
    config: EngineConfig,
    fingerprint: String,
    classifier: RegimeClassifier,
    store: S,
    cycle_lock: Mutex<()>,
}

impl<S: StateStore> RegimeEngine<S> {
    /// Validate the configuration and bind it to a store.
    pub fn new(config: EngineConfig, store: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let classifier = RegimeClassifier::new(HysteresisPolicy::from_config(&config));
        Ok(Self {
            fingerprint: config.fingerprint(),
            config,
            classifier,
            store,
            cycle_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one evaluation cycle and persist the resulting state.
    ///
    /// On a store failure nothing is returned; callers may retry the cycle.
    pub fn evaluate(
        &self,
        observations: &[IndicatorObservation],
        btc: &BtcSnapshot,
        now: NaiveDate,
    ) -> Result<ClassificationResult, EngineError> {
        let _guard = self.cycle_lock.lock().unwrap_or_else(|e| e.into_inner());

        let prior = self.store.load()?;
        let Classification { result, mut next_state } =
            self.compute(observations, btc, prior.as_ref(), now);

        next_state.revision = prior.as_ref().map_or(0, |s| s.revision) + 1;
        next_state.config_fingerprint = Some(self.fingerprint.clone());
        self.store.save(&next_state)?;

        info!(
            date = %now,
            regime = %result.regime,
            hysteresis = %result.hysteresis_regime,
            raw = %result.raw_regime,
            score = result.total_score,
            revision = next_state.revision,
            "regime evaluated"
        );
        Ok(result)
    }

    /// Evaluate a snapshot assembled by the data layer.
    pub fn evaluate_snapshot(
        &self,
        snapshot: &MarketSnapshot,
        now: NaiveDate,
    ) -> Result<ClassificationResult, EngineError> {
        self.evaluate(&snapshot.observations, &snapshot.btc, now)
    }

    /// Compute what `evaluate` would report without saving anything.
    pub fn preview(
        &self,
        observations: &[IndicatorObservation],
        btc: &BtcSnapshot,
        now: NaiveDate,
    ) -> Result<ClassificationResult, EngineError> {
        let prior = self.store.load()?;
        Ok(self.compute(observations, btc, prior.as_ref(), now).result)
    }

    /// Persisted state, if any cycle has run.
    pub fn state(&self) -> Result<Option<RegimeState>, EngineError> {
        Ok(self.store.load()?)
    }

    /// Delete persisted state. The next cycle seeds afresh.
    pub fn reset(&self) -> Result<(), EngineError> {
        let _guard = self.cycle_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.store.reset()?;
        info!("regime state reset");
        Ok(())
    }

    fn compute(
        &self,
        observations: &[IndicatorObservation],
        btc: &BtcSnapshot,
        prior: Option<&RegimeState>,
        now: NaiveDate,
    ) -> Classification {
        if let Some(state) = prior {
            if let Some(fp) = &state.config_fingerprint {
                if fp != &self.fingerprint {
                    warn!("regime state was produced under a different configuration");
                }
            }
        }

        let scores = score_all(&self.config.indicators, observations);
        let agg = aggregate(&scores, &self.config.indicators);
        self.classifier.classify(&agg, &scores, btc, prior, now)
    }
}
