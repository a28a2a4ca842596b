//! Engine configuration — indicator specs, regime thresholds, hysteresis knobs.
//!
//! Built once at startup (from TOML or `EngineConfig::default()`), validated,
//! then passed explicitly to the engine. Nothing in the scoring path reads
//! global settings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::domain::{IndicatorSpec, Polarity};

/// Rejected configuration. Raised before any evaluation runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("defensive threshold {defensive} must be below aggressive threshold {aggressive}")]
    ThresholdOrder { aggressive: f64, defensive: f64 },
    #[error("threshold {0} is not a finite number")]
    NonFiniteThreshold(f64),
    #[error("indicator '{key}' has weight {weight}; weights must be positive and finite")]
    InvalidWeight { key: String, weight: f64 },
    #[error("indicator '{key}' has dead band {dead_band}; dead bands must be non-negative and finite")]
    InvalidDeadBand { key: String, dead_band: f64 },
    #[error("indicator '{0}' is configured more than once")]
    DuplicateIndicator(String),
    #[error("indicator key must not be empty")]
    EmptyKey,
    #[error("indicator '{0}' has a zero-day lookback")]
    ZeroLookback(String),
    #[error("{name} lookback of {days} days exceeds the {max}-day limit", max = MAX_LOOKBACK_DAYS)]
    LookbackTooLong { name: String, days: u32 },
    #[error("{name} trend window {window} must be at least 2 points")]
    InvalidTrendWindow { name: String, window: usize },
    #[error("no indicators configured")]
    NoIndicators,
    #[error("override margin {0} must be non-negative and finite")]
    InvalidMargin(f64),
    #[error("confirmation cycles must be at least 1")]
    ZeroConfirmationCycles,
    #[error("delta lookback must be at least 1 day")]
    ZeroDeltaLookback,
    #[error("moving-average window must be at least 1 period")]
    ZeroMaWindow,
}

/// Longest delta lookback accepted, in days (ten years).
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub aggressive_threshold: f64,
    pub defensive_threshold: f64,
    /// Score margin past a threshold that bypasses the confirmation wait.
    #[serde(default = "default_override_margin")]
    pub override_margin: f64,
    /// Consecutive raw cycles required before a regime change commits.
    #[serde(default = "default_confirmation_cycles")]
    pub confirmation_cycles: u32,
    /// Calendar lookback for indicator deltas, in days.
    #[serde(default = "default_delta_lookback_days")]
    pub delta_lookback_days: u32,
    /// BTC moving-average window, in periods.
    #[serde(default = "default_ma_window")]
    pub ma_window: usize,
    /// Points in the least-squares trend fit, unless an indicator overrides it.
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    /// Let a score deep inside both thresholds enter Balanced without
    /// confirmation. Off unless configured.
    #[serde(default)]
    pub balanced_margin_override: bool,
    pub indicators: Vec<IndicatorSpec>,
}

fn default_override_margin() -> f64 {
    1.0
}

fn default_confirmation_cycles() -> u32 {
    2
}

fn default_delta_lookback_days() -> u32 {
    28
}

fn default_ma_window() -> usize {
    200
}

fn default_trend_window() -> usize {
    14
}

impl Default for EngineConfig {
    /// Five-indicator liquidity set: Fed balance sheet, reverse repo,
    /// high-yield spread, trade-weighted dollar, stablecoin supply.
    fn default() -> Self {
        Self {
            aggressive_threshold: 4.0,
            defensive_threshold: -4.0,
            override_margin: default_override_margin(),
            confirmation_cycles: default_confirmation_cycles(),
            delta_lookback_days: default_delta_lookback_days(),
            ma_window: default_ma_window(),
            trend_window: default_trend_window(),
            balanced_margin_override: false,
            indicators: vec![
                IndicatorSpec::new("walcl", Polarity::HigherIsBullish, 1.5, 0.005)
                    .with_label("Fed Balance Sheet")
                    .with_trend_window(8),
                IndicatorSpec::new("rrp", Polarity::LowerIsBullish, 1.5, 0.05)
                    .with_label("Reverse Repo"),
                IndicatorSpec::new("hy_spread", Polarity::LowerIsBullish, 1.5, 0.10)
                    .with_label("High Yield Spread"),
                IndicatorSpec::new("dxy", Polarity::LowerIsBullish, 1.0, 0.008)
                    .with_label("Dollar Index"),
                IndicatorSpec::new("stablecoin", Polarity::HigherIsBullish, 1.0, 0.035)
                    .with_label("Stablecoin Supply")
                    .with_lookback_days(21),
            ],
        }
    }
}

impl EngineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for t in [self.aggressive_threshold, self.defensive_threshold] {
            if !t.is_finite() {
                return Err(ConfigError::NonFiniteThreshold(t));
            }
        }
        if self.defensive_threshold >= self.aggressive_threshold {
            return Err(ConfigError::ThresholdOrder {
                aggressive: self.aggressive_threshold,
                defensive: self.defensive_threshold,
            });
        }
        if !self.override_margin.is_finite() || self.override_margin < 0.0 {
            return Err(ConfigError::InvalidMargin(self.override_margin));
        }
        if self.confirmation_cycles == 0 {
            return Err(ConfigError::ZeroConfirmationCycles);
        }
        if self.delta_lookback_days == 0 {
            return Err(ConfigError::ZeroDeltaLookback);
        }
        if self.delta_lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::LookbackTooLong {
                name: "delta_lookback_days".into(),
                days: self.delta_lookback_days,
            });
        }
        if self.trend_window < 2 {
            return Err(ConfigError::InvalidTrendWindow {
                name: "trend_window".into(),
                window: self.trend_window,
            });
        }
        if self.ma_window == 0 {
            return Err(ConfigError::ZeroMaWindow);
        }
        if self.indicators.is_empty() {
            return Err(ConfigError::NoIndicators);
        }

        let mut seen = HashSet::new();
        for spec in &self.indicators {
            if spec.key.trim().is_empty() {
                return Err(ConfigError::EmptyKey);
            }
            if !seen.insert(spec.key.as_str()) {
                return Err(ConfigError::DuplicateIndicator(spec.key.clone()));
            }
            if !spec.weight.is_finite() || spec.weight <= 0.0 {
                return Err(ConfigError::InvalidWeight {
                    key: spec.key.clone(),
                    weight: spec.weight,
                });
            }
            if !spec.dead_band.is_finite() || spec.dead_band < 0.0 {
                return Err(ConfigError::InvalidDeadBand {
                    key: spec.key.clone(),
                    dead_band: spec.dead_band,
                });
            }
            match spec.lookback_days {
                Some(0) => return Err(ConfigError::ZeroLookback(spec.key.clone())),
                Some(days) if days > MAX_LOOKBACK_DAYS => {
                    return Err(ConfigError::LookbackTooLong {
                        name: format!("indicator '{}'", spec.key),
                        days,
                    })
                }
                _ => {}
            }
            if let Some(window) = spec.trend_window.filter(|w| *w < 2) {
                return Err(ConfigError::InvalidTrendWindow {
                    name: format!("indicator '{}'", spec.key),
                    window,
                });
            }
        }
        Ok(())
    }

    pub fn indicator(&self, key: &str) -> Option<&IndicatorSpec> {
        self.indicators.iter().find(|s| s.key == key)
    }

    /// Sum of all configured weights.
    pub fn total_weight(&self) -> f64 {
        self.indicators.iter().map(|s| s.weight).sum()
    }

    /// Content hash of the configuration.
    ///
    /// Stored alongside the regime state so a state produced under different
    /// thresholds or weights can be detected after a redeploy.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
