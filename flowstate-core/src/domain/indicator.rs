//! Indicator configuration, per-cycle observations, and per-cycle scores.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which delta direction counts as bullish for an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBullish,
    LowerIsBullish,
}

impl Polarity {
    /// Map a raw delta to its bullish-positive equivalent.
    pub fn orient(&self, delta: f64) -> f64 {
        match self {
            Self::HigherIsBullish => delta,
            Self::LowerIsBullish => -delta,
        }
    }
}

/// Static configuration for one tracked indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    /// Unique key, e.g. `walcl` or `stablecoin`.
    pub key: String,
    /// Display name. Falls back to the key when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub polarity: Polarity,
    pub weight: f64,
    /// Half-width of the neutral zone around a zero delta (fractional, 0.005 = 0.5%).
    pub dead_band: f64,
    /// Calendar lookback for the delta, overriding the engine default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_days: Option<u32>,
    /// Points in the trend fit, overriding the engine default. Weekly
    /// series want fewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_window: Option<usize>,
}

impl IndicatorSpec {
    pub fn new(key: impl Into<String>, polarity: Polarity, weight: f64, dead_band: f64) -> Self {
        Self {
            key: key.into(),
            label: None,
            polarity,
            weight,
            dead_band,
            lookback_days: None,
            trend_window: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    pub fn with_trend_window(mut self, points: usize) -> Self {
        self.trend_window = Some(points);
        self
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    /// Effective lookback given the engine-wide default.
    pub fn lookback(&self, default_days: u32) -> u32 {
        self.lookback_days.unwrap_or(default_days)
    }

    pub fn trend_points(&self, default_points: usize) -> usize {
        self.trend_window.unwrap_or(default_points)
    }
}

/// Direction of a series' recent least-squares fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesTrend {
    Up,
    Down,
    Flat,
}

impl SeriesTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Flat => "flat",
        }
    }
}

impl std::fmt::Display for SeriesTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign of a delta after dead-band classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaSign {
    Positive,
    Negative,
    Neutral,
}

impl DeltaSign {
    /// Classify a delta against a zero-centred dead-band.
    ///
    /// The band edges are inclusive; a zero delta is always neutral.
    pub fn classify(delta: f64, dead_band: f64) -> Self {
        if delta > 0.0 && delta >= dead_band {
            Self::Positive
        } else if delta < 0.0 && delta <= -dead_band {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// One indicator's snapshot for a single evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorObservation {
    pub key: String,
    pub current: Option<f64>,
    /// Fractional change over the calendar lookback window.
    pub delta: Option<f64>,
    /// Current window delta minus the previous window's delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<SeriesTrend>,
}

impl IndicatorObservation {
    pub fn new(key: impl Into<String>, current: Option<f64>, delta: Option<f64>) -> Self {
        Self {
            key: key.into(),
            current,
            delta,
            acceleration: None,
            as_of: None,
            trend: None,
        }
    }

    /// An observation with no usable data.
    pub fn missing(key: impl Into<String>) -> Self {
        Self::new(key, None, None)
    }

    pub fn with_acceleration(mut self, acceleration: Option<f64>) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_as_of(mut self, as_of: Option<NaiveDate>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_trend(mut self, trend: Option<SeriesTrend>) -> Self {
        self.trend = trend;
        self
    }

    /// Whether both the level and the delta are present and finite.
    pub fn is_available(&self) -> bool {
        matches!(self.current, Some(c) if c.is_finite())
            && matches!(self.delta, Some(d) if d.is_finite())
    }

    /// Sign of the raw (un-oriented) delta, or `None` when data is missing.
    pub fn delta_sign(&self, dead_band: f64) -> Option<DeltaSign> {
        if !self.is_available() {
            return None;
        }
        self.delta.map(|d| DeltaSign::classify(d, dead_band))
    }
}

/// Scored contribution of a single indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorScore {
    pub key: String,
    pub label: String,
    /// -1, 0, or +1.
    pub raw: i8,
    pub weight: f64,
    pub weighted: f64,
    pub reason: String,
    pub available: bool,
    /// Recent trend of the underlying series, when enough history exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<SeriesTrend>,
}

impl IndicatorScore {
    pub fn is_bullish(&self) -> bool {
        self.raw > 0
    }

    pub fn is_bearish(&self) -> bool {
        self.raw < 0
    }
}
