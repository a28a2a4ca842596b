use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete market regime derived from the composite liquidity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Aggressive,
    Balanced,
    Defensive,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggressive => "aggressive",
            Self::Balanced => "balanced",
            Self::Defensive => "defensive",
        }
    }

    /// Sign of the regime: +1 risk-on, 0 neutral, -1 risk-off.
    ///
    /// Used to decide which indicator scores support or oppose a regime.
    pub fn direction(&self) -> i8 {
        match self {
            Self::Aggressive => 1,
            Self::Balanced => 0,
            Self::Defensive => -1,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the total score relative to the previous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTrend {
    Improving,
    Deteriorating,
    Flat,
}

impl ScoreTrend {
    /// Compare the current score to the previous one. No previous score is flat.
    pub fn between(previous: Option<f64>, current: f64) -> Self {
        const EPSILON: f64 = 1e-9;
        match previous {
            Some(prev) if current > prev + EPSILON => Self::Improving,
            Some(prev) if current < prev - EPSILON => Self::Deteriorating,
            _ => Self::Flat,
        }
    }

    /// Smoothed trend over the last five scores: mean of the latest three
    /// against mean of the two before, with a half-point band.
    ///
    /// `None` with fewer than five scores.
    pub fn smoothed(history: &[f64]) -> Option<Self> {
        const WINDOW: usize = 5;
        const BAND: f64 = 0.5;
        if history.len() < WINDOW {
            return None;
        }
        let recent = &history[history.len() - WINDOW..];
        let latest = recent[2..].iter().sum::<f64>() / 3.0;
        let prior = recent[..2].iter().sum::<f64>() / 2.0;
        Some(if latest > prior + BAND {
            Self::Improving
        } else if latest < prior - BAND {
            Self::Deteriorating
        } else {
            Self::Flat
        })
    }
}
