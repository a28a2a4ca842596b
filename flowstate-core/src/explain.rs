//! Structured, descriptive explanation of a classification.
//!
//! Describes which indicators support or oppose the effective regime and any
//! caveats (gate cap, pending flip, missing data). It never recommends a
//! position or exposure.

use serde::{Deserialize, Serialize};

use crate::domain::{IndicatorScore, Regime, ScoreTrend};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub headline: String,
    /// Indicators pointing the same way as the regime.
    pub drivers: Vec<String>,
    /// Indicators pointing against it.
    pub headwinds: Vec<String>,
    pub notes: Vec<String>,
}

/// Inputs the explanation is built from.
pub(crate) struct ExplainContext<'a> {
    pub regime: Regime,
    pub hysteresis_regime: Regime,
    pub raw_regime: Regime,
    pub days_in_regime: i64,
    pub gate_capped: bool,
    pub pending_flip: bool,
    pub cycles_until_flip: Option<u32>,
    pub btc_distance: Option<f64>,
    pub smoothed_trend: Option<ScoreTrend>,
    pub indicators: &'a [IndicatorScore],
}

pub(crate) fn explain(ctx: &ExplainContext<'_>) -> Explanation {
    let name = ctx.regime.as_str().to_uppercase();
    let headline = if ctx.days_in_regime > 0 {
        format!("{name} (day {} of regime)", ctx.days_in_regime)
    } else {
        name
    };

    let line = |s: &IndicatorScore| match s.trend {
        Some(trend) => format!("{}: {}, trend {trend}", s.label, s.reason),
        None => format!("{}: {}", s.label, s.reason),
    };

    // Balanced has no direction of its own; bullish readings are its drivers
    // and bearish ones its headwinds, matching how the gauge reads.
    let (drivers, headwinds): (Vec<String>, Vec<String>) = match ctx.regime {
        Regime::Defensive => (
            ctx.indicators.iter().filter(|s| s.is_bearish()).map(line).collect(),
            ctx.indicators.iter().filter(|s| s.is_bullish()).map(line).collect(),
        ),
        Regime::Aggressive | Regime::Balanced => (
            ctx.indicators.iter().filter(|s| s.is_bullish()).map(line).collect(),
            ctx.indicators.iter().filter(|s| s.is_bearish()).map(line).collect(),
        ),
    };

    let mut notes = Vec::new();
    if ctx.gate_capped {
        let distance = ctx
            .btc_distance
            .map(|d| format!(" ({:+.1}% vs MA)", d * 100.0))
            .unwrap_or_default();
        notes.push(format!(
            "Score supports {} but BTC is not above its moving average{distance}; capped at {}",
            ctx.hysteresis_regime, ctx.regime
        ));
    }
    if ctx.pending_flip {
        match ctx.cycles_until_flip {
            Some(n) => notes.push(format!(
                "Raw classification is {}; {n} more confirming cycle(s) needed to flip",
                ctx.raw_regime
            )),
            None => notes.push(format!("Raw classification is {}", ctx.raw_regime)),
        }
    }
    let missing: Vec<&str> = ctx
        .indicators
        .iter()
        .filter(|s| !s.available)
        .map(|s| s.label.as_str())
        .collect();
    if !missing.is_empty() {
        notes.push(format!("Data unavailable: {}", missing.join(", ")));
    }
    match ctx.smoothed_trend {
        Some(ScoreTrend::Improving) => notes.push("Score improving over recent cycles".into()),
        Some(ScoreTrend::Deteriorating) => {
            notes.push("Score deteriorating over recent cycles".into())
        }
        Some(ScoreTrend::Flat) | None => {}
    }

    Explanation {
        headline,
        drivers,
        headwinds,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesTrend;

    fn scored(label: &str, raw: i8, available: bool) -> IndicatorScore {
        IndicatorScore {
            key: label.to_lowercase(),
            label: label.into(),
            raw,
            weight: 1.0,
            weighted: f64::from(raw),
            reason: if available { format!("raw {raw}") } else { "data unavailable".into() },
            available,
            trend: None,
        }
    }

    fn ctx(regime: Regime, indicators: &[IndicatorScore]) -> ExplainContext<'_> {
        ExplainContext {
            regime,
            hysteresis_regime: regime,
            raw_regime: regime,
            days_in_regime: 3,
            gate_capped: false,
            pending_flip: false,
            cycles_until_flip: None,
            btc_distance: None,
            smoothed_trend: None,
            indicators,
        }
    }

    #[test]
    fn defensive_drivers_are_bearish() {
        let scores = [scored("Fed", -1, true), scored("DXY", 1, true)];
        let e = explain(&ctx(Regime::Defensive, &scores));
        assert_eq!(e.headline, "DEFENSIVE (day 3 of regime)");
        assert_eq!(e.drivers, vec!["Fed: raw -1".to_string()]);
        assert_eq!(e.headwinds, vec!["DXY: raw 1".to_string()]);
    }

    #[test]
    fn notes_gate_cap_pending_and_missing() {
        let scores = [scored("Fed", 1, true), scored("RRP", 0, false)];
        let mut c = ctx(Regime::Balanced, &scores);
        c.hysteresis_regime = Regime::Aggressive;
        c.raw_regime = Regime::Defensive;
        c.gate_capped = true;
        c.pending_flip = true;
        c.cycles_until_flip = Some(1);
        c.btc_distance = Some(-0.05);
        let e = explain(&c);
        assert_eq!(e.notes.len(), 3);
        assert!(e.notes[0].contains("capped at balanced"));
        assert!(e.notes[0].contains("-5.0%"));
        assert!(e.notes[1].contains("1 more confirming cycle"));
        assert_eq!(e.notes[2], "Data unavailable: RRP");
    }

    #[test]
    fn series_trend_and_smoothed_score_trend_are_described() {
        let mut fed = scored("Fed", 1, true);
        fed.trend = Some(SeriesTrend::Up);
        let scores = [fed, scored("DXY", -1, true)];
        let mut c = ctx(Regime::Aggressive, &scores);
        c.smoothed_trend = Some(ScoreTrend::Deteriorating);
        let e = explain(&c);
        assert_eq!(e.drivers, vec!["Fed: raw 1, trend up".to_string()]);
        assert_eq!(e.headwinds, vec!["DXY: raw -1".to_string()]);
        assert_eq!(e.notes, vec!["Score deteriorating over recent cycles".to_string()]);

        c.smoothed_trend = Some(ScoreTrend::Flat);
        assert!(explain(&c).notes.is_empty());
    }

    #[test]
    fn first_day_headline_has_no_counter() {
        let mut c = ctx(Regime::Aggressive, &[]);
        c.days_in_regime = 0;
        assert_eq!(explain(&c).headline, "AGGRESSIVE");
    }
}
