//! Raw series → per-cycle observations.
//!
//! Turns dated series (already fetched by the data layer) into the
//! `IndicatorObservation`s and `BtcSnapshot` the engine consumes. Nothing
//! here performs network I/O; the directory loader only reads local CSVs.

pub mod csv;
pub mod transforms;

pub use self::csv::{read_series, read_series_file};
pub use transforms::{
    acceleration, calendar_delta, moving_average, normalize, series_trend, SeriesPoint,
};

use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::domain::{BtcSnapshot, IndicatorObservation, IndicatorSpec, MarketSnapshot};

/// File name of the BTC price series inside a snapshot directory.
pub const BTC_SERIES_FILE: &str = "btc.csv";

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("read series: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Build one indicator's observation from its series.
///
/// Points must be sorted by date (see [`normalize`]).
pub fn observe(
    spec: &IndicatorSpec,
    points: &[SeriesPoint],
    default_lookback_days: u32,
    default_trend_window: usize,
) -> IndicatorObservation {
    let days = spec.lookback(default_lookback_days);
    let latest = points.last();
    IndicatorObservation {
        key: spec.key.clone(),
        current: latest.map(|p| p.value).filter(|v| v.is_finite()),
        delta: calendar_delta(points, days),
        acceleration: acceleration(points, days),
        as_of: latest.map(|p| p.date),
        trend: series_trend(points, spec.trend_points(default_trend_window)),
    }
}

/// Build the BTC snapshot from a daily price series.
///
/// With fewer than `window` prices the average is `None` and the gate will
/// fail closed.
pub fn btc_snapshot(points: &[SeriesPoint], window: usize) -> BtcSnapshot {
    let prices: Vec<f64> = points.iter().map(|p| p.value).collect();
    let price = prices.last().copied().filter(|p| p.is_finite());
    BtcSnapshot::new(price, moving_average(&prices, window))
}

/// Load a full market snapshot from a directory of CSVs.
///
/// Expects `{key}.csv` per configured indicator plus `btc.csv`. A missing
/// file is treated as missing data, not an error, so the engine degrades the
/// way it does for a failed upstream fetch.
pub fn load_snapshot_dir(config: &EngineConfig, dir: &Path) -> Result<MarketSnapshot, SeriesError> {
    let mut observations = Vec::with_capacity(config.indicators.len());
    for spec in &config.indicators {
        let path = dir.join(format!("{}.csv", spec.key));
        if !path.exists() {
            warn!(key = %spec.key, path = %path.display(), "series file missing");
            observations.push(IndicatorObservation::missing(spec.key.clone()));
            continue;
        }
        let points = read_series_file(&path)?;
        debug!(key = %spec.key, points = points.len(), "series loaded");
        observations.push(observe(spec, &points, config.delta_lookback_days, config.trend_window));
    }

    let btc_path = dir.join(BTC_SERIES_FILE);
    let btc = if btc_path.exists() {
        btc_snapshot(&read_series_file(&btc_path)?, config.ma_window)
    } else {
        warn!(path = %btc_path.display(), "BTC series missing, gate will fail closed");
        BtcSnapshot::unavailable()
    };

    Ok(MarketSnapshot { observations, btc })
}
