//! Calendar-window deltas, acceleration, moving averages, and trend fits.
//!
//! Deltas look back a number of elapsed days, not a number of samples, so a
//! weekly series and a daily series over the same window compare the same
//! span of time.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::SeriesTrend;

/// Normalised slope beyond which a fitted trend counts as up or down.
pub const TREND_THRESHOLD: f64 = 0.02;

/// One dated observation of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Sort points by date, keeping the last value for duplicate dates.
pub fn normalize(points: &mut Vec<SeriesPoint>) {
    points.sort_by_key(|p| p.date);
    points.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            earlier.value = later.value;
            true
        } else {
            false
        }
    });
}

/// Fractional change from the last point dated on or before
/// `latest.date - days` to the latest point.
///
/// Expects points sorted by date. Returns `None` for an empty series, no
/// point old enough, a zero past value, or a non-finite value.
pub fn calendar_delta(points: &[SeriesPoint], days: u32) -> Option<f64> {
    let current = points.last()?;
    let target = current.date.checked_sub_signed(Duration::days(i64::from(days)))?;
    let past = points.iter().rev().find(|p| p.date <= target)?;

    if past.value == 0.0 || !past.value.is_finite() || !current.value.is_finite() {
        return None;
    }
    Some((current.value - past.value) / past.value.abs())
}

/// Current window delta minus the delta of the window that ended at the cutoff.
///
/// Needs at least two points on or before the cutoff.
pub fn acceleration(points: &[SeriesPoint], days: u32) -> Option<f64> {
    let current_delta = calendar_delta(points, days)?;
    let cutoff = points
        .last()?
        .date
        .checked_sub_signed(Duration::days(i64::from(days)))?;
    let earlier: Vec<SeriesPoint> = points.iter().copied().filter(|p| p.date <= cutoff).collect();
    if earlier.len() < 2 {
        return None;
    }
    let previous_delta = calendar_delta(&earlier, days)?;
    Some(current_delta - previous_delta)
}

/// Simple moving average of the last `window` values.
///
/// `None` when there are fewer than `window` values or any value in the
/// window is not finite.
pub fn moving_average(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    if tail.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// Trend of the last `window` points from an ordinary least-squares fit.
///
/// The slope per sample is scaled by `window / |mean|`, so the threshold
/// reads as a fractional move across the whole window. A zero mean is flat.
/// `None` with fewer than `window` points, a window under 2, or a non-finite
/// value in the window.
pub fn series_trend(points: &[SeriesPoint], window: usize) -> Option<SeriesTrend> {
    if window < 2 || points.len() < window {
        return None;
    }
    let tail = &points[points.len() - window..];
    if tail.iter().any(|p| !p.value.is_finite()) {
        return None;
    }

    let n = window as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = tail.iter().map(|p| p.value).sum::<f64>() / n;
    if mean_y == 0.0 {
        return Some(SeriesTrend::Flat);
    }

    let (mut cov, mut var) = (0.0, 0.0);
    for (i, p) in tail.iter().enumerate() {
        let dx = i as f64 - mean_x;
        cov += dx * (p.value - mean_y);
        var += dx * dx;
    }
    let normalized = cov / var / mean_y.abs() * n;

    Some(if normalized > TREND_THRESHOLD {
        SeriesTrend::Up
    } else if normalized < -TREND_THRESHOLD {
        SeriesTrend::Down
    } else {
        SeriesTrend::Flat
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekly(values: &[f64]) -> Vec<SeriesPoint> {
        let start = d(2024, 1, 3);
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint::new(start + Duration::days(7 * i as i64), v))
            .collect()
    }

    fn daily(values: &[f64]) -> Vec<SeriesPoint> {
        let start = d(2024, 1, 1);
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint::new(start + Duration::days(i as i64), v))
            .collect()
    }

    #[test]
    fn weekly_delta_uses_elapsed_days() {
        // Five weekly samples: the point 28 days before the last is index 0.
        let pts = weekly(&[100.0, 101.0, 102.0, 103.0, 110.0]);
        let delta = calendar_delta(&pts, 28).unwrap();
        assert!((delta - 0.10).abs() < EPS);
    }

    #[test]
    fn daily_delta_over_same_window() {
        let values: Vec<f64> = (0..29).map(|i| 100.0 + i as f64).collect();
        let pts = daily(&values);
        let delta = calendar_delta(&pts, 28).unwrap();
        assert!((delta - 0.28).abs() < EPS);
    }

    #[test]
    fn gap_picks_last_point_before_target() {
        let pts = vec![
            SeriesPoint::new(d(2024, 1, 1), 50.0),
            SeriesPoint::new(d(2024, 1, 10), 80.0),
            SeriesPoint::new(d(2024, 2, 20), 100.0),
        ];
        // Target is 2024-01-23; last point on or before it is 2024-01-10.
        let delta = calendar_delta(&pts, 28).unwrap();
        assert!((delta - 0.25).abs() < EPS);
    }

    #[test]
    fn delta_none_when_history_too_short_or_zero() {
        assert_eq!(calendar_delta(&daily(&[1.0, 2.0, 3.0]), 28), None);
        assert_eq!(calendar_delta(&[], 28), None);
        let mut pts = daily(&[0.0; 30]);
        pts.last_mut().unwrap().value = 5.0;
        assert_eq!(calendar_delta(&pts, 28), None);
    }

    #[test]
    fn delta_uses_absolute_past_value() {
        let pts = vec![
            SeriesPoint::new(d(2024, 1, 1), -2.0),
            SeriesPoint::new(d(2024, 2, 1), -1.0),
        ];
        let delta = calendar_delta(&pts, 28).unwrap();
        assert!((delta - 0.5).abs() < EPS);
    }

    #[test]
    fn acceleration_compares_consecutive_windows() {
        // 100 -> 110 over the first window, 110 -> 132 over the second.
        let pts = vec![
            SeriesPoint::new(d(2024, 1, 1), 100.0),
            SeriesPoint::new(d(2024, 1, 29), 110.0),
            SeriesPoint::new(d(2024, 2, 26), 132.0),
        ];
        let accel = acceleration(&pts, 28).unwrap();
        assert!((accel - (0.20 - 0.10)).abs() < EPS);
    }

    #[test]
    fn acceleration_needs_two_earlier_points() {
        let pts = vec![
            SeriesPoint::new(d(2024, 1, 1), 100.0),
            SeriesPoint::new(d(2024, 2, 1), 110.0),
        ];
        assert_eq!(acceleration(&pts, 28), None);
    }

    #[test]
    fn oversized_lookback_returns_none() {
        let pts = daily(&[1.0, 2.0, 3.0]);
        assert_eq!(calendar_delta(&pts, u32::MAX), None);
        assert_eq!(acceleration(&pts, u32::MAX), None);

        let early = vec![
            SeriesPoint::new(NaiveDate::MIN, 1.0),
            SeriesPoint::new(NaiveDate::MIN + Duration::days(3), 2.0),
        ];
        assert_eq!(calendar_delta(&early, 28), None);
    }

    #[test]
    fn trend_up_down_and_flat() {
        let rising: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert_eq!(series_trend(&daily(&rising), 14), Some(SeriesTrend::Up));

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        assert_eq!(series_trend(&daily(&falling), 14), Some(SeriesTrend::Down));

        // 0.01 per sample on a mean near 100: 0.0014 over 14 samples.
        let drifting: Vec<f64> = (0..14).map(|i| 100.0 + 0.01 * i as f64).collect();
        assert_eq!(series_trend(&daily(&drifting), 14), Some(SeriesTrend::Flat));
    }

    #[test]
    fn trend_uses_only_the_window_tail() {
        // Long decline, then eight rising weekly prints.
        let mut values: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        values.extend((0..8).map(|i| 181.0 + 2.0 * i as f64));
        assert_eq!(series_trend(&weekly(&values), 8), Some(SeriesTrend::Up));
    }

    #[test]
    fn trend_zero_mean_is_flat() {
        let values = [-3.0, -1.0, 1.0, 3.0];
        assert_eq!(series_trend(&daily(&values), 4), Some(SeriesTrend::Flat));
    }

    #[test]
    fn trend_needs_a_full_window() {
        assert_eq!(series_trend(&daily(&[1.0, 2.0, 3.0]), 14), None);
        assert_eq!(series_trend(&daily(&[1.0, 2.0, 3.0]), 1), None);
        assert_eq!(series_trend(&daily(&[1.0, f64::NAN, 3.0]), 3), None);
    }

    #[test]
    fn moving_average_of_tail() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((moving_average(&values, 3).unwrap() - 4.0).abs() < EPS);
        assert!((moving_average(&values, 5).unwrap() - 3.0).abs() < EPS);
        assert_eq!(moving_average(&values, 6), None);
        assert_eq!(moving_average(&values, 0), None);
    }

    #[test]
    fn moving_average_rejects_nan_in_window() {
        let values = [1.0, f64::NAN, 3.0, 4.0];
        assert_eq!(moving_average(&values, 3), None);
        assert!(moving_average(&values, 2).is_some());
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let mut pts = vec![
            SeriesPoint::new(d(2024, 1, 3), 3.0),
            SeriesPoint::new(d(2024, 1, 1), 1.0),
            SeriesPoint::new(d(2024, 1, 3), 4.0),
        ];
        normalize(&mut pts);
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0].date, d(2024, 1, 1));
        assert_eq!(pts[1].value, 4.0);
    }
}
