//! Outlier-robust, edge- and peak-protected smoothing of calibrated values.
//!
//! `Conservative` runs in three steps:
//! 1. outlier rejection: points far from the local quadratic fit (beyond the
//!    chosen percentile of residuals and a noise-scaled floor) are replaced
//!    by their centered moving median,
//! 2. local quadratic (Savitzky-Golay) smoothing blended with the cleaned
//!    values by a weight ramping 0 -> 1 over the first and last edge points,
//! 3. global extrema keep their corrected value through both steps and are
//!    left out of every fit.
//!
//! A series whose residuals against its own fit are negligible is returned
//! unchanged, which makes the smoother idempotent on clean curves.

use crate::mapper::value_to_y;
use chart_trace_core::{CalibratedSeries, CalibrationFrame, Extrema, FULL_SCALE};
use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smoothing strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMode {
    /// Outlier rejection against the local fit followed by an edge-blended
    /// local polynomial.
    #[default]
    Conservative,
    /// Short moving mean that leaves prominent peaks and valleys untouched.
    PeakProtectedMean,
    /// Pass values through unchanged.
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    pub mode: SmoothingMode,
    /// Upper bound on the moving-median width; also capped at `n / 3`.
    pub median_window: usize,
    /// Percentile of local-fit residuals above which a point is an outlier.
    pub outlier_percentile: f64,
    /// Deviations at or below this value are never treated as outliers.
    pub outlier_floor: f64,
    /// Deviations within this many robust standard deviations of the local
    /// fit are never treated as outliers.
    pub outlier_sigma: f64,
    /// Robust residual scale at or below which a series counts as already
    /// smooth and is returned unchanged.
    pub flat_tolerance: f64,
    /// Upper bound on the polynomial window; also capped near `n / 2`.
    pub savgol_window: usize,
    pub savgol_order: usize,
    /// Fraction of points at each end over which smoothing fades in.
    pub edge_fraction: f64,
    /// Minimum number of fade-in points at each end.
    pub min_edge: usize,
    /// Window of `PeakProtectedMean`.
    pub mean_window: usize,
    /// Peak/valley prominence protected by `PeakProtectedMean`.
    pub min_prominence: f64,
    /// Keep the mapper's global max/min untouched.
    pub protect_extrema: bool,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            mode: SmoothingMode::Conservative,
            median_window: 21,
            outlier_percentile: 95.0,
            outlier_floor: 1.0,
            outlier_sigma: 5.0,
            flat_tolerance: 1.0,
            savgol_window: 11,
            savgol_order: 2,
            edge_fraction: 0.1,
            min_edge: 5,
            mean_window: 5,
            min_prominence: 500.0,
            protect_extrema: true,
        }
    }
}

/// Denoises a calibrated series, preserving `x` and the point count.
#[derive(Clone, Debug, Default)]
pub struct Smoother {
    params: SmoothingParams,
}

impl Smoother {
    pub fn new(params: SmoothingParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &SmoothingParams {
        &self.params
    }

    /// Smooth `series`. Each output `y` is re-derived from its smoothed value
    /// so that `value == y_to_value(y)` keeps holding.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, series, frame), fields(points = series.len()))
    )]
    pub fn smooth(&self, series: &CalibratedSeries, frame: &CalibrationFrame) -> CalibratedSeries {
        let values = series.values();
        let protected = if self.params.protect_extrema {
            series.extrema
        } else {
            None
        };

        let smoothed = self.smooth_values(&values, protected);

        let points = series
            .points
            .iter()
            .zip(&smoothed)
            .map(|(p, &v)| {
                let mut q = *p;
                if v != p.value {
                    q.value = v;
                    q.y = value_to_y(v, frame);
                }
                q
            })
            .collect();

        CalibratedSeries {
            points,
            extrema: series.extrema,
        }
    }

    /// Smooth a bare value sequence. Indices in `protected` are kept as-is.
    pub fn smooth_values(&self, values: &[f64], protected: Option<Extrema>) -> Vec<f64> {
        let is_protected = |i: usize| protected.is_some_and(|e| e.contains(i));
        let out = match self.params.mode {
            SmoothingMode::Disabled => values.to_vec(),
            SmoothingMode::Conservative => self.conservative(values, &is_protected),
            SmoothingMode::PeakProtectedMean => self.peak_protected_mean(values, &is_protected),
        };
        out.into_iter()
            .map(|v| v.clamp(-FULL_SCALE, FULL_SCALE))
            .collect()
    }

    fn conservative(&self, values: &[f64], is_protected: &dyn Fn(usize) -> bool) -> Vec<f64> {
        let n = values.len();
        if n < 5 {
            return values.to_vec();
        }
        let p = &self.params;

        let window = p.savgol_window.min(n / 4 * 2 + 1);
        let window = if window % 2 == 0 {
            window.saturating_sub(1)
        } else {
            window
        };
        if window < 5 || window <= p.savgol_order {
            return values.to_vec();
        }

        let fit = local_fit(values, window, p.savgol_order, is_protected);
        let (cleaned, replaced) = reject_outliers(
            values,
            &fit,
            odd_window(p.median_window.min(n / 3)),
            p,
            is_protected,
        );
        let fitted = if replaced > 0 {
            local_fit(&cleaned, window, p.savgol_order, is_protected)
        } else {
            fit
        };

        // A series already following its local fit is left as-is.
        let residuals: Vec<f64> = (0..n)
            .filter(|&i| !is_protected(i))
            .map(|i| cleaned[i] - fitted[i])
            .collect();
        let noise = robust_sigma(&residuals);
        if noise <= p.flat_tolerance {
            debug!("series already smooth (noise {noise:.3}), smoothing skipped");
            return cleaned;
        }

        let edge = p.min_edge.max((n as f64 * p.edge_fraction) as usize).max(1);
        (0..n)
            .map(|i| {
                if is_protected(i) {
                    return cleaned[i];
                }
                let w = (i.min(n - 1 - i) as f64 / edge as f64).min(1.0);
                cleaned[i] * (1.0 - w) + fitted[i] * w
            })
            .collect()
    }

    fn peak_protected_mean(&self, values: &[f64], is_protected: &dyn Fn(usize) -> bool) -> Vec<f64> {
        let n = values.len();
        if n < 10 {
            return values.to_vec();
        }
        let half = self.params.mean_window / 2;
        let peaks = prominent_peaks(values, self.params.min_prominence);
        let negated: Vec<f64> = values.iter().map(|v| -v).collect();
        let valleys = prominent_peaks(&negated, self.params.min_prominence);

        (0..n)
            .map(|i| {
                if is_protected(i) || peaks.contains(&i) || valleys.contains(&i) {
                    return values[i];
                }
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(n);
                values[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
            })
            .collect()
    }
}

fn odd_window(w: usize) -> usize {
    if w % 2 == 0 {
        w + 1
    } else {
        w
    }
}

/// Replace points far from the local fit by their local median.
///
/// The cut is the largest of the chosen percentile of all residuals, the
/// absolute floor and `outlier_sigma` robust standard deviations, so a
/// noise-free curve never loses a point.
fn reject_outliers(
    values: &[f64],
    fit: &[f64],
    median_window: usize,
    p: &SmoothingParams,
    is_protected: &dyn Fn(usize) -> bool,
) -> (Vec<f64>, usize) {
    let n = values.len();
    let free: Vec<usize> = (0..n).filter(|&i| !is_protected(i)).collect();
    let residuals: Vec<f64> = free.iter().map(|&i| values[i] - fit[i]).collect();
    let deviations: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
    let threshold = percentile_of(&deviations, p.outlier_percentile)
        .max(p.outlier_floor)
        .max(p.outlier_sigma * robust_sigma(&residuals));

    let half = median_window / 2;
    let mut cleaned = values.to_vec();
    let mut replaced = 0usize;
    for (&i, &d) in free.iter().zip(&deviations) {
        if d > threshold {
            let r = half.min(i).min(n - 1 - i);
            cleaned[i] = median(&values[i - r..=i + r]);
            replaced += 1;
        }
    }
    debug!("outlier rejection replaced {replaced} of {n} points (threshold {threshold:.1})");
    (cleaned, replaced)
}

/// `1.4826 * MAD`, a standard-deviation estimate insensitive to outliers.
fn robust_sigma(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    let abs: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
    1.4826 * median(&abs)
}

fn median(window: &[f64]) -> f64 {
    let mut sorted = window.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let m = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[m]
    } else {
        0.5 * (sorted[m - 1] + sorted[m])
    }
}

/// Linear-interpolated percentile (`q` in `[0, 100]`).
fn percentile_of(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Savitzky-Golay style local polynomial fit.
///
/// Each sample is replaced by the value at its own position of a
/// least-squares polynomial over `window` neighbours; the window is shifted
/// inward at both ends. Samples for which `skip` holds take no part in any
/// fit. Windows without enough samples keep their input value.
fn local_fit(values: &[f64], window: usize, order: usize, skip: &dyn Fn(usize) -> bool) -> Vec<f64> {
    let n = values.len();
    if window > n {
        return values.to_vec();
    }
    let half = window / 2;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half).min(n - window);
            let samples: Vec<(f64, f64)> = (lo..lo + window)
                .filter(|&j| !skip(j))
                .map(|j| (j as f64 - i as f64, values[j]))
                .collect();
            if samples.len() <= order {
                return values[i];
            }
            let a = DMatrix::from_fn(samples.len(), order + 1, |r, k| samples[r].0.powi(k as i32));
            let b = DVector::from_iterator(samples.len(), samples.iter().map(|s| s.1));
            let at = a.transpose();
            match (&at * &a).try_inverse() {
                // Coefficient 0 is the fitted value at t = 0.
                Some(inv) => (inv * at * b)[0],
                None => values[i],
            }
        })
        .collect()
}

/// Indices of strict local maxima whose prominence reaches `min_prominence`.
fn prominent_peaks(values: &[f64], min_prominence: f64) -> Vec<usize> {
    let n = values.len();
    let mut peaks = Vec::new();
    for i in 1..n.saturating_sub(1) {
        let v = values[i];
        if !(values[i - 1] < v && v > values[i + 1]) {
            continue;
        }
        let mut left_min = v;
        for &u in values[..i].iter().rev() {
            if u > v {
                break;
            }
            left_min = left_min.min(u);
        }
        let mut right_min = v;
        for &u in &values[i + 1..] {
            if u > v {
                break;
            }
            right_min = right_min.min(u);
        }
        if v - left_min.max(right_min) >= min_prominence {
            peaks.push(i);
        }
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::mapper::ValueMapper;
    use chart_trace_core::{CalibratedPoint, RawPoint, RawSeries};

    fn frame() -> CalibrationFrame {
        CalibrationFrame {
            start_x: 0,
            end_x: 400,
            top_y: 29,
            bottom_y: 520,
            zero_y: 274,
        }
    }

    fn series(values: &[f64]) -> CalibratedSeries {
        let f = frame();
        CalibratedSeries {
            points: values
                .iter()
                .enumerate()
                .map(|(i, &v)| CalibratedPoint {
                    x: i as i32,
                    y: value_to_y(v, &f),
                    value: v,
                })
                .collect(),
            extrema: None,
        }
    }

    #[test]
    fn median_and_percentile_match_reference() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_abs_diff_eq!(percentile_of(&[0.0, 10.0, 20.0, 30.0, 40.0], 95.0), 38.0);
    }

    #[test]
    fn local_fit_preserves_quadratics() {
        let v: Vec<f64> = (0..40).map(|i| 0.5 * (i as f64).powi(2) - 3.0 * i as f64).collect();
        let s = local_fit(&v, 11, 2, &|_| false);
        for (a, b) in v.iter().zip(&s) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn single_spike_is_replaced() {
        let mut v = vec![1000.0; 60];
        v[30] = 9000.0;
        let out = Smoother::default().smooth_values(&v, None);
        assert_abs_diff_eq!(out[30], 1000.0, epsilon = 1e-6);
        assert!(out.iter().all(|x| (x - 1000.0).abs() < 1e-6));
    }

    #[test]
    fn ramp_is_a_fixed_point() {
        let v: Vec<f64> = (0..120).map(|i| -6000.0 + 100.0 * i as f64).collect();
        let s = series(&v);
        let smoother = Smoother::default();
        let once = smoother.smooth(&s, &frame());
        let twice = smoother.smooth(&once, &frame());
        for ((a, b), c) in s.points.iter().zip(&once.points).zip(&twice.points) {
            assert_eq!(a.x, b.x);
            assert_abs_diff_eq!(a.value, b.value, epsilon = 1e-3);
            assert_abs_diff_eq!(b.value, c.value, epsilon = 1e-3);
        }
    }

    fn chart_frame() -> CalibrationFrame {
        CalibrationFrame {
            start_x: 36,
            end_x: 620,
            top_y: 29,
            bottom_y: 520,
            zero_y: 274,
        }
    }

    fn assert_smoothing_settles(row: impl Fn(f64) -> f64) {
        let f = chart_frame();
        let raw = RawSeries {
            points: (36..620).map(|x| RawPoint { x, y: row(x as f64) }).collect(),
        };
        let mapped = ValueMapper::default().map(&raw, &f);
        let smoother = Smoother::default();
        let once = smoother.smooth(&mapped, &f);
        let twice = smoother.smooth(&once, &f);
        for ((m, a), b) in mapped.points.iter().zip(&once.points).zip(&twice.points) {
            assert_abs_diff_eq!(m.value, a.value, epsilon = 1e-3);
            assert_abs_diff_eq!(a.value, b.value, epsilon = 1e-3);
        }
    }

    #[test]
    fn clean_sine_is_a_fixed_point() {
        assert_smoothing_settles(|x| 274.0 - 120.0 * (x / 60.0).sin());
    }

    #[test]
    fn clean_parabola_is_a_fixed_point() {
        assert_smoothing_settles(|x| 100.0 + 0.001 * (x - 300.0).powi(2));
    }

    #[test]
    fn noisy_curve_is_smoothed() {
        let v: Vec<f64> = (0..200)
            .map(|i| 8000.0 * (i as f64 / 30.0).sin() + if i % 2 == 0 { 200.0 } else { -200.0 })
            .collect();
        let out = Smoother::default().smooth_values(&v, None);
        let changed = v.iter().zip(&out).filter(|(a, b)| (*a - *b).abs() > 50.0).count();
        assert!(changed > 100, "only {changed} points changed");
        for i in 30..170 {
            assert!((out[i] - 8000.0 * (i as f64 / 30.0).sin()).abs() < 100.0);
        }
    }

    #[test]
    fn endpoints_are_left_untouched() {
        let v: Vec<f64> = (0..100)
            .map(|i| 3000.0 * (i as f64 / 7.0).sin() + if i % 2 == 0 { 150.0 } else { -150.0 })
            .collect();
        let out = Smoother::default().smooth_values(&v, None);
        assert_eq!(out.len(), v.len());
        assert_eq!(out[0], v[0]);
        assert_eq!(out[99], v[99]);
    }

    #[test]
    fn protected_extrema_survive_both_steps() {
        let mut v = vec![0.0; 80];
        v[40] = 30000.0;
        v[60] = -12000.0;
        let e = Extrema {
            max_index: 40,
            min_index: 60,
        };
        let out = Smoother::default().smooth_values(&v, Some(e));
        assert_eq!(out[40], 30000.0);
        assert_eq!(out[60], -12000.0);

        let unprotected = Smoother::default().smooth_values(&v, None);
        assert!(unprotected[40] < 30000.0);
    }

    #[test]
    fn peak_protected_mean_keeps_prominent_peak() {
        let mut v: Vec<f64> = (0..40).map(|i| 10.0 * i as f64).collect();
        v[20] = 5000.0;
        let smoother = Smoother::new(SmoothingParams {
            mode: SmoothingMode::PeakProtectedMean,
            ..SmoothingParams::default()
        });
        let out = smoother.smooth_values(&v, None);
        assert_eq!(out[20], 5000.0);
        assert_abs_diff_eq!(out[5], 50.0, epsilon = 1e-9);
    }

    #[test]
    fn disabled_mode_is_identity_but_clamps() {
        let smoother = Smoother::new(SmoothingParams {
            mode: SmoothingMode::Disabled,
            ..SmoothingParams::default()
        });
        let out = smoother.smooth_values(&[1.0, 40000.0, -40000.0], None);
        assert_eq!(out, [1.0, 30000.0, -30000.0]);
    }

    #[test]
    fn short_series_pass_through() {
        let out = Smoother::default().smooth_values(&[5.0, 900.0, 5.0], None);
        assert_eq!(out, [5.0, 900.0, 5.0]);
    }
}
