//! Subpixel line-center estimation along one column.
//!
//! Input is a run of row indices (ascending, small gaps allowed) with one
//! intensity per index. The estimate never leaves
//! `[first_index - 1, last_index + 1]`.

use serde::{Deserialize, Serialize};

/// How a run is reduced to a single fractional row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefineMethod {
    /// Intensity-weighted centroid.
    Centroid,
    /// 3-point parabola through a clear unimodal peak, centroid otherwise.
    #[default]
    Parabolic,
}

/// Refine a run to a fractional row index. Returns `None` for an empty run.
pub fn refine(indices: &[usize], intensities: &[f32], method: RefineMethod) -> Option<f64> {
    let (&first, &last) = (indices.first()?, indices.last()?);
    let estimate = match method {
        RefineMethod::Centroid => weighted_centroid(indices, intensities)?,
        RefineMethod::Parabolic => parabolic_peak(indices, intensities)
            .or_else(|| weighted_centroid(indices, intensities))?,
    };
    let lo = first as f64 - 1.0;
    let hi = last as f64 + 1.0;
    Some(estimate.clamp(lo, hi))
}

/// `sum(index * weight) / sum(weight)`; plain mean when all weights vanish.
pub fn weighted_centroid(indices: &[usize], weights: &[f32]) -> Option<f64> {
    if indices.is_empty() {
        return None;
    }
    let mut sum_w = 0.0f64;
    let mut sum_iw = 0.0f64;
    for (&i, &w) in indices.iter().zip(weights) {
        let w = f64::from(w.max(0.0));
        sum_w += w;
        sum_iw += i as f64 * w;
    }
    if sum_w > 0.0 {
        Some(sum_iw / sum_w)
    } else {
        Some(indices.iter().map(|&i| i as f64).sum::<f64>() / indices.len() as f64)
    }
}

/// Parabolic interpolation around the strict maximum of a unimodal profile.
///
/// Requires the peak to have direct (gap-free) neighbours on both sides,
/// a non-zero curvature and `|offset| < 1`.
pub fn parabolic_peak(indices: &[usize], intensities: &[f32]) -> Option<f64> {
    if indices.len() < 3 || intensities.len() != indices.len() {
        return None;
    }
    let k = unimodal_peak(intensities)?;
    if k == 0 || k + 1 >= indices.len() {
        return None;
    }
    if indices[k - 1] + 1 != indices[k] || indices[k] + 1 != indices[k + 1] {
        return None;
    }

    let a = f64::from(intensities[k - 1]);
    let b = f64::from(intensities[k]);
    let c = f64::from(intensities[k + 1]);
    let denom = a - 2.0 * b + c;
    if denom == 0.0 {
        return None;
    }
    let offset = (a - c) / (2.0 * denom);
    if !offset.is_finite() || offset.abs() >= 1.0 {
        return None;
    }
    Some(indices[k] as f64 + offset)
}

/// Index of a single strict maximum with non-decreasing values before it and
/// non-increasing values after it.
fn unimodal_peak(values: &[f32]) -> Option<usize> {
    let mut k = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[k] {
            k = i;
        }
    }
    let peak = values[k];
    if values.iter().filter(|&&v| v == peak).count() != 1 {
        return None;
    }
    let rising = values[..=k].windows(2).all(|w| w[0] <= w[1]);
    let falling = values[k..].windows(2).all(|w| w[0] >= w[1]);
    (rising && falling).then_some(k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn centroid_of_flat_run_is_its_middle() {
        let y = refine(&[10, 11, 12], &[255.0; 3], RefineMethod::Centroid).unwrap();
        assert_abs_diff_eq!(y, 11.0);
    }

    #[test]
    fn centroid_follows_weights() {
        let y = weighted_centroid(&[0, 1], &[1.0, 3.0]).unwrap();
        assert_abs_diff_eq!(y, 0.75);
    }

    #[test]
    fn zero_weights_fall_back_to_mean() {
        let y = weighted_centroid(&[4, 6], &[0.0, 0.0]).unwrap();
        assert_abs_diff_eq!(y, 5.0);
    }

    #[test]
    fn parabola_recovers_symmetric_peak() {
        let y = refine(&[3, 4, 5, 6, 7], &[10.0, 50.0, 90.0, 50.0, 10.0], RefineMethod::Parabolic)
            .unwrap();
        assert_abs_diff_eq!(y, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn parabola_shifts_toward_stronger_neighbour() {
        // Samples of -(x - 5.25)^2 + 100 at x = 4, 5, 6.
        let f = |x: f64| (100.0 - (x - 5.25).powi(2)) as f32;
        let y = parabolic_peak(&[4, 5, 6], &[f(4.0), f(5.0), f(6.0)]).unwrap();
        assert_abs_diff_eq!(y, 5.25, epsilon = 1e-4);
    }

    #[test]
    fn plateau_falls_back_to_centroid() {
        assert!(parabolic_peak(&[1, 2, 3, 4], &[5.0, 9.0, 9.0, 5.0]).is_none());
        let y = refine(&[1, 2, 3, 4], &[5.0, 9.0, 9.0, 5.0], RefineMethod::Parabolic).unwrap();
        assert_abs_diff_eq!(y, 2.5);
    }

    #[test]
    fn bimodal_profile_is_not_fitted() {
        assert!(parabolic_peak(&[0, 1, 2, 3, 4], &[1.0, 8.0, 2.0, 6.0, 1.0]).is_none());
    }

    #[test]
    fn peak_next_to_gap_is_not_fitted() {
        assert!(parabolic_peak(&[0, 1, 3], &[1.0, 5.0, 2.0]).is_none());
    }

    #[test]
    fn empty_run_has_no_estimate() {
        assert!(refine(&[], &[], RefineMethod::Parabolic).is_none());
    }
}
