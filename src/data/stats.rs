//! Robust statistics used by normalization and outlier rejection.

/// Median ignoring NaN samples. Returns NaN when nothing is left.
pub fn nanmedian(values: &[f64]) -> f64 {
    let mut valid: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    valid.sort_by(f64::total_cmp);

    let mid = valid.len() / 2;
    if valid.len() % 2 == 0 {
        (valid[mid - 1] + valid[mid]) / 2.0
    } else {
        valid[mid]
    }
}

/// Population standard deviation of the given samples.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Iterative sigma clipping around the median.
///
/// Returns a rejection mask (`true` = clipped). NaN samples are always
/// rejected. Iterates until no new samples are rejected or `max_iters`
/// rounds have run.
pub fn sigma_clip(values: &[f64], sigma: f64, max_iters: usize) -> Vec<bool> {
    let mut rejected: Vec<bool> = values.iter().map(|v| v.is_nan()).collect();

    for _ in 0..max_iters {
        let kept: Vec<f64> = values
            .iter()
            .zip(&rejected)
            .filter(|(_, r)| !**r)
            .map(|(&v, _)| v)
            .collect();
        if kept.is_empty() {
            break;
        }
        let center = nanmedian(&kept);
        let spread = std_dev(&kept);
        if !spread.is_finite() || spread == 0.0 {
            break;
        }

        let limit = sigma * spread;
        let mut changed = false;
        for (v, r) in values.iter().zip(rejected.iter_mut()) {
            if !*r && (v - center).abs() > limit {
                *r = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    rejected
}

/// Running median with an odd `window`, shrinking at the edges.
pub fn running_median(values: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            nanmedian(&values[lo..hi])
        })
        .collect()
}
