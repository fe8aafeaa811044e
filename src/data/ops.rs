use log::debug;

use super::error::{Result, SpectrumError};
use super::model::{EchelleSpectrum, FluxUnit};
use super::stats;

/// Detector columns outside this range are noisy on NIRSPEC.
pub const DEFAULT_NOISY_EDGES: (i64, i64) = (10, 1000);
/// Running-median width used as the continuum for outlier rejection.
const OUTLIER_SMOOTHING_WINDOW: usize = 11;
const SIGMA_CLIP_MAX_ITERS: usize = 5;

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

impl EchelleSpectrum {
    /// Divide flux and uncertainty by a scalar carrying `unit`. Mask and metadata are kept.
    pub fn divide(&self, divisor: f64, unit: FluxUnit) -> Result<Self> {
        let mut out = self.clone();
        out.flux_unit = self.flux_unit.divided_by(unit)?;
        out.flux.iter_mut().for_each(|f| *f /= divisor);
        if let Some(unc) = out.uncertainty.as_mut() {
            unc.iter_mut().for_each(|u| *u /= divisor.abs());
        }
        Ok(out)
    }

    /// Element-wise `self - other`.
    ///
    /// Uncertainties add in quadrature, masks are OR-ed, and metadata and
    /// WCS come from `self`.
    pub fn subtract(&self, other: &EchelleSpectrum) -> Result<Self> {
        if other.len() != self.len() {
            return Err(SpectrumError::LengthMismatch {
                field: "subtrahend",
                expected: self.len(),
                found: other.len(),
            });
        }
        if other.flux_unit != self.flux_unit {
            return Err(SpectrumError::UnitMismatch {
                left: self.flux_unit,
                right: other.flux_unit,
            });
        }

        let mut out = self.clone();
        out.flux = self.flux.iter().zip(&other.flux).map(|(a, b)| a - b).collect();
        out.uncertainty = match (&self.uncertainty, &other.uncertainty) {
            (Some(a), Some(b)) => Some(a.iter().zip(b).map(|(a, b)| a.hypot(*b)).collect()),
            (Some(a), None) | (None, Some(a)) => Some(a.clone()),
            (None, None) => None,
        };
        out.mask = match (&self.mask, &other.mask) {
            (Some(a), Some(b)) => Some(a.iter().zip(b).map(|(a, b)| *a || *b).collect()),
            (Some(a), None) | (None, Some(a)) => Some(a.clone()),
            (None, None) => None,
        };
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Sample selection
// ---------------------------------------------------------------------------

impl EchelleSpectrum {
    /// Keep samples where `keep` is true.
    ///
    /// The same selection is applied to every parallel array, to the
    /// per-sample `x_values`, and to the nested sky and flat spectra, so they
    /// stay aligned with the science spectrum.
    pub fn apply_boolean_mask(&self, keep: &[bool]) -> Result<Self> {
        if keep.len() != self.len() {
            return Err(SpectrumError::LengthMismatch {
                field: "selection",
                expected: self.len(),
                found: keep.len(),
            });
        }

        let mut out = self.clone();
        out.wavelength = select(&self.wavelength, keep);
        out.flux = select(&self.flux, keep);
        out.uncertainty = self.uncertainty.as_ref().map(|u| select(u, keep));
        out.mask = self.mask.as_ref().map(|m| select(m, keep));
        out.meta.x_values = self
            .meta
            .x_values
            .as_ref()
            .filter(|x| x.len() == keep.len())
            .map(|x| select(x, keep));
        if let Some(sky) = &self.meta.sky {
            out.meta.sky = Some(Box::new(sky.apply_boolean_mask(keep)?));
        }
        if let Some(flat) = &self.meta.flat {
            out.meta.flat = Some(Box::new(flat.apply_boolean_mask(keep)?));
        }
        Ok(out)
    }

    /// Drop samples whose flux or uncertainty is NaN.
    pub fn remove_nans(&self) -> Result<Self> {
        let keep: Vec<bool> = (0..self.len())
            .map(|i| {
                !self.flux[i].is_nan()
                    && !self.uncertainty.as_ref().is_some_and(|u| u[i].is_nan())
            })
            .collect();
        self.apply_boolean_mask(&keep)
    }

    /// Drop samples whose residual from a running-median continuum is beyond
    /// `threshold` standard deviations (iterative sigma clipping).
    pub fn remove_outliers(&self, threshold: f64) -> Result<Self> {
        let smooth = stats::running_median(&self.flux, OUTLIER_SMOOTHING_WINDOW);
        let residual: Vec<f64> = self.flux.iter().zip(&smooth).map(|(f, s)| f - s).collect();
        let rejected = stats::sigma_clip(&residual, threshold, SIGMA_CLIP_MAX_ITERS);
        debug!(
            "remove_outliers({threshold}): rejecting {} of {} samples",
            rejected.iter().filter(|r| **r).count(),
            self.len()
        );
        let keep: Vec<bool> = rejected.iter().map(|r| !r).collect();
        self.apply_boolean_mask(&keep)
    }

    /// Trim the noisy detector edges, see [`EchelleSpectrum::trim_edges_to`].
    pub fn trim_edges(&self) -> Result<Self> {
        self.trim_edges_to(DEFAULT_NOISY_EDGES)
    }

    /// Keep samples whose detector column lies in `lo..=hi`.
    /// Without `x_values` the sample index stands in for the column.
    pub fn trim_edges_to(&self, (lo, hi): (i64, i64)) -> Result<Self> {
        let keep: Vec<bool> = match &self.meta.x_values {
            Some(x) if x.len() == self.len() => x.iter().map(|&c| (lo..=hi).contains(&c)).collect(),
            _ => (0..self.len() as i64).map(|c| (lo..=hi).contains(&c)).collect(),
        };
        self.apply_boolean_mask(&keep)
    }
}

fn select<T: Copy>(values: &[T], keep: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(v, _)| *v)
        .collect()
}
