use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{Result, SpectrumError};
use crate::fits::{Header, Wcs};

// ---------------------------------------------------------------------------
// FluxUnit
// ---------------------------------------------------------------------------

/// Unit of the flux axis. NSDRP tables are in detector counts; dividing by a
/// count-valued scalar (normalization) makes the flux dimensionless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FluxUnit {
    #[default]
    Counts,
    Dimensionless,
}

impl fmt::Display for FluxUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluxUnit::Counts => write!(f, "ct"),
            FluxUnit::Dimensionless => write!(f, "dimensionless"),
        }
    }
}

impl FluxUnit {
    /// Unit of `self / divisor`.
    pub fn divided_by(self, divisor: FluxUnit) -> Result<FluxUnit> {
        match (self, divisor) {
            (unit, FluxUnit::Dimensionless) => Ok(unit),
            (FluxUnit::Counts, FluxUnit::Counts) => Ok(FluxUnit::Dimensionless),
            (left, right) => Err(SpectrumError::UnitMismatch { left, right }),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderMeta – typed metadata for one order
// ---------------------------------------------------------------------------

/// Metadata attached to an order. Every key is optional; accessors on
/// [`EchelleSpectrum`] turn an absent key into [`SpectrumError::MissingMetadata`].
#[derive(Debug, Clone, Default)]
pub struct OrderMeta {
    /// Detector column of each sample.
    pub x_values: Option<Vec<i64>>,
    pub pipeline: Option<String>,
    /// Echelle order number.
    pub m: Option<i64>,
    /// Full instrument header from the companion file.
    pub header: Option<Header>,
    pub sky: Option<Box<EchelleSpectrum>>,
    /// Never filled by the NSDRP loader.
    pub flat: Option<Box<EchelleSpectrum>>,
}

// ---------------------------------------------------------------------------
// EchelleSpectrum – one echelle order
// ---------------------------------------------------------------------------

/// Flux versus wavelength for a single echelle order.
///
/// `wavelength`, `flux`, and, when present, `uncertainty` and `mask` always
/// have the same length. Operations never mutate in place; they return a
/// new spectrum.
#[derive(Debug, Clone)]
pub struct EchelleSpectrum {
    /// Wavelength in Ångström.
    pub(crate) wavelength: Vec<f64>,
    pub(crate) flux: Vec<f64>,
    pub(crate) flux_unit: FluxUnit,
    /// One-sigma standard deviation, same unit as `flux`.
    pub(crate) uncertainty: Option<Vec<f64>>,
    /// `true` marks an excluded sample.
    pub(crate) mask: Option<Vec<bool>>,
    pub(crate) wcs: Option<Wcs>,
    pub meta: OrderMeta,
}

impl EchelleSpectrum {
    pub fn new(wavelength: Vec<f64>, flux: Vec<f64>) -> Result<Self> {
        check_len("flux", wavelength.len(), flux.len())?;
        Ok(Self {
            wavelength,
            flux,
            flux_unit: FluxUnit::Counts,
            uncertainty: None,
            mask: None,
            wcs: None,
            meta: OrderMeta::default(),
        })
    }

    pub fn with_uncertainty(mut self, uncertainty: Vec<f64>) -> Result<Self> {
        check_len("uncertainty", self.len(), uncertainty.len())?;
        self.uncertainty = Some(uncertainty);
        Ok(self)
    }

    pub fn with_mask(mut self, mask: Vec<bool>) -> Result<Self> {
        check_len("mask", self.len(), mask.len())?;
        self.mask = Some(mask);
        Ok(self)
    }

    pub fn with_flux_unit(mut self, unit: FluxUnit) -> Self {
        self.flux_unit = unit;
        self
    }

    pub fn with_wcs(mut self, wcs: Option<Wcs>) -> Self {
        self.wcs = wcs;
        self
    }

    pub fn with_meta(mut self, meta: OrderMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn len(&self) -> usize {
        self.flux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn flux_unit(&self) -> FluxUnit {
        self.flux_unit
    }

    pub fn uncertainty(&self) -> Option<&[f64]> {
        self.uncertainty.as_deref()
    }

    pub fn mask(&self) -> Option<&[bool]> {
        self.mask.as_deref()
    }

    pub fn wcs(&self) -> Option<&Wcs> {
        self.wcs.as_ref()
    }

    /// Whether sample `i` is excluded. Spectra without a mask exclude nothing.
    pub fn is_masked(&self, i: usize) -> bool {
        self.mask.as_ref().is_some_and(|m| m[i])
    }

    // -- metadata accessors --

    /// Which pipeline produced this spectrum.
    pub fn pipeline(&self) -> Result<&str> {
        self.meta
            .pipeline
            .as_deref()
            .ok_or(SpectrumError::MissingMetadata("pipeline"))
    }

    /// Echelle order number `m`.
    pub fn order(&self) -> Result<i64> {
        self.meta.m.ok_or(SpectrumError::MissingMetadata("m"))
    }

    pub fn x_values(&self) -> Result<&[i64]> {
        self.meta
            .x_values
            .as_deref()
            .ok_or(SpectrumError::MissingMetadata("x_values"))
    }

    pub fn header(&self) -> Result<&Header> {
        self.meta
            .header
            .as_ref()
            .ok_or(SpectrumError::MissingMetadata("header"))
    }

    /// Sky spectrum recorded alongside the science spectrum.
    pub fn sky(&self) -> Result<&EchelleSpectrum> {
        self.meta
            .sky
            .as_deref()
            .ok_or(SpectrumError::MissingMetadata("sky"))
    }

    /// Flat-field spectrum.
    pub fn flat(&self) -> Result<&EchelleSpectrum> {
        self.meta
            .flat
            .as_deref()
            .ok_or(SpectrumError::MissingMetadata("flat"))
    }
}

fn check_len(field: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(SpectrumError::LengthMismatch {
            field,
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_enforces_equal_lengths() {
        assert!(EchelleSpectrum::new(vec![1.0, 2.0], vec![1.0, 2.0]).is_ok());
        let err = EchelleSpectrum::new(vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            SpectrumError::LengthMismatch {
                field: "flux",
                expected: 2,
                found: 1
            }
        ));

        let spec = EchelleSpectrum::new(vec![1.0, 2.0], vec![1.0, 2.0]).unwrap();
        assert!(spec.clone().with_uncertainty(vec![0.1]).is_err());
        assert!(spec.with_mask(vec![false, true, false]).is_err());
    }

    #[test]
    fn missing_metadata_is_reported_by_key() {
        let spec = EchelleSpectrum::new(vec![1.0], vec![1.0]).unwrap();
        assert!(matches!(spec.pipeline(), Err(SpectrumError::MissingMetadata("pipeline"))));
        assert!(matches!(spec.sky(), Err(SpectrumError::MissingMetadata("sky"))));
        assert!(matches!(spec.flat(), Err(SpectrumError::MissingMetadata("flat"))));
        assert!(matches!(spec.order(), Err(SpectrumError::MissingMetadata("m"))));
    }

    #[test]
    fn mask_defaults_to_unmasked() {
        let spec = EchelleSpectrum::new(vec![1.0, 2.0], vec![1.0, 2.0]).unwrap();
        assert!(!spec.is_masked(1));
        let spec = spec.with_mask(vec![false, true]).unwrap();
        assert!(spec.is_masked(1));
    }

    #[test]
    fn unit_division() {
        assert_eq!(
            FluxUnit::Counts.divided_by(FluxUnit::Counts).unwrap(),
            FluxUnit::Dimensionless
        );
        assert_eq!(
            FluxUnit::Counts.divided_by(FluxUnit::Dimensionless).unwrap(),
            FluxUnit::Counts
        );
        assert!(FluxUnit::Dimensionless.divided_by(FluxUnit::Counts).is_err());
    }
}
