use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use super::config::LoaderConfig;
use super::error::{Result, SpectrumError};
use super::model::{EchelleSpectrum, OrderMeta};
use crate::fits::{FitsFile, Header, HeaderValue, Wcs};

// ---------------------------------------------------------------------------
// Instrument / pipeline constants
// ---------------------------------------------------------------------------

pub const PIPELINE: &str = "NSDRP";
pub const SITE_NAME: &str = "Keck Observatory";
/// Spectra stored next to the science spectrum in every order.
pub const ANCILLARY_SPECTRA: [&str; 1] = ["sky"];
pub const DEFAULT_RESOLUTION: f64 = 20_000.0;

const FILE_PREFIX: &str = "NS.";
const FLUX_TABLE_SUFFIX: &str = "_flux_tbl.fits";

const COL_WAVELENGTH: &str = "wave (A)";
const COL_FLUX: &str = "flux (cnts)";
const COL_NOISE: &str = "noise (cnts)";
const COL_SKY: &str = "sky (cnts)";
const COL_PIXEL: &str = "col";

/// MJD of the Unix epoch (1970-01-01T00:00:00 UTC).
const MJD_UNIX_EPOCH: f64 = 40_587.0;

// ---------------------------------------------------------------------------
// File naming
// ---------------------------------------------------------------------------

/// Check an NSDRP flux-table file name and return its echelle order number.
///
/// The name must look like `NS.<date>.<frame>_<mm>_flux_tbl.fits`; the order
/// is the two characters before `_flux`.
pub fn parse_order_number(path: &Path) -> Result<i64> {
    let basename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SpectrumError::UnsupportedFormat(path.display().to_string()))?;

    if !basename.starts_with(FILE_PREFIX) {
        return Err(SpectrumError::UnsupportedFormat(format!(
            "{basename}: only NSDRP spectra are supported"
        )));
    }
    if !basename.contains(FLUX_TABLE_SUFFIX) {
        return Err(SpectrumError::UnsupportedFormat(format!(
            "{basename}: only fits table files are supported"
        )));
    }

    let stem = basename.split("_flux").next().unwrap_or(basename);
    let digits = stem
        .char_indices()
        .rev()
        .nth(1)
        .map(|(i, _)| &stem[i..])
        .ok_or_else(|| SpectrumError::InvalidOrderNumber(basename.to_string()))?;
    digits
        .parse::<i64>()
        .map_err(|_| SpectrumError::InvalidOrderNumber(basename.to_string()))
}

/// Path of the full-header FITS file that NSDRP writes next to the flux table:
/// `.../fitstbl/..._flux_tbl.fits` → `.../fits/..._flux.fits`.
pub fn companion_header_path(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    PathBuf::from(
        text.replace("/fitstbl/", "/fits/")
            .replace("_flux_tbl.", "_flux."),
    )
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl EchelleSpectrum {
    /// Load one order from an NSDRP `*_flux_tbl.fits` file.
    ///
    /// The returned spectrum carries the sky spectrum under `meta.sky`, and
    /// the instrument header and WCS when the companion file exists.
    pub fn from_nsdrp_file(path: &Path, config: &LoaderConfig) -> Result<Self> {
        let order = parse_order_number(path)?;
        if !path.exists() {
            return Err(SpectrumError::FileNotFound(path.to_path_buf()));
        }

        let fits_err = |source| SpectrumError::Fits {
            path: path.to_path_buf(),
            source,
        };
        let fits = FitsFile::open(path).map_err(fits_err)?;
        let table = fits.bintable(1).map_err(fits_err)?;

        let wavelength = table.read_f64(COL_WAVELENGTH).map_err(fits_err)?;
        let flux = table.read_f64(COL_FLUX).map_err(fits_err)?;
        let uncertainty = table.read_f64(COL_NOISE).map_err(fits_err)?;
        let sky_flux = table.read_f64(COL_SKY).map_err(fits_err)?;
        let x_values = table.read_i64(COL_PIXEL).map_err(fits_err)?;

        let mask: Vec<bool> = flux
            .iter()
            .zip(&uncertainty)
            .map(|(f, u)| f.is_nan() || u.is_nan() || *u <= 0.0)
            .collect();

        let header = if config.read_companion_header {
            read_companion_header(path)?
        } else {
            None
        };
        let wcs = header.as_ref().map(Wcs::from_header);

        let meta = OrderMeta {
            x_values: Some(x_values),
            pipeline: Some(PIPELINE.to_string()),
            m: Some(order),
            header,
            sky: None,
            flat: None,
        };

        let sky = EchelleSpectrum::new(wavelength.clone(), sky_flux)?
            .with_uncertainty(uncertainty.clone())?
            .with_mask(mask.clone())?
            .with_meta(meta.clone());

        let mut spectrum = EchelleSpectrum::new(wavelength, flux)?
            .with_uncertainty(uncertainty)?
            .with_mask(mask)?
            .with_wcs(wcs)
            .with_meta(meta);
        spectrum.meta.sky = Some(Box::new(sky));

        debug!(
            "{}: order {order}, {} samples, {} masked",
            path.display(),
            spectrum.len(),
            spectrum.mask().map_or(0, |m| m.iter().filter(|b| **b).count())
        );
        Ok(spectrum)
    }
}

/// Primary header of the companion file, or `None` when there is none.
fn read_companion_header(path: &Path) -> Result<Option<Header>> {
    let companion = companion_header_path(path);
    if companion == path || !companion.exists() {
        debug!("no companion header for {}", path.display());
        return Ok(None);
    }
    let fits = FitsFile::open(&companion).map_err(|source| SpectrumError::Fits {
        path: companion.clone(),
        source,
    })?;
    info!("read header from {}", companion.display());
    Ok(Some(fits.primary_header().clone()))
}

// ---------------------------------------------------------------------------
// Header-derived quantities
// ---------------------------------------------------------------------------

/// Right ascension in hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourAngle(pub f64);

impl HourAngle {
    pub fn to_degrees(self) -> f64 {
        self.0 * 15.0
    }
}

impl fmt::Display for HourAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} hourangle", self.0)
    }
}

/// Declination in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Degrees(pub f64);

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} deg", self.0)
    }
}

impl EchelleSpectrum {
    /// Right ascension from the `RA` header card (decimal hours or `hh:mm:ss`).
    pub fn ra(&self) -> Result<HourAngle> {
        angle_from_header(self.header()?, "RA").map(HourAngle)
    }

    /// Declination from the `DEC` header card (decimal degrees or `±dd:mm:ss`).
    pub fn dec(&self) -> Result<Degrees> {
        angle_from_header(self.header()?, "DEC").map(Degrees)
    }

    /// Start of the exposure, from `MJD-OBS` (UTC).
    pub fn observation_time(&self) -> Result<DateTime<Utc>> {
        let header = self.header()?;
        let value = header
            .get("MJD-OBS")
            .ok_or_else(|| SpectrumError::MissingHeaderKey("MJD-OBS".into()))?;
        let mjd = value.as_f64().ok_or_else(|| invalid("MJD-OBS", value))?;
        mjd_to_utc(mjd).ok_or_else(|| invalid("MJD-OBS", value))
    }

    /// Subtract the sky spectrum.
    ///
    /// NSDRP output is already sky subtracted, so without `force` this logs
    /// an error and returns the spectrum unchanged.
    pub fn sky_subtract(&self, force: bool) -> Result<Self> {
        if force {
            warn!(
                "NIRSPEC data are already natively sky subtracted! \
                 Proceeding with a forced sky subtraction anyways..."
            );
            self.subtract(self.sky()?)
        } else {
            error!(
                "NIRSPEC data are already natively sky subtracted! \
                 To proceed anyway, pass force = true."
            );
            Ok(self.clone())
        }
    }
}

fn invalid(key: &str, value: &HeaderValue) -> SpectrumError {
    SpectrumError::InvalidHeaderValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn angle_from_header(header: &Header, key: &str) -> Result<f64> {
    let value = header
        .get(key)
        .ok_or_else(|| SpectrumError::MissingHeaderKey(key.to_string()))?;
    let angle = match value {
        HeaderValue::String(s) => parse_sexagesimal(s),
        other => other.as_f64(),
    };
    angle.ok_or_else(|| invalid(key, value))
}

/// Parse `12:34:56.7`, `-05 06 07`, or a plain decimal into decimal units.
pub fn parse_sexagesimal(text: &str) -> Option<f64> {
    let text = text.trim();
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };

    let parts: Vec<f64> = body
        .split([':', ' '])
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<f64>().ok())
        .collect::<Option<_>>()?;
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let value = parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(p, div)| p / div)
        .sum::<f64>();
    Some(sign * value)
}

/// Convert a Modified Julian Date to a UTC timestamp with microsecond rounding.
pub fn mjd_to_utc(mjd: f64) -> Option<DateTime<Utc>> {
    if !mjd.is_finite() {
        return None;
    }
    let micros = ((mjd - MJD_UNIX_EPOCH) * 86_400.0 * 1e6).round();
    if micros.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn order_number_from_basename() {
        let p = Path::new("/data/fitstbl/NS.20100512.49520_63_flux_tbl.fits");
        assert_eq!(parse_order_number(p).unwrap(), 63);
        let p = Path::new("NS.20100512.49520_flux_tbl.fits");
        assert_eq!(parse_order_number(p).unwrap(), 20);
    }

    #[test]
    fn rejects_foreign_file_names() {
        assert!(matches!(
            parse_order_number(Path::new("SDCH_20201202_0059.spec.fits")),
            Err(SpectrumError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            parse_order_number(Path::new("NS.20100512.49520_63_flux.fits")),
            Err(SpectrumError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            parse_order_number(Path::new("NS.20100512.49520_ab_flux_tbl.fits")),
            Err(SpectrumError::InvalidOrderNumber(_))
        ));
    }

    #[test]
    fn companion_path_swaps_directory_and_suffix() {
        let p = Path::new("/night/fitstbl/NS.20100512.49520_63_flux_tbl.fits");
        assert_eq!(
            companion_header_path(p),
            PathBuf::from("/night/fits/NS.20100512.49520_63_flux.fits")
        );
    }

    #[test]
    fn sexagesimal_parsing() {
        assert_eq!(parse_sexagesimal("12:30:00"), Some(12.5));
        assert_eq!(parse_sexagesimal("-05:30:00"), Some(-5.5));
        assert_eq!(parse_sexagesimal("+45 15 00"), Some(45.25));
        assert_eq!(parse_sexagesimal("7.25"), Some(7.25));
        assert_eq!(parse_sexagesimal("north"), None);
        assert_eq!(parse_sexagesimal(""), None);
    }

    #[test]
    fn mjd_conversion() {
        let t = mjd_to_utc(51544.5).unwrap();
        assert_eq!((t.year(), t.month(), t.day(), t.hour()), (2000, 1, 1, 12));
        assert_eq!(mjd_to_utc(MJD_UNIX_EPOCH).unwrap().timestamp(), 0);
        assert!(mjd_to_utc(f64::NAN).is_none());
    }

    fn spectrum_with_header(header: Header) -> EchelleSpectrum {
        EchelleSpectrum::new(vec![1.0, 2.0], vec![5.0, 6.0])
            .unwrap()
            .with_meta(OrderMeta {
                header: Some(header),
                ..OrderMeta::default()
            })
    }

    #[test]
    fn pointing_and_time_from_header() {
        let mut h = Header::new();
        h.set("RA", HeaderValue::String("06:00:00".into()));
        h.set("DEC", HeaderValue::Float(-12.5));
        h.set("MJD-OBS", HeaderValue::Float(55346.0));
        let spec = spectrum_with_header(h);

        assert_eq!(spec.ra().unwrap(), HourAngle(6.0));
        assert_eq!(spec.ra().unwrap().to_degrees(), 90.0);
        assert_eq!(spec.dec().unwrap(), Degrees(-12.5));
        let t = spec.observation_time().unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2010, 5, 30));
    }

    #[test]
    fn header_lookups_fail_without_header_or_key() {
        let bare = EchelleSpectrum::new(vec![1.0], vec![1.0]).unwrap();
        assert!(matches!(bare.ra(), Err(SpectrumError::MissingMetadata("header"))));
        assert!(matches!(
            bare.observation_time(),
            Err(SpectrumError::MissingMetadata("header"))
        ));

        let spec = spectrum_with_header(Header::new());
        assert!(matches!(spec.dec(), Err(SpectrumError::MissingHeaderKey(_))));

        let mut h = Header::new();
        h.set("RA", HeaderValue::Bool(true));
        assert!(matches!(
            spectrum_with_header(h).ra(),
            Err(SpectrumError::InvalidHeaderValue { .. })
        ));
    }

    #[test]
    fn sky_subtract_is_guarded() {
        let sky = EchelleSpectrum::new(vec![1.0, 2.0], vec![1.0, 2.5]).unwrap();
        let mut spec = EchelleSpectrum::new(vec![1.0, 2.0], vec![5.0, 6.0]).unwrap();
        spec.meta.sky = Some(Box::new(sky));

        let unchanged = spec.sky_subtract(false).unwrap();
        assert_eq!(unchanged.flux(), spec.flux());
        assert_eq!(unchanged.sky_subtract(false).unwrap().flux(), spec.flux());

        let forced = spec.sky_subtract(true).unwrap();
        assert_eq!(forced.flux(), &[4.0, 3.5]);
    }

    #[test]
    fn forced_sky_subtract_needs_sky() {
        let spec = EchelleSpectrum::new(vec![1.0], vec![1.0]).unwrap();
        assert!(matches!(spec.sky_subtract(true), Err(SpectrumError::MissingMetadata("sky"))));
    }
}
