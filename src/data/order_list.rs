use std::path::Path;

use log::{info, warn};

use super::config::LoaderConfig;
use super::error::{Result, SpectrumError};
use super::model::{EchelleSpectrum, FluxUnit};
use super::stats;

/// Substring every input path to [`OrderList::read`] must contain.
const FLUX_TABLE_MARKER: &str = "flux_tbl.fits";

// ---------------------------------------------------------------------------
// OrderList – all echelle orders of one exposure
// ---------------------------------------------------------------------------

/// Echelle orders in the order their files were given (not sorted by `m`).
///
/// Batch operations consume the list and return a new one, so a caller
/// never observes a half-transformed list through another handle.
#[derive(Debug, Clone, Default)]
pub struct OrderList {
    orders: Vec<EchelleSpectrum>,
}

impl OrderList {
    pub fn new(orders: Vec<EchelleSpectrum>) -> Self {
        Self { orders }
    }

    /// Load one order per path. The first bad path aborts the whole read.
    pub fn read<P: AsRef<Path>>(files: &[P], config: &LoaderConfig) -> Result<Self> {
        let mut orders = Vec::with_capacity(files.len());
        for file in files {
            let path = file.as_ref();
            if !path.to_string_lossy().contains(FLUX_TABLE_MARKER) {
                return Err(SpectrumError::UnsupportedFormat(format!(
                    "{}: expected a *_{FLUX_TABLE_MARKER} file",
                    path.display()
                )));
            }
            orders.push(EchelleSpectrum::from_nsdrp_file(path, config)?);
        }
        info!("Loaded {} echelle orders", orders.len());
        Ok(Self { orders })
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EchelleSpectrum> {
        self.orders.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EchelleSpectrum> {
        self.orders.iter()
    }

    pub fn into_inner(self) -> Vec<EchelleSpectrum> {
        self.orders
    }

    /// Order number of each entry, falling back to its index when unset.
    pub fn order_numbers(&self) -> Vec<i64> {
        self.orders
            .iter()
            .enumerate()
            .map(|(i, o)| o.order().unwrap_or(i as i64))
            .collect()
    }

    fn try_map(self, f: impl Fn(&EchelleSpectrum) -> Result<EchelleSpectrum>) -> Result<Self> {
        let orders = self.orders.iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(Self { orders })
    }

    /// Divide every order by the NaN-ignoring median flux of the first order.
    ///
    /// If the first order is entirely NaN the median is NaN, and so is every
    /// normalized flux.
    pub fn normalize(self) -> Result<Self> {
        let first = self.orders.first().ok_or(SpectrumError::EmptyOrderList)?;
        let median = stats::nanmedian(first.flux());
        let unit = first.flux_unit();
        if median.is_nan() {
            warn!("first order has no finite flux, normalization yields NaN");
        }
        self.try_map(|o| o.divide(median, unit))
    }

    pub fn remove_nans(self) -> Result<Self> {
        self.try_map(EchelleSpectrum::remove_nans)
    }

    pub fn remove_outliers(self, threshold: f64) -> Result<Self> {
        self.try_map(|o| o.remove_outliers(threshold))
    }

    pub fn trim_edges(self) -> Result<Self> {
        self.try_map(EchelleSpectrum::trim_edges)
    }

    pub fn trim_edges_to(self, limits: (i64, i64)) -> Result<Self> {
        self.try_map(|o| o.trim_edges_to(limits))
    }

    /// Concatenate all orders into one spectrum, assuming zero overlap in wavelength.
    ///
    /// Wavelength and flux are joined in list order; the result has no
    /// uncertainty, mask, or metadata, and is not re-sorted.
    pub fn stitch(&self) -> Result<EchelleSpectrum> {
        warn!("Experimental method");
        let first = self.orders.first().ok_or(SpectrumError::EmptyOrderList)?;

        let wavelength: Vec<f64> = self
            .orders
            .iter()
            .flat_map(|o| o.wavelength().iter().copied())
            .collect();
        let flux: Vec<f64> = self
            .orders
            .iter()
            .flat_map(|o| o.flux().iter().copied())
            .collect();

        let unit = first.flux_unit();
        if self.orders.iter().any(|o| o.flux_unit() != unit) {
            warn!("stitching orders with mixed flux units, keeping {unit}");
        }
        Ok(EchelleSpectrum::new(wavelength, flux)?.with_flux_unit(unit))
    }
}

impl std::ops::Index<usize> for OrderList {
    type Output = EchelleSpectrum;

    fn index(&self, index: usize) -> &Self::Output {
        &self.orders[index]
    }
}

impl<'a> IntoIterator for &'a OrderList {
    type Item = &'a EchelleSpectrum;
    type IntoIter = std::slice::Iter<'a, EchelleSpectrum>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

impl FromIterator<EchelleSpectrum> for OrderList {
    fn from_iter<I: IntoIterator<Item = EchelleSpectrum>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Flux unit shared by all orders, if they agree.
pub fn common_flux_unit(list: &OrderList) -> Option<FluxUnit> {
    let first = list.get(0)?.flux_unit();
    list.iter().all(|o| o.flux_unit() == first).then_some(first)
}
