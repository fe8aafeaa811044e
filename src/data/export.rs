use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use parquet::errors::ParquetError;
use serde::Serialize;
use thiserror::Error;

use super::model::EchelleSpectrum;
use super::order_list::OrderList;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("arrow: {0}")]
    Arrow(#[from] ArrowError),
    #[error("parquet: {0}")]
    Parquet(#[from] ParquetError),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[cfg(feature = "hdf5")]
    #[error("hdf5: {0}")]
    Hdf5(#[from] hdf5::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

// ---------------------------------------------------------------------------
// Parquet – one file per order
// ---------------------------------------------------------------------------

/// File name for order `index` of a list sharing `file_basename`.
fn order_file_name(spectrum: &EchelleSpectrum, index: usize, file_basename: &str, ext: &str) -> String {
    match spectrum.order() {
        Ok(m) => format!("{file_basename}_m{m:02}.{ext}"),
        Err(_) => format!("{file_basename}_{index:02}.{ext}"),
    }
}

/// Columnar layout of one order, sky flux included when present.
pub fn spectrum_to_record_batch(spectrum: &EchelleSpectrum) -> Result<RecordBatch> {
    let n = spectrum.len();
    let uncertainty: Float64Array = match spectrum.uncertainty() {
        Some(u) => u.iter().map(|v| Some(*v)).collect(),
        None => (0..n).map(|_| None).collect(),
    };
    let mask: BooleanArray = (0..n).map(|i| Some(spectrum.is_masked(i))).collect();
    let x_values: Int64Array = match spectrum.x_values() {
        Ok(x) if x.len() == n => x.iter().map(|v| Some(*v)).collect(),
        _ => (0..n).map(|_| None).collect(),
    };
    let sky_flux: Float64Array = match spectrum.sky() {
        Ok(sky) if sky.len() == n => sky.flux().iter().map(|v| Some(*v)).collect(),
        _ => (0..n).map(|_| None).collect(),
    };

    let mut metadata = HashMap::new();
    metadata.insert("flux_unit".to_string(), spectrum.flux_unit().to_string());
    if let Ok(pipeline) = spectrum.pipeline() {
        metadata.insert("pipeline".to_string(), pipeline.to_string());
    }
    if let Ok(m) = spectrum.order() {
        metadata.insert("m".to_string(), m.to_string());
    }

    let schema = Arc::new(Schema::new_with_metadata(
        vec![
            Field::new("wavelength", DataType::Float64, false),
            Field::new("flux", DataType::Float64, false),
            Field::new("uncertainty", DataType::Float64, true),
            Field::new("mask", DataType::Boolean, false),
            Field::new("x_value", DataType::Int64, true),
            Field::new("sky_flux", DataType::Float64, true),
        ],
        metadata,
    ));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(spectrum.wavelength().to_vec())),
        Arc::new(Float64Array::from(spectrum.flux().to_vec())),
        Arc::new(uncertainty),
        Arc::new(mask),
        Arc::new(x_values),
        Arc::new(sky_flux),
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}

pub fn write_parquet(spectrum: &EchelleSpectrum, path: &Path) -> Result<()> {
    let batch = spectrum_to_record_batch(spectrum)?;
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

impl OrderList {
    /// Write every order to `dir/{file_basename}_mNN.parquet`. Returns the written paths.
    pub fn to_parquet(&self, dir: &Path, file_basename: &str) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.len());
        for (i, spectrum) in self.iter().enumerate() {
            let path = dir.join(order_file_name(spectrum, i, file_basename, "parquet"));
            write_parquet(spectrum, &path)?;
            written.push(path);
        }
        info!("Wrote {} orders to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Write every order to `dir/{file_basename}_mNN.h5`.
    #[cfg(feature = "hdf5")]
    pub fn to_hdf5(&self, dir: &Path, file_basename: &str) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.len());
        for (i, spectrum) in self.iter().enumerate() {
            let path = dir.join(order_file_name(spectrum, i, file_basename, "h5"));
            hdf5_backend::write_hdf5(spectrum, &path)?;
            written.push(path);
        }
        info!("Wrote {} orders to {}", written.len(), dir.display());
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// CSV – a single spectrum, e.g. a stitched one
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CsvRow {
    wavelength: f64,
    flux: f64,
    uncertainty: Option<f64>,
    mask: bool,
}

pub fn write_csv(spectrum: &EchelleSpectrum, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for i in 0..spectrum.len() {
        writer.serialize(CsvRow {
            wavelength: spectrum.wavelength()[i],
            flux: spectrum.flux()[i],
            uncertainty: spectrum.uncertainty().map(|u| u[i]),
            mask: spectrum.is_masked(i),
        })?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// HDF5
// ---------------------------------------------------------------------------

#[cfg(feature = "hdf5")]
mod hdf5_backend {
    use std::path::Path;

    use hdf5::File;

    use super::Result;
    use crate::data::model::EchelleSpectrum;

    /// One group per order with a dataset per column.
    pub fn write_hdf5(spectrum: &EchelleSpectrum, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let group = match spectrum.order() {
            Ok(m) => file.create_group(&format!("order_{m:02}"))?,
            Err(_) => file.create_group("order")?,
        };

        let n = spectrum.len();
        group
            .new_dataset::<f64>()
            .create("wavelength", n)?
            .write(spectrum.wavelength())?;
        group
            .new_dataset::<f64>()
            .create("flux", n)?
            .write(spectrum.flux())?;
        if let Some(unc) = spectrum.uncertainty() {
            group.new_dataset::<f64>().create("uncertainty", n)?.write(unc)?;
        }
        let mask: Vec<u8> = (0..n).map(|i| spectrum.is_masked(i) as u8).collect();
        group.new_dataset::<u8>().create("mask", n)?.write(&mask)?;
        if let Ok(sky) = spectrum.sky() {
            group
                .new_dataset::<f64>()
                .create("sky_flux", sky.len())?
                .write(sky.flux())?;
        }
        if let Ok(m) = spectrum.order() {
            group.new_attr::<i64>().create("m")?.write_scalar(&m)?;
        }
        Ok(())
    }
}
