//! Synthetic NSDRP reductions written with the crate's own FITS writer.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use nirspec_orders::fits::writer::{write_bintable, write_primary, ColumnData, TableColumn};
use nirspec_orders::fits::{Header, HeaderValue};

pub const FRAME: &str = "NS.20100530.49520";

/// Columns of one synthetic flux table.
#[derive(Debug, Clone)]
pub struct OrderTable {
    pub col: Vec<i16>,
    pub wave: Vec<f64>,
    pub flux: Vec<f64>,
    pub noise: Vec<f64>,
    pub sky: Vec<f64>,
}

impl OrderTable {
    /// `n` samples starting at `start` Å with a flat continuum.
    pub fn flat(n: usize, start: f64, level: f64) -> Self {
        Self {
            col: (0..n as i16).collect(),
            wave: (0..n).map(|i| start + 0.25 * i as f64).collect(),
            flux: vec![level; n],
            noise: vec![level.sqrt(); n],
            sky: (0..n).map(|i| 5.0 + (i % 7) as f64).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.flux.len()
    }
}

/// The `fitstbl/` and `fits/` directories NSDRP writes into.
pub fn reduction_dirs(root: &Path) -> (PathBuf, PathBuf) {
    let tables = root.join("fitstbl");
    let headers = root.join("fits");
    std::fs::create_dir_all(&tables).unwrap();
    std::fs::create_dir_all(&headers).unwrap();
    (tables, headers)
}

pub fn companion_header() -> Header {
    let mut header = Header::new();
    header.set("TELESCOP", HeaderValue::String("Keck II".into()));
    header.set("INSTRUME", HeaderValue::String("NIRSPEC".into()));
    header.set("RA", HeaderValue::String("12:30:00.0".into()));
    header.set("DEC", HeaderValue::String("-45:30:00".into()));
    header.set("MJD-OBS", HeaderValue::Float(55346.5));
    header.set("CTYPE1", HeaderValue::String("WAVE".into()));
    header.set("CRVAL1", HeaderValue::Float(22_000.0));
    header.set("CRPIX1", HeaderValue::Float(1.0));
    header.set("CDELT1", HeaderValue::Float(0.25));
    header
}

/// Write order `m` under `root`, with its companion header when asked.
/// Returns the flux-table path.
pub fn write_order(root: &Path, m: i64, table: &OrderTable, with_header: bool) -> PathBuf {
    let (tables, headers) = reduction_dirs(root);
    let path = tables.join(format!("{FRAME}_{m}_flux_tbl.fits"));
    let columns = [
        TableColumn::new("col", ColumnData::Int16(table.col.clone())),
        TableColumn::new("wave (A)", ColumnData::Float64(table.wave.clone())),
        TableColumn::new("flux (cnts)", ColumnData::Float64(table.flux.clone())),
        TableColumn::new("noise (cnts)", ColumnData::Float64(table.noise.clone())),
        TableColumn::new("sky (cnts)", ColumnData::Float64(table.sky.clone())),
    ];
    write_bintable(&path, &Header::new(), &columns).unwrap();
    if with_header {
        let companion = headers.join(format!("{FRAME}_{m}_flux.fits"));
        write_primary(&companion, &companion_header()).unwrap();
    }
    path
}
