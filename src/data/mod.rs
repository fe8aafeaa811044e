//! Data layer: spectra, loading, batch processing, and export.
//!
//! Architecture:
//! ```text
//!  fitstbl/NS.*_flux_tbl.fits      fits/NS.*_flux.fits (optional)
//!        │                                │
//!        ▼                                ▼
//!   ┌──────────┐   table + header   ┌──────────┐
//!   │  loader   │ ◄───────────────── │   fits    │
//!   └──────────┘                    └──────────┘
//!        │  one EchelleSpectrum per order (+ nested sky)
//!        ▼
//!   ┌────────────┐
//!   │ order_list  │  normalize / remove_nans / remove_outliers / trim_edges / stitch
//!   └────────────┘
//!        │
//!        ├──► filter   which orders are visible
//!        └──► export   Parquet / CSV (/ HDF5)
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod ops;
pub mod order_list;
pub mod stats;
