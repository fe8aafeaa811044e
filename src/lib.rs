//! Keck NIRSPEC echelle orders reduced by NSDRP.
//!
//! Each `NS.*_flux_tbl.fits` file holds one echelle order. [`EchelleSpectrum`]
//! wraps one order together with its sky spectrum and instrument header;
//! [`OrderList`] holds all orders of an exposure and applies batch
//! processing across them.
//!
//! ```no_run
//! use nirspec_orders::{LoaderConfig, OrderList};
//!
//! let files = [
//!     "night/fitstbl/NS.20100512.49520_62_flux_tbl.fits",
//!     "night/fitstbl/NS.20100512.49520_63_flux_tbl.fits",
//! ];
//! let config = LoaderConfig::default();
//! let orders = OrderList::read(&files, &config)?
//!     .remove_nans()?
//!     .trim_edges()?
//!     .normalize()?;
//! let stitched = orders.stitch()?;
//! println!("{} samples", stitched.len());
//! # Ok::<(), nirspec_orders::SpectrumError>(())
//! ```

pub mod color;
pub mod data;
pub mod fits;
pub mod plot;

pub use data::config::LoaderConfig;
pub use data::error::SpectrumError;
pub use data::model::{EchelleSpectrum, FluxUnit, OrderMeta};
pub use data::order_list::OrderList;
pub use plot::PlotStyle;
