//! Just enough FITS to read NSDRP products.
//!
//! ```text
//!  file bytes (2880-byte blocks)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  header   │  80-char cards → Header
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ bintable  │  TTYPEn / TFORMn → typed columns
//!   └──────────┘
//! ```
//!
//! The writer exists for the sample generator and tests; it only emits
//! header-only primary HDUs and simple scalar binary tables.

pub mod bintable;
pub mod header;
pub mod wcs;
pub mod writer;

use std::path::Path;

use thiserror::Error;

pub use bintable::BinTable;
pub use header::{Card, Header, HeaderValue};
pub use wcs::Wcs;

/// Size of one FITS logical record.
pub const BLOCK_SIZE: usize = 2880;
/// Size of one header card.
pub const CARD_SIZE: usize = 80;

#[derive(Debug, Error)]
pub enum FitsError {
    #[error("FITS I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file truncated: HDU {hdu} needs {needed} bytes, {available} available")]
    Truncated {
        hdu: usize,
        needed: usize,
        available: usize,
    },
    #[error("header of HDU {0} has no END card")]
    MissingEnd(usize),
    #[error("not a FITS file: first card is not SIMPLE")]
    NotFits,
    #[error("missing required keyword {0}")]
    MissingKeyword(String),
    #[error("keyword {keyword} has unexpected value {value}")]
    InvalidKeyword { keyword: String, value: String },
    #[error("HDU {0} not found")]
    HduNotFound(usize),
    #[error("HDU is not a binary table (XTENSION = {0})")]
    NotABinTable(String),
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("column {name} has unsupported format {tform}")]
    UnsupportedColumn { name: String, tform: String },
    #[error("table columns differ in length: {name} has {found} rows, expected {expected}")]
    ColumnLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, FitsError>;

// ---------------------------------------------------------------------------
// Hdu / FitsFile
// ---------------------------------------------------------------------------

/// One header/data unit. Data is kept raw (big-endian) until a typed view asks for it.
#[derive(Debug, Clone)]
pub struct Hdu {
    pub header: Header,
    data: Vec<u8>,
}

impl Hdu {
    /// Raw data bytes, without the trailing block padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `XTENSION` value, or `None` for the primary HDU.
    pub fn extension(&self) -> Option<&str> {
        self.header.get_str("XTENSION")
    }
}

/// A parsed FITS file held fully in memory.
#[derive(Debug, Clone)]
pub struct FitsFile {
    hdus: Vec<Hdu>,
}

impl FitsFile {
    /// Read and parse a file. The handle is closed before parsing starts.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut hdus = Vec::new();
        let mut offset = 0usize;

        while offset + BLOCK_SIZE <= bytes.len() {
            let rest = &bytes[offset..];
            let index = hdus.len();
            if index == 0 && !rest.starts_with(b"SIMPLE  ") {
                return Err(FitsError::NotFits);
            }
            if index > 0 && !rest.starts_with(b"XTENSION") {
                // Anything after the last extension is padding or junk.
                break;
            }

            let (header, header_len) = header::parse_header(rest, index)?;
            let data_len = header.data_len(index == 0)?;
            let data_start = offset + header_len;
            let data_end = data_start + data_len;
            if data_end > bytes.len() {
                return Err(FitsError::Truncated {
                    hdu: index,
                    needed: data_end,
                    available: bytes.len(),
                });
            }

            hdus.push(Hdu {
                header,
                data: bytes[data_start..data_end].to_vec(),
            });
            offset = data_start + padded_len(data_len);
        }

        if hdus.is_empty() {
            return Err(FitsError::NotFits);
        }
        Ok(FitsFile { hdus })
    }

    pub fn hdu(&self, index: usize) -> Result<&Hdu> {
        self.hdus.get(index).ok_or(FitsError::HduNotFound(index))
    }

    pub fn primary_header(&self) -> &Header {
        &self.hdus[0].header
    }

    /// Typed view of the binary table stored in HDU `index`.
    pub fn bintable(&self, index: usize) -> Result<BinTable<'_>> {
        BinTable::from_hdu(self.hdu(index)?)
    }

    pub fn len(&self) -> usize {
        self.hdus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hdus.is_empty()
    }
}

/// Round a byte count up to a whole number of blocks.
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}
