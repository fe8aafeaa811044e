use super::{FitsError, Hdu, Result};

// ---------------------------------------------------------------------------
// Column formats (TFORMn)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Logical,
    Bit,
    Byte,
    Int16,
    Int32,
    Int64,
    Char,
    Float32,
    Float64,
    Complex32,
    Complex64,
    Descriptor32,
    Descriptor64,
}

impl ColumnType {
    fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'L' => ColumnType::Logical,
            'X' => ColumnType::Bit,
            'B' => ColumnType::Byte,
            'I' => ColumnType::Int16,
            'J' => ColumnType::Int32,
            'K' => ColumnType::Int64,
            'A' => ColumnType::Char,
            'E' => ColumnType::Float32,
            'D' => ColumnType::Float64,
            'C' => ColumnType::Complex32,
            'M' => ColumnType::Complex64,
            'P' => ColumnType::Descriptor32,
            'Q' => ColumnType::Descriptor64,
            _ => return None,
        })
    }

    /// Bytes per element (bits are handled separately).
    fn width(self) -> usize {
        match self {
            ColumnType::Logical | ColumnType::Byte | ColumnType::Char | ColumnType::Bit => 1,
            ColumnType::Int16 => 2,
            ColumnType::Int32 | ColumnType::Float32 => 4,
            ColumnType::Int64
            | ColumnType::Float64
            | ColumnType::Complex32
            | ColumnType::Descriptor32 => 8,
            ColumnType::Complex64 | ColumnType::Descriptor64 => 16,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ColumnType::Byte | ColumnType::Int16 | ColumnType::Int32 | ColumnType::Int64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, ColumnType::Float32 | ColumnType::Float64)
    }
}

/// A parsed `TFORMn` value such as `1E`, `D`, or `20A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFormat {
    pub repeat: usize,
    pub kind: ColumnType,
}

impl ColumnFormat {
    pub fn parse(tform: &str) -> Option<Self> {
        let tform = tform.trim();
        let digits = tform.chars().take_while(|c| c.is_ascii_digit()).count();
        let repeat = if digits == 0 {
            1
        } else {
            tform[..digits].parse().ok()?
        };
        let code = tform[digits..].chars().next()?;
        Some(ColumnFormat {
            repeat,
            kind: ColumnType::from_code(code)?,
        })
    }

    /// Bytes occupied in one row.
    pub fn byte_width(&self) -> usize {
        match self.kind {
            ColumnType::Bit => self.repeat.div_ceil(8),
            kind => self.repeat * kind.width(),
        }
    }
}

// ---------------------------------------------------------------------------
// BinTable – typed view over a BINTABLE HDU
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub tform: String,
    pub format: ColumnFormat,
    /// Byte offset of this column inside a row.
    pub offset: usize,
    scale: f64,
    zero: f64,
    null: Option<i64>,
}

/// Borrowed view of a binary table. Columns are decoded on request.
#[derive(Debug, Clone)]
pub struct BinTable<'a> {
    columns: Vec<Column>,
    row_len: usize,
    n_rows: usize,
    data: &'a [u8],
}

impl<'a> BinTable<'a> {
    pub fn from_hdu(hdu: &'a Hdu) -> Result<Self> {
        let header = &hdu.header;
        let xtension = hdu.extension().unwrap_or("");
        if xtension.trim() != "BINTABLE" {
            return Err(FitsError::NotABinTable(xtension.to_string()));
        }

        let row_len = header.require_i64("NAXIS1")? as usize;
        let n_rows = header.require_i64("NAXIS2")? as usize;
        let n_fields = header.require_i64("TFIELDS")?;

        let mut columns = Vec::with_capacity(n_fields.max(0) as usize);
        let mut offset = 0usize;
        for i in 1..=n_fields {
            let tform = header
                .get_str(&format!("TFORM{i}"))
                .ok_or_else(|| FitsError::MissingKeyword(format!("TFORM{i}")))?
                .to_string();
            let name = header
                .get_str(&format!("TTYPE{i}"))
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| format!("col{i}"));
            let format = ColumnFormat::parse(&tform).ok_or_else(|| {
                FitsError::UnsupportedColumn {
                    name: name.clone(),
                    tform: tform.clone(),
                }
            })?;

            columns.push(Column {
                name,
                tform,
                format,
                offset,
                scale: header.get_f64(&format!("TSCAL{i}")).unwrap_or(1.0),
                zero: header.get_f64(&format!("TZERO{i}")).unwrap_or(0.0),
                null: header.get_i64(&format!("TNULL{i}")),
            });
            offset += format.byte_width();
        }

        if offset != row_len {
            return Err(FitsError::InvalidKeyword {
                keyword: "NAXIS1".into(),
                value: format!("{row_len} (columns sum to {offset})"),
            });
        }
        let needed = row_len * n_rows;
        if hdu.data().len() < needed {
            return Err(FitsError::Truncated {
                hdu: 1,
                needed,
                available: hdu.data().len(),
            });
        }

        Ok(BinTable {
            columns,
            row_len,
            n_rows,
            data: &hdu.data()[..needed],
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Exact name match first, then case-insensitive.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| FitsError::ColumnNotFound(name.to_string()))
    }

    /// Read a scalar numeric column widened to `f64`, with TSCAL/TZERO applied.
    /// Integer cells equal to TNULL become NaN.
    pub fn read_f64(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.scalar_numeric(name)?;
        Ok(self
            .cells(column)
            .map(|cell| match decode(column.format.kind, cell) {
                Raw::Int(v) if column.null == Some(v) => f64::NAN,
                Raw::Int(v) => v as f64 * column.scale + column.zero,
                Raw::Float(v) => v * column.scale + column.zero,
            })
            .collect())
    }

    /// Read a scalar numeric column as `i64`. Float cells truncate toward zero.
    pub fn read_i64(&self, name: &str) -> Result<Vec<i64>> {
        let column = self.scalar_numeric(name)?;
        let identity = column.scale == 1.0 && column.zero == 0.0;
        Ok(self
            .cells(column)
            .map(|cell| match decode(column.format.kind, cell) {
                Raw::Int(v) if identity => v,
                Raw::Int(v) => (v as f64 * column.scale + column.zero) as i64,
                Raw::Float(v) => (v * column.scale + column.zero) as i64,
            })
            .collect())
    }

    fn scalar_numeric(&self, name: &str) -> Result<&Column> {
        let column = self.column(name)?;
        let kind = column.format.kind;
        if column.format.repeat != 1 || !(kind.is_integer() || kind.is_float()) {
            return Err(FitsError::UnsupportedColumn {
                name: column.name.clone(),
                tform: column.tform.clone(),
            });
        }
        Ok(column)
    }

    fn cells<'c>(&'c self, column: &'c Column) -> impl Iterator<Item = &'a [u8]> + 'c {
        let width = column.format.byte_width();
        self.data
            .chunks_exact(self.row_len)
            .map(move |row| &row[column.offset..column.offset + width])
    }
}

enum Raw {
    Int(i64),
    Float(f64),
}

/// Decode one big-endian cell. Callers guarantee the slice width matches `kind`.
fn decode(kind: ColumnType, cell: &[u8]) -> Raw {
    match kind {
        ColumnType::Byte => Raw::Int(cell[0] as i64),
        ColumnType::Int16 => Raw::Int(i16::from_be_bytes([cell[0], cell[1]]) as i64),
        ColumnType::Int32 => Raw::Int(i32::from_be_bytes([cell[0], cell[1], cell[2], cell[3]]) as i64),
        ColumnType::Int64 => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&cell[..8]);
            Raw::Int(i64::from_be_bytes(b))
        }
        ColumnType::Float32 => {
            Raw::Float(f32::from_be_bytes([cell[0], cell[1], cell[2], cell[3]]) as f64)
        }
        _ => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&cell[..8]);
            Raw::Float(f64::from_be_bytes(b))
        }
    }
}
