use std::path::Path;

use super::{padded_len, FitsError, Header, HeaderValue, Result, BLOCK_SIZE, CARD_SIZE};

/// Column payloads the writer knows how to store (scalar cells only).
#[derive(Debug, Clone)]
pub enum ColumnData {
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
        }
    }

    fn tform(&self) -> &'static str {
        match self {
            ColumnData::Int16(_) => "1I",
            ColumnData::Int32(_) => "1J",
            ColumnData::Int64(_) => "1K",
            ColumnData::Float32(_) => "1E",
            ColumnData::Float64(_) => "1D",
        }
    }

    fn width(&self) -> usize {
        match self {
            ColumnData::Int16(_) => 2,
            ColumnData::Int32(_) | ColumnData::Float32(_) => 4,
            ColumnData::Int64(_) | ColumnData::Float64(_) => 8,
        }
    }

    fn write_cell(&self, row: usize, out: &mut Vec<u8>) {
        match self {
            ColumnData::Int16(v) => out.extend_from_slice(&v[row].to_be_bytes()),
            ColumnData::Int32(v) => out.extend_from_slice(&v[row].to_be_bytes()),
            ColumnData::Int64(v) => out.extend_from_slice(&v[row].to_be_bytes()),
            ColumnData::Float32(v) => out.extend_from_slice(&v[row].to_be_bytes()),
            ColumnData::Float64(v) => out.extend_from_slice(&v[row].to_be_bytes()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableColumn {
    pub name: String,
    pub data: ColumnData,
}

impl TableColumn {
    pub fn new(name: &str, data: ColumnData) -> Self {
        Self {
            name: name.to_string(),
            data,
        }
    }
}

/// Write a header-only primary HDU carrying `extra` cards.
pub fn write_primary(path: impl AsRef<Path>, extra: &Header) -> Result<()> {
    std::fs::write(path, encode_primary(extra))?;
    Ok(())
}

/// Write an empty primary HDU with `extra` cards, followed by one BINTABLE.
pub fn write_bintable(
    path: impl AsRef<Path>,
    extra: &Header,
    columns: &[TableColumn],
) -> Result<()> {
    std::fs::write(path, encode_bintable(extra, columns)?)?;
    Ok(())
}

pub fn encode_primary(extra: &Header) -> Vec<u8> {
    let mut header = Header::new();
    header.set("SIMPLE", HeaderValue::Bool(true));
    header.set("BITPIX", HeaderValue::Integer(8));
    header.set("NAXIS", HeaderValue::Integer(0));
    header.set("EXTEND", HeaderValue::Bool(true));
    for card in extra.cards() {
        header.set_with_comment(&card.keyword, card.value.clone(), card.comment.as_deref());
    }
    encode_header(&header)
}

pub fn encode_bintable(extra: &Header, columns: &[TableColumn]) -> Result<Vec<u8>> {
    let n_rows = columns.first().map_or(0, |c| c.data.len());
    if let Some(bad) = columns.iter().find(|c| c.data.len() != n_rows) {
        return Err(FitsError::ColumnLengthMismatch {
            name: bad.name.clone(),
            expected: n_rows,
            found: bad.data.len(),
        });
    }
    let row_len: usize = columns.iter().map(|c| c.data.width()).sum();

    let mut ext = Header::new();
    ext.set("XTENSION", HeaderValue::String("BINTABLE".into()));
    ext.set("BITPIX", HeaderValue::Integer(8));
    ext.set("NAXIS", HeaderValue::Integer(2));
    ext.set("NAXIS1", HeaderValue::Integer(row_len as i64));
    ext.set("NAXIS2", HeaderValue::Integer(n_rows as i64));
    ext.set("PCOUNT", HeaderValue::Integer(0));
    ext.set("GCOUNT", HeaderValue::Integer(1));
    ext.set("TFIELDS", HeaderValue::Integer(columns.len() as i64));
    for (i, column) in columns.iter().enumerate() {
        ext.set(&format!("TTYPE{}", i + 1), HeaderValue::String(column.name.clone()));
        ext.set(
            &format!("TFORM{}", i + 1),
            HeaderValue::String(column.data.tform().into()),
        );
    }

    let mut bytes = encode_primary(extra);
    bytes.extend(encode_header(&ext));

    let mut data = Vec::with_capacity(padded_len(row_len * n_rows));
    for row in 0..n_rows {
        for column in columns {
            column.data.write_cell(row, &mut data);
        }
    }
    data.resize(padded_len(data.len()), 0);
    bytes.extend(data);
    Ok(bytes)
}

fn encode_header(header: &Header) -> Vec<u8> {
    let mut out = Vec::with_capacity(BLOCK_SIZE);
    for card in header.cards() {
        out.extend(format_card(&card.keyword, &card.value, card.comment.as_deref()));
    }
    out.extend(format!("{:<80}", "END").into_bytes());
    out.resize(padded_len(out.len()), b' ');
    out
}

fn format_card(keyword: &str, value: &HeaderValue, comment: Option<&str>) -> Vec<u8> {
    let value = match value {
        HeaderValue::String(s) => format!("{:<20}", format!("'{:<8}'", s.replace('\'', "''"))),
        HeaderValue::Integer(i) => format!("{i:>20}"),
        HeaderValue::Float(v) => format!("{:>20}", format!("{v:?}")),
        HeaderValue::Bool(b) => format!("{:>20}", if *b { "T" } else { "F" }),
        HeaderValue::Null => String::new(),
    };
    let mut text = format!("{keyword:<8}= {value}");
    if let Some(comment) = comment {
        text.push_str(" / ");
        text.push_str(comment);
    }
    let mut bytes: Vec<u8> = text.bytes().filter(u8::is_ascii).take(CARD_SIZE).collect();
    bytes.resize(CARD_SIZE, b' ');
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::FitsFile;

    #[test]
    fn cards_round_trip_through_reader() {
        let mut extra = Header::new();
        extra.set_with_comment("RA", HeaderValue::String("12:34:56.78".into()), Some("hours"));
        extra.set("OBSERVER", HeaderValue::String("O'Neil".into()));
        extra.set("MJD-OBS", HeaderValue::Float(61041.25));
        extra.set("CDELT1", HeaderValue::Float(1.0e-7));
        extra.set("AIRMASS", HeaderValue::Float(1.0));
        extra.set("FRAMENO", HeaderValue::Integer(42));
        extra.set("DITHER", HeaderValue::Bool(false));
        extra.set("BLANKKEY", HeaderValue::Null);

        let fits = FitsFile::from_bytes(&encode_primary(&extra)).unwrap();
        let h = fits.primary_header();
        assert_eq!(h.get_str("RA"), Some("12:34:56.78"));
        assert_eq!(h.cards().iter().find(|c| c.keyword == "RA").unwrap().comment.as_deref(), Some("hours"));
        assert_eq!(h.get_str("OBSERVER"), Some("O'Neil"));
        assert_eq!(h.get("MJD-OBS"), Some(&HeaderValue::Float(61041.25)));
        assert_eq!(h.get("CDELT1"), Some(&HeaderValue::Float(1.0e-7)));
        assert_eq!(h.get("AIRMASS"), Some(&HeaderValue::Float(1.0)));
        assert_eq!(h.get("FRAMENO"), Some(&HeaderValue::Integer(42)));
        assert_eq!(h.get("DITHER"), Some(&HeaderValue::Bool(false)));
        assert_eq!(h.get("BLANKKEY"), Some(&HeaderValue::Null));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let columns = vec![
            TableColumn::new("a", ColumnData::Float64(vec![1.0, 2.0])),
            TableColumn::new("b", ColumnData::Float64(vec![1.0])),
        ];
        assert!(matches!(
            encode_bintable(&Header::new(), &columns),
            Err(FitsError::ColumnLengthMismatch { found: 1, .. })
        ));
    }

    #[test]
    fn long_cards_are_truncated_to_80_bytes() {
        let card = format_card(
            "HISTORY1",
            &HeaderValue::String("x".repeat(100)),
            Some("comment"),
        );
        assert_eq!(card.len(), CARD_SIZE);
    }
}
