use std::fmt;

use super::{FitsError, Result, BLOCK_SIZE, CARD_SIZE};

// ---------------------------------------------------------------------------
// HeaderValue – the value field of one card
// ---------------------------------------------------------------------------

/// A dynamically-typed header value mirroring the FITS fixed-format types.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Keyword present with an empty value field.
    Null,
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::String(s) => write!(f, "{s}"),
            HeaderValue::Integer(i) => write!(f, "{i}"),
            HeaderValue::Float(v) => write!(f, "{v}"),
            HeaderValue::Bool(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            HeaderValue::Null => write!(f, "<null>"),
        }
    }
}

impl HeaderValue {
    /// Numeric view; integers widen, numeric strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(i) => Some(*i as f64),
            HeaderValue::String(s) => parse_float(s.trim()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Card / Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub value: HeaderValue,
    pub comment: Option<String>,
}

/// Keyword/value cards in file order. Commentary cards (COMMENT, HISTORY, blank) are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a card, keeping the original position on replace.
    pub fn set(&mut self, keyword: &str, value: HeaderValue) {
        self.set_with_comment(keyword, value, None);
    }

    pub fn set_with_comment(&mut self, keyword: &str, value: HeaderValue, comment: Option<&str>) {
        let keyword = keyword.to_ascii_uppercase();
        let comment = comment.map(str::to_string);
        match self.cards.iter_mut().find(|c| c.keyword == keyword) {
            Some(card) => {
                card.value = value;
                card.comment = comment;
            }
            None => self.cards.push(Card {
                keyword,
                value,
                comment,
            }),
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.cards
            .iter()
            .find(|c| c.keyword.eq_ignore_ascii_case(keyword))
            .map(|c| &c.value)
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(HeaderValue::as_str)
    }

    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(HeaderValue::as_i64)
    }

    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(HeaderValue::as_f64)
    }

    pub fn require_i64(&self, keyword: &str) -> Result<i64> {
        match self.get(keyword) {
            Some(HeaderValue::Integer(i)) => Ok(*i),
            Some(other) => Err(FitsError::InvalidKeyword {
                keyword: keyword.to_string(),
                value: other.to_string(),
            }),
            None => Err(FitsError::MissingKeyword(keyword.to_string())),
        }
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Size in bytes of the data unit this header describes (without padding).
    pub(crate) fn data_len(&self, primary: bool) -> Result<usize> {
        let bitpix = self.require_i64("BITPIX")?;
        let naxis = self.require_i64("NAXIS")?;
        if naxis == 0 {
            return Ok(0);
        }

        let mut elements: usize = 1;
        for axis in 1..=naxis {
            let n = self.require_i64(&format!("NAXIS{axis}"))?;
            elements *= usize::try_from(n).map_err(|_| FitsError::InvalidKeyword {
                keyword: format!("NAXIS{axis}"),
                value: n.to_string(),
            })?;
        }

        let (pcount, gcount) = if primary {
            (0, 1)
        } else {
            (
                self.get_i64("PCOUNT").unwrap_or(0) as usize,
                self.get_i64("GCOUNT").unwrap_or(1) as usize,
            )
        };
        let bytes_per_element = (bitpix.unsigned_abs() / 8) as usize;
        Ok(bytes_per_element * gcount * (pcount + elements))
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse cards from the start of `bytes` up to END.
/// Returns the header and the number of bytes it occupies (whole blocks).
pub(crate) fn parse_header(bytes: &[u8], hdu: usize) -> Result<(Header, usize)> {
    let mut header = Header::new();

    for (i, raw) in bytes.chunks_exact(CARD_SIZE).enumerate() {
        let text = String::from_utf8_lossy(raw);
        let keyword = text.get(..8).unwrap_or(text.as_ref()).trim_end();

        if keyword == "END" {
            let used = (i + 1) * CARD_SIZE;
            return Ok((header, used.div_ceil(BLOCK_SIZE) * BLOCK_SIZE));
        }
        if let Some(card) = parse_card(&text) {
            header.cards.push(card);
        }
    }

    Err(FitsError::MissingEnd(hdu))
}

/// Parse one 80-character card. Commentary cards yield `None`.
fn parse_card(text: &str) -> Option<Card> {
    let keyword = text.get(..8)?.trim_end();
    if keyword.is_empty() || text.get(8..10) != Some("= ") {
        return None;
    }
    let (value, comment) = parse_value_field(text.get(10..).unwrap_or(""));
    Some(Card {
        keyword: keyword.to_string(),
        value,
        comment,
    })
}

fn parse_value_field(field: &str) -> (HeaderValue, Option<String>) {
    let trimmed = field.trim_start();

    if let Some(body) = trimmed.strip_prefix('\'') {
        let mut value = String::new();
        let mut chars = body.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    value.push('\'');
                    chars.next();
                } else {
                    break;
                }
            } else {
                value.push(c);
            }
        }
        let rest: String = chars.collect();
        let comment = split_comment(&rest).1;
        return (HeaderValue::String(value.trim_end().to_string()), comment);
    }

    let (value, comment) = split_comment(trimmed);
    let value = value.trim();
    let parsed = match value {
        "" => HeaderValue::Null,
        "T" => HeaderValue::Bool(true),
        "F" => HeaderValue::Bool(false),
        v => {
            if let Ok(i) = v.parse::<i64>() {
                HeaderValue::Integer(i)
            } else if let Some(f) = parse_float(v) {
                HeaderValue::Float(f)
            } else {
                HeaderValue::String(v.to_string())
            }
        }
    };
    (parsed, comment)
}

fn split_comment(s: &str) -> (&str, Option<String>) {
    match s.split_once('/') {
        Some((value, comment)) => {
            let comment = comment.trim();
            (value, (!comment.is_empty()).then(|| comment.to_string()))
        }
        None => (s, None),
    }
}

/// FITS allows Fortran-style `D` exponents.
fn parse_float(s: &str) -> Option<f64> {
    s.replace(['D', 'd'], "E").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(s: &str) -> String {
        format!("{s:<80}")
    }

    fn block(cards: &[&str]) -> Vec<u8> {
        let mut text: String = cards.iter().map(|c| card(c)).collect();
        text.push_str(&card("END"));
        let mut bytes = text.into_bytes();
        bytes.resize(bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, b' ');
        bytes
    }

    #[test]
    fn parses_typed_values() {
        let bytes = block(&[
            "SIMPLE  =                    T / conforms to FITS",
            "BITPIX  =                  -32",
            "NAXIS   =                    0",
            "EXPTIME =               120.5 / seconds",
            "MJD-OBS =      5.5346123456D+04",
            "OBJECT  = 'GJ 436  '           / target",
            "OBSERVER= 'O''Brien'",
            "UNDEF   =",
            "COMMENT this card is dropped",
        ]);
        let (h, used) = parse_header(&bytes, 0).unwrap();
        assert_eq!(used, BLOCK_SIZE);
        assert_eq!(h.get("SIMPLE"), Some(&HeaderValue::Bool(true)));
        assert_eq!(h.get_i64("BITPIX"), Some(-32));
        assert_eq!(h.get_f64("EXPTIME"), Some(120.5));
        assert!((h.get_f64("MJD-OBS").unwrap() - 55346.123456).abs() < 1e-9);
        assert_eq!(h.get_str("OBJECT"), Some("GJ 436"));
        assert_eq!(h.get_str("OBSERVER"), Some("O'Brien"));
        assert_eq!(h.get("UNDEF"), Some(&HeaderValue::Null));
        assert!(!h.contains("COMMENT"));
        assert_eq!(h.cards()[3].comment.as_deref(), Some("seconds"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut h = Header::new();
        h.set("ra", HeaderValue::Float(1.5));
        assert_eq!(h.get_f64("RA"), Some(1.5));
        assert_eq!(h.get_f64("Ra"), Some(1.5));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut h = Header::new();
        h.set("A", HeaderValue::Integer(1));
        h.set("B", HeaderValue::Integer(2));
        h.set("A", HeaderValue::Integer(3));
        assert_eq!(h.len(), 2);
        assert_eq!(h.cards()[0].value, HeaderValue::Integer(3));
    }

    #[test]
    fn missing_end_is_an_error() {
        let bytes = vec![b' '; BLOCK_SIZE];
        assert!(matches!(parse_header(&bytes, 2), Err(FitsError::MissingEnd(2))));
    }

    #[test]
    fn numeric_strings_convert_to_f64() {
        assert_eq!(HeaderValue::String(" 12.5 ".into()).as_f64(), Some(12.5));
        assert_eq!(HeaderValue::String("12:30:00".into()).as_f64(), None);
    }

    #[test]
    fn data_len_for_bintable() {
        let mut h = Header::new();
        h.set("XTENSION", HeaderValue::String("BINTABLE".into()));
        h.set("BITPIX", HeaderValue::Integer(8));
        h.set("NAXIS", HeaderValue::Integer(2));
        h.set("NAXIS1", HeaderValue::Integer(28));
        h.set("NAXIS2", HeaderValue::Integer(1024));
        h.set("PCOUNT", HeaderValue::Integer(0));
        h.set("GCOUNT", HeaderValue::Integer(1));
        assert_eq!(h.data_len(false).unwrap(), 28 * 1024);
    }
}
