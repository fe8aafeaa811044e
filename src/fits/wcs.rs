use super::Header;

/// Linear world-coordinate transform along the first axis.
///
/// `world = CRVAL1 + (pixel + 1 - CRPIX1) * CDELT1`, with `pixel` zero-based.
/// Missing keywords fall back to the identity transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Wcs {
    pub ctype: String,
    pub cunit: Option<String>,
    pub crval: f64,
    pub crpix: f64,
    pub cdelt: f64,
}

impl Default for Wcs {
    fn default() -> Self {
        Self {
            ctype: String::new(),
            cunit: None,
            crval: 0.0,
            crpix: 0.0,
            cdelt: 1.0,
        }
    }
}

impl Wcs {
    pub fn from_header(header: &Header) -> Self {
        let default = Wcs::default();
        Self {
            ctype: header
                .get_str("CTYPE1")
                .map(|s| s.trim().to_string())
                .unwrap_or(default.ctype),
            cunit: header.get_str("CUNIT1").map(|s| s.trim().to_string()),
            crval: header.get_f64("CRVAL1").unwrap_or(default.crval),
            crpix: header.get_f64("CRPIX1").unwrap_or(default.crpix),
            cdelt: header
                .get_f64("CDELT1")
                .or_else(|| header.get_f64("CD1_1"))
                .unwrap_or(default.cdelt),
        }
    }

    pub fn pixel_to_world(&self, pixel: f64) -> f64 {
        self.crval + (pixel + 1.0 - self.crpix) * self.cdelt
    }

    /// Inverse of [`Wcs::pixel_to_world`]; `None` for a degenerate (zero) step.
    pub fn world_to_pixel(&self, world: f64) -> Option<f64> {
        (self.cdelt != 0.0).then(|| (world - self.crval) / self.cdelt + self.crpix - 1.0)
    }

    /// World coordinates for pixels `0..n`.
    pub fn world_axis(&self, n: usize) -> Vec<f64> {
        (0..n).map(|p| self.pixel_to_world(p as f64)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::HeaderValue;

    #[test]
    fn reads_linear_solution() {
        let mut h = Header::new();
        h.set("CTYPE1", HeaderValue::String("WAVE".into()));
        h.set("CUNIT1", HeaderValue::String("Angstrom".into()));
        h.set("CRVAL1", HeaderValue::Float(21000.0));
        h.set("CRPIX1", HeaderValue::Float(1.0));
        h.set("CDELT1", HeaderValue::Float(0.25));

        let wcs = Wcs::from_header(&h);
        assert_eq!(wcs.ctype, "WAVE");
        assert_eq!(wcs.cunit.as_deref(), Some("Angstrom"));
        assert_eq!(wcs.pixel_to_world(0.0), 21000.0);
        assert_eq!(wcs.pixel_to_world(4.0), 21001.0);
        assert_eq!(wcs.world_to_pixel(21001.0), Some(4.0));
        assert_eq!(wcs.world_axis(3), vec![21000.0, 21000.25, 21000.5]);
    }

    #[test]
    fn cd_matrix_used_when_cdelt_absent() {
        let mut h = Header::new();
        h.set("CD1_1", HeaderValue::Float(2.0));
        assert_eq!(Wcs::from_header(&h).cdelt, 2.0);
    }

    #[test]
    fn empty_header_is_identity_like() {
        let wcs = Wcs::from_header(&Header::new());
        assert_eq!(wcs, Wcs::default());
        assert_eq!(wcs.pixel_to_world(9.0), 10.0);
    }
}
