//! Write a synthetic NSDRP reduction for trying out the viewer:
//! `<out>/fitstbl/NS.*_flux_tbl.fits` per order plus the `<out>/fits/NS.*_flux.fits`
//! header files next to them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use nirspec_orders::fits::writer::{write_bintable, write_primary, ColumnData, TableColumn};
use nirspec_orders::fits::{Header, HeaderValue};

const FRAME: &str = "NS.20260101.50000";
const N_PIXELS: usize = 1024;
const ORDERS: [i64; 5] = [33, 34, 35, 36, 37];
/// Grating-equation constant: m · λ_center in Å.
const M_LAMBDA: f64 = 740_000.0;
const DISPERSION: f64 = 0.28;
const MJD_OBS: f64 = 61_041.578_7;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Columns of one synthetic order.
struct Order {
    pixel: Vec<i16>,
    wavelength: Vec<f64>,
    flux: Vec<f64>,
    noise: Vec<f64>,
    sky: Vec<f64>,
}

fn generate_order(m: i64, rng: &mut SimpleRng) -> Order {
    let center = M_LAMBDA / m as f64;
    let start = center - DISPERSION * (N_PIXELS as f64 / 2.0);

    // A few stellar absorption lines and sky emission lines per order.
    let absorption: Vec<(f64, f64, f64)> = (0..4)
        .map(|_| {
            let mu = start + rng.next_f64() * DISPERSION * N_PIXELS as f64;
            (mu, 0.8 + rng.next_f64(), 150.0 + 250.0 * rng.next_f64())
        })
        .collect();
    let emission: Vec<(f64, f64, f64)> = (0..3)
        .map(|_| {
            let mu = start + rng.next_f64() * DISPERSION * N_PIXELS as f64;
            (mu, 0.5, 400.0 + 800.0 * rng.next_f64())
        })
        .collect();

    let mut order = Order {
        pixel: Vec::with_capacity(N_PIXELS),
        wavelength: Vec::with_capacity(N_PIXELS),
        flux: Vec::with_capacity(N_PIXELS),
        noise: Vec::with_capacity(N_PIXELS),
        sky: Vec::with_capacity(N_PIXELS),
    };
    for p in 0..N_PIXELS {
        let wl = start + DISPERSION * p as f64;
        // Blaze: brightest mid-order, falling off towards the detector edges.
        let x = (p as f64 - N_PIXELS as f64 / 2.0) / (0.7 * N_PIXELS as f64);
        let continuum = 1000.0 * (1.0 - x * x);
        let lines: f64 = absorption.iter().map(|&(mu, s, a)| gaussian(wl, mu, s, a)).sum();
        let sky: f64 = 20.0 + emission.iter().map(|&(mu, s, a)| gaussian(wl, mu, s, a)).sum::<f64>();

        let signal = (continuum - lines).max(0.0);
        let sigma = (signal + sky + 25.0).sqrt();
        let (flux, noise) = if p < 3 {
            (f64::NAN, f64::NAN)
        } else {
            (signal + rng.gauss(0.0, sigma), sigma)
        };

        order.pixel.push(p as i16);
        order.wavelength.push(wl);
        order.flux.push(flux);
        order.noise.push(noise);
        order.sky.push(sky + rng.gauss(0.0, sky.sqrt()));
    }
    order
}

fn companion_header(m: i64) -> Header {
    let center = M_LAMBDA / m as f64;
    let mut header = Header::new();
    header.set("TELESCOP", HeaderValue::String("Keck II".into()));
    header.set("INSTRUME", HeaderValue::String("NIRSPEC".into()));
    header.set("OBJECT", HeaderValue::String("HD 189733".into()));
    header.set("RA", HeaderValue::String("20:00:43.71".into()));
    header.set("DEC", HeaderValue::String("+22:42:39.1".into()));
    header.set_with_comment("MJD-OBS", HeaderValue::Float(MJD_OBS), Some("start of exposure"));
    header.set("ECHLORD", HeaderValue::Integer(m));
    header.set("CTYPE1", HeaderValue::String("WAVE".into()));
    header.set("CUNIT1", HeaderValue::String("Angstrom".into()));
    header.set("CRPIX1", HeaderValue::Float(1.0));
    header.set(
        "CRVAL1",
        HeaderValue::Float(center - DISPERSION * (N_PIXELS as f64 / 2.0)),
    );
    header.set("CDELT1", HeaderValue::Float(DISPERSION));
    header
}

fn write_order(out: &Path, m: i64, rng: &mut SimpleRng) -> anyhow::Result<PathBuf> {
    let order = generate_order(m, rng);
    let table_path = out.join("fitstbl").join(format!("{FRAME}_{m}_flux_tbl.fits"));
    let header_path = out.join("fits").join(format!("{FRAME}_{m}_flux.fits"));

    let columns = [
        TableColumn::new("col", ColumnData::Int16(order.pixel)),
        TableColumn::new("wave (A)", ColumnData::Float64(order.wavelength)),
        TableColumn::new("flux (cnts)", ColumnData::Float64(order.flux)),
        TableColumn::new("noise (cnts)", ColumnData::Float64(order.noise)),
        TableColumn::new("sky (cnts)", ColumnData::Float64(order.sky)),
    ];
    write_bintable(&table_path, &Header::new(), &columns)
        .with_context(|| format!("writing {}", table_path.display()))?;
    write_primary(&header_path, &companion_header(m))
        .with_context(|| format!("writing {}", header_path.display()))?;
    Ok(table_path)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let out = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "sample_nsdrp".to_string()),
    );
    std::fs::create_dir_all(out.join("fitstbl"))?;
    std::fs::create_dir_all(out.join("fits"))?;

    let mut rng = SimpleRng::new(42);
    for m in ORDERS {
        let path = write_order(&out, m, &mut rng)?;
        log::info!("order {m} → {}", path.display());
    }

    println!(
        "Wrote {} orders ({N_PIXELS} pixels each) to {}",
        ORDERS.len(),
        out.display()
    );
    Ok(())
}
