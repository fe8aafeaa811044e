use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Order colours: echelle order number → Color32
// ---------------------------------------------------------------------------

/// Maps echelle order numbers to distinct colours, hue increasing with `m`.
#[derive(Debug, Clone)]
pub struct OrderColors {
    mapping: BTreeMap<i64, Color32>,
    default_color: Color32,
}

impl OrderColors {
    pub fn new(orders: &[i64]) -> Self {
        let unique: std::collections::BTreeSet<i64> = orders.iter().copied().collect();
        let palette = generate_palette(unique.len());
        let mapping = unique.into_iter().zip(palette).collect();

        OrderColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, order: i64) -> Color32 {
        self.mapping
            .get(&order)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        assert_ne!(p[0], p[1]);
    }

    #[test]
    fn duplicate_orders_share_a_colour() {
        let colors = OrderColors::new(&[63, 64, 63]);
        assert_eq!(colors.mapping.len(), 2);
        assert_ne!(colors.color_for(63), colors.color_for(64));
        assert_eq!(colors.color_for(99), Color32::GRAY);
    }
}
