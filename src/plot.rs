use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotResponse};

use crate::color::OrderColors;
use crate::data::model::EchelleSpectrum;
use crate::data::order_list::OrderList;

// ---------------------------------------------------------------------------
// Plot styling shared by every order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    pub line_width: f32,
    /// Fixed colour for every order; `None` colours by order number.
    pub color: Option<Color32>,
    /// Overlay the sky spectrum as a dashed line.
    pub show_sky: bool,
    /// Leave masked samples out of the line.
    pub hide_masked: bool,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            line_width: 1.5,
            color: None,
            show_sky: false,
            hide_masked: true,
        }
    }
}

// ---------------------------------------------------------------------------
// One order
// ---------------------------------------------------------------------------

impl EchelleSpectrum {
    /// `[wavelength, flux]` pairs, skipping masked samples when asked to.
    pub fn plot_points(&self, hide_masked: bool) -> Vec<[f64; 2]> {
        self.wavelength()
            .iter()
            .zip(self.flux())
            .enumerate()
            .filter(|(i, _)| !(hide_masked && self.is_masked(*i)))
            .map(|(_, (&w, &f))| [w, f])
            .collect()
    }

    /// Lines for this order: the spectrum, then the sky if requested and present.
    pub fn plot_lines(&self, style: &PlotStyle, name: &str, color: Color32) -> Vec<Line> {
        let mut lines = vec![Line::new(self.plot_points(style.hide_masked))
            .name(name)
            .color(color)
            .width(style.line_width)];

        if style.show_sky {
            if let Ok(sky) = self.sky() {
                lines.push(
                    Line::new(sky.plot_points(style.hide_masked))
                        .name(format!("{name} sky"))
                        .color(color.gamma_multiply(0.5))
                        .width(style.line_width)
                        .style(LineStyle::dashed_loose()),
                );
            }
        }
        lines
    }
}

// ---------------------------------------------------------------------------
// All orders on one set of axes
// ---------------------------------------------------------------------------

impl OrderList {
    /// Draw every order on the same plot.
    pub fn plot(&self, ui: &mut Ui, style: &PlotStyle) -> PlotResponse<()> {
        let all: Vec<usize> = (0..self.len()).collect();
        self.plot_orders(ui, style, &all)
    }

    /// Draw the orders at `indices`, the first one underneath the rest.
    pub fn plot_orders(&self, ui: &mut Ui, style: &PlotStyle, indices: &[usize]) -> PlotResponse<()> {
        let numbers = self.order_numbers();
        let colors = OrderColors::new(&numbers);
        let y_label = match crate::data::order_list::common_flux_unit(self) {
            Some(unit) => format!("Flux ({unit})"),
            None => "Flux".to_string(),
        };

        Plot::new("echelle_orders")
            .legend(Legend::default())
            .x_axis_label("Wavelength (Å)")
            .y_axis_label(y_label)
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true)
            .show(ui, |plot_ui| {
                for &i in indices {
                    let Some(order) = self.get(i) else {
                        continue;
                    };
                    let m = numbers[i];
                    let color = style.color.unwrap_or_else(|| colors.color_for(m));
                    for line in order.plot_lines(style, &format!("m = {m}"), color) {
                        plot_ui.line(line);
                    }
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::OrderMeta;

    fn spectrum() -> EchelleSpectrum {
        let sky = EchelleSpectrum::new(vec![1.0, 2.0, 3.0], vec![0.1, 0.2, 0.3]).unwrap();
        EchelleSpectrum::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0])
            .unwrap()
            .with_mask(vec![false, true, false])
            .unwrap()
            .with_meta(OrderMeta {
                sky: Some(Box::new(sky)),
                ..OrderMeta::default()
            })
    }

    #[test]
    fn masked_samples_are_hidden_on_request() {
        let spec = spectrum();
        assert_eq!(spec.plot_points(true), vec![[1.0, 10.0], [3.0, 30.0]]);
        assert_eq!(spec.plot_points(false).len(), 3);
    }

    #[test]
    fn sky_line_only_when_requested() {
        let spec = spectrum();
        let style = PlotStyle::default();
        assert_eq!(spec.plot_lines(&style, "m = 63", Color32::RED).len(), 1);

        let style = PlotStyle {
            show_sky: true,
            ..PlotStyle::default()
        };
        assert_eq!(spec.plot_lines(&style, "m = 63", Color32::RED).len(), 2);

        let bare = EchelleSpectrum::new(vec![1.0], vec![1.0]).unwrap();
        assert_eq!(bare.plot_lines(&style, "m = 1", Color32::RED).len(), 1);
    }
}
