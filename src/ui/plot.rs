use eframe::egui::Ui;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Order plot (central panel)
// ---------------------------------------------------------------------------

/// Render the visible orders in the central panel.
pub fn spectral_plot(ui: &mut Ui, state: &AppState) {
    let orders = match &state.orders {
        Some(list) => list,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open NSDRP flux tables to view orders  (File → Open…)");
            });
            return;
        }
    };

    orders.plot_orders(ui, &state.plot_style, &state.visible_indices);
}
