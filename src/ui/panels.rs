use std::path::Path;

use anyhow::Context;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use nirspec_orders::data::export::write_csv;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – order selection, processing, header
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Orders");
    ui.separator();

    let Some(raw) = &state.raw else {
        ui.label("No orders loaded.");
        return;
    };
    let numbers = raw.order_numbers();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Order checkboxes ----
            let header_text = format!("Visible  ({}/{})", state.filter.len(), numbers.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("orders")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_none();
                        }
                    });

                    for &m in &numbers {
                        let mut text = RichText::new(format!("m = {m}"));
                        if let Some(colors) = &state.colors {
                            text = text.color(colors.color_for(m));
                        }
                        let mut checked = state.filter.contains(&m);
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_order(m);
                        }
                    }
                });
            ui.separator();

            // ---- Processing ----
            egui::CollapsingHeader::new(RichText::new("Processing").strong())
                .id_salt("processing")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    let before = state.processing.clone();
                    let p = &mut state.processing;
                    ui.checkbox(&mut p.remove_nans, "Remove NaNs");
                    let (lo, hi) = state.config.noisy_edges;
                    ui.checkbox(&mut p.trim_edges, format!("Trim edges (x ∈ [{lo}, {hi}])"));
                    ui.checkbox(&mut p.remove_outliers, "Remove outliers");
                    ui.add_enabled(
                        p.remove_outliers,
                        egui::Slider::new(&mut p.outlier_threshold, 1.0..=10.0).text("σ"),
                    );
                    ui.checkbox(&mut p.normalize, "Normalize to first order");
                    if state.processing != before {
                        state.reprocess();
                    }
                });
            ui.separator();

            // ---- Display ----
            egui::CollapsingHeader::new(RichText::new("Display").strong())
                .id_salt("display")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    let style = &mut state.plot_style;
                    ui.checkbox(&mut style.show_sky, "Show sky");
                    ui.checkbox(&mut style.hide_masked, "Hide masked pixels");
                    ui.add(egui::Slider::new(&mut style.line_width, 0.5..=4.0).text("Line width"));
                });
            ui.separator();

            // ---- Header of the first visible order ----
            egui::CollapsingHeader::new(RichText::new("Header").strong())
                .id_salt("header")
                .default_open(false)
                .show(ui, |ui: &mut Ui| header_table(ui, state));
        });
}

fn header_table(ui: &mut Ui, state: &AppState) {
    let header = state
        .orders
        .as_ref()
        .zip(state.visible_indices.first())
        .and_then(|(list, &i)| list.get(i))
        .and_then(|order| order.header().ok());

    let Some(header) = header else {
        ui.label("No companion header.");
        return;
    };

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(70.0))
        .column(Column::remainder())
        .header(20.0, |mut row| {
            row.col(|ui| {
                ui.strong("Keyword");
            });
            row.col(|ui| {
                ui.strong("Value");
            });
        })
        .body(|mut body| {
            for card in header.cards() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.monospace(&card.keyword);
                    });
                    row.col(|ui| {
                        ui.label(card.value.to_string())
                            .on_hover_text(card.comment.as_deref().unwrap_or(""));
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            let has_orders = state.orders.is_some();
            if ui
                .add_enabled(has_orders, egui::Button::new("Export Parquet…"))
                .clicked()
            {
                let result = export_parquet_dialog(state);
                report(state, result);
                ui.close_menu();
            }
            if ui
                .add_enabled(has_orders, egui::Button::new("Export stitched CSV…"))
                .clicked()
            {
                let result = export_stitched_dialog(state);
                report(state, result);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(list) = &state.orders {
            ui.label(format!(
                "{} orders loaded, {} visible",
                list.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open NSDRP flux tables")
        .add_filter("NSDRP flux tables", &["fits"])
        .pick_files();

    if let Some(paths) = files {
        state.load_files(&paths);
    }
}

fn export_parquet_dialog(state: &AppState) -> anyhow::Result<()> {
    let Some(dir) = rfd::FileDialog::new()
        .set_title("Export orders as Parquet")
        .pick_folder()
    else {
        return Ok(());
    };
    let list = state.visible_orders().context("no orders loaded")?;
    let written = list
        .to_parquet(&dir, "nirspec")
        .with_context(|| format!("exporting to {}", dir.display()))?;
    log::info!("Wrote {} Parquet files to {}", written.len(), dir.display());
    Ok(())
}

fn export_stitched_dialog(state: &AppState) -> anyhow::Result<()> {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export stitched spectrum")
        .add_filter("CSV", &["csv"])
        .set_file_name("stitched.csv")
        .save_file()
    else {
        return Ok(());
    };
    export_stitched(state, &path)
}

fn export_stitched(state: &AppState, path: &Path) -> anyhow::Result<()> {
    let list = state.visible_orders().context("no orders loaded")?;
    let stitched = list.stitch().context("stitching visible orders")?;
    write_csv(&stitched, path).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {} stitched samples to {}", stitched.len(), path.display());
    Ok(())
}

fn report(state: &mut AppState, result: anyhow::Result<()>) {
    if let Err(e) = result {
        log::error!("Export failed: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}
