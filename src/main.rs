mod app;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use app::NirspecViewerApp;
use eframe::egui;
use nirspec_orders::LoaderConfig;
use state::AppState;

/// Environment variable naming a JSON loader configuration.
const CONFIG_ENV: &str = "NIRSPEC_VIEWER_CONFIG";

fn load_config() -> LoaderConfig {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return LoaderConfig::default();
    };
    match LoaderConfig::from_json_file(Path::new(&path)) {
        Ok(config) => {
            log::info!("Using loader configuration from {path}");
            config
        }
        Err(e) => {
            log::warn!("Ignoring {CONFIG_ENV}={path}: {e}");
            LoaderConfig::default()
        }
    }
}

fn main() -> eframe::Result {
    env_logger::init();

    let mut state = AppState::new(load_config());
    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if !files.is_empty() {
        state.load_files(&files);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "NIRSPEC Orders",
        options,
        Box::new(|_cc| Ok(Box::new(NirspecViewerApp::new(state)))),
    )
}
