use std::path::PathBuf;

use nirspec_orders::color::OrderColors;
use nirspec_orders::data::filter::{filtered_indices, init_order_filter, OrderFilter};
use nirspec_orders::{LoaderConfig, OrderList, PlotStyle, SpectrumError};

// ---------------------------------------------------------------------------
// Processing toggles
// ---------------------------------------------------------------------------

/// Which batch steps are applied to the loaded orders, in this order:
/// NaN removal, edge trimming, outlier removal, normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Processing {
    pub remove_nans: bool,
    pub trim_edges: bool,
    pub remove_outliers: bool,
    pub outlier_threshold: f64,
    pub normalize: bool,
}

impl Processing {
    fn from_config(config: &LoaderConfig) -> Self {
        Self {
            remove_nans: false,
            trim_edges: false,
            remove_outliers: false,
            outlier_threshold: config.outlier_threshold,
            normalize: false,
        }
    }

    fn apply(&self, list: OrderList, config: &LoaderConfig) -> Result<OrderList, SpectrumError> {
        let mut list = list;
        if self.remove_nans {
            list = list.remove_nans()?;
        }
        if self.trim_edges {
            list = list.trim_edges_to(config.noisy_edges)?;
        }
        if self.remove_outliers {
            list = list.remove_outliers(self.outlier_threshold)?;
        }
        if self.normalize {
            list = list.normalize()?;
        }
        Ok(list)
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: LoaderConfig,

    /// Orders as read from disk (None until files are loaded).
    pub raw: Option<OrderList>,

    /// `raw` after the enabled processing steps.
    pub orders: Option<OrderList>,

    /// Selected order numbers.
    pub filter: OrderFilter,

    /// Indices of orders passing the current filter (cached).
    pub visible_indices: Vec<usize>,

    pub colors: Option<OrderColors>,

    pub processing: Processing,

    pub plot_style: PlotStyle,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            processing: Processing::from_config(&config),
            config,
            raw: None,
            orders: None,
            filter: OrderFilter::default(),
            visible_indices: Vec::new(),
            colors: None,
            plot_style: PlotStyle::default(),
            status_message: None,
        }
    }

    /// Read NSDRP flux tables and make them the current orders.
    pub fn load_files(&mut self, paths: &[PathBuf]) {
        match OrderList::read(paths, &self.config) {
            Ok(list) => {
                log::info!("Loaded orders {:?}", list.order_numbers());
                self.set_orders(list);
            }
            Err(e) => {
                log::error!("Failed to load files: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest newly loaded orders, initialise filter and colours.
    pub fn set_orders(&mut self, list: OrderList) {
        self.filter = init_order_filter(&list);
        self.colors = Some(OrderColors::new(&list.order_numbers()));
        self.raw = Some(list);
        self.status_message = None;
        self.reprocess();
    }

    /// Re-run the enabled processing steps on the raw orders.
    pub fn reprocess(&mut self) {
        let Some(raw) = &self.raw else {
            return;
        };
        match self.processing.apply(raw.clone(), &self.config) {
            Ok(list) => {
                self.orders = Some(list);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Processing failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.orders = Some(raw.clone());
            }
        }
        self.refilter();
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(list) = &self.orders {
            self.visible_indices = filtered_indices(list, &self.filter);
        }
    }

    /// Toggle a single order in the filter.
    pub fn toggle_order(&mut self, m: i64) {
        if !self.filter.remove(&m) {
            self.filter.insert(m);
        }
        self.refilter();
    }

    pub fn select_all(&mut self) {
        if let Some(list) = &self.raw {
            self.filter = init_order_filter(list);
            self.refilter();
        }
    }

    pub fn select_none(&mut self) {
        self.filter.clear();
        self.refilter();
    }

    /// The visible orders as their own list, for export.
    pub fn visible_orders(&self) -> Option<OrderList> {
        let list = self.orders.as_ref()?;
        Some(
            self.visible_indices
                .iter()
                .filter_map(|&i| list.get(i).cloned())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nirspec_orders::{EchelleSpectrum, OrderMeta};

    fn list() -> OrderList {
        [63, 64]
            .iter()
            .map(|&m| {
                EchelleSpectrum::new(vec![1.0, 2.0, 3.0], vec![2.0, f64::NAN, 4.0])
                    .unwrap()
                    .with_meta(OrderMeta {
                        m: Some(m),
                        ..OrderMeta::default()
                    })
            })
            .collect()
    }

    #[test]
    fn processing_reapplies_from_raw() {
        let mut state = AppState::new(LoaderConfig::default());
        state.set_orders(list());
        assert_eq!(state.orders.as_ref().unwrap()[0].len(), 3);

        state.processing.remove_nans = true;
        state.processing.normalize = true;
        state.reprocess();
        let orders = state.orders.as_ref().unwrap();
        assert_eq!(orders[0].flux(), &[2.0 / 3.0, 4.0 / 3.0]);

        state.processing = Processing::from_config(&state.config);
        state.reprocess();
        assert_eq!(state.orders.as_ref().unwrap()[0].len(), 3);
    }

    #[test]
    fn toggling_orders_updates_visibility() {
        let mut state = AppState::new(LoaderConfig::default());
        state.set_orders(list());
        assert_eq!(state.visible_indices, vec![0, 1]);

        state.toggle_order(63);
        assert_eq!(state.visible_indices, vec![1]);
        assert_eq!(state.visible_orders().unwrap().order_numbers(), vec![64]);

        state.select_none();
        assert!(state.visible_indices.is_empty());
        state.select_all();
        assert_eq!(state.visible_indices, vec![0, 1]);
    }
}
