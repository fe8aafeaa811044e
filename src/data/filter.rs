use std::collections::BTreeSet;

use super::order_list::OrderList;

// ---------------------------------------------------------------------------
// Order selection: which echelle orders are shown
// ---------------------------------------------------------------------------

/// Selected order numbers. An empty set hides everything.
pub type OrderFilter = BTreeSet<i64>;

/// Initialise an [`OrderFilter`] with every order selected.
pub fn init_order_filter(list: &OrderList) -> OrderFilter {
    list.order_numbers().into_iter().collect()
}

/// Return indices of orders whose number is selected.
pub fn filtered_indices(list: &OrderList, filter: &OrderFilter) -> Vec<usize> {
    list.order_numbers()
        .into_iter()
        .enumerate()
        .filter(|(_, m)| filter.contains(m))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{EchelleSpectrum, OrderMeta};

    fn list(orders: &[i64]) -> OrderList {
        orders
            .iter()
            .map(|&m| {
                EchelleSpectrum::new(vec![1.0], vec![1.0])
                    .unwrap()
                    .with_meta(OrderMeta {
                        m: Some(m),
                        ..OrderMeta::default()
                    })
            })
            .collect()
    }

    #[test]
    fn all_selected_by_default() {
        let l = list(&[64, 63, 62]);
        let f = init_order_filter(&l);
        assert_eq!(filtered_indices(&l, &f), vec![0, 1, 2]);
    }

    #[test]
    fn deselected_orders_are_hidden() {
        let l = list(&[64, 63, 62]);
        let mut f = init_order_filter(&l);
        f.remove(&63);
        assert_eq!(filtered_indices(&l, &f), vec![0, 2]);
        assert!(filtered_indices(&l, &OrderFilter::new()).is_empty());
    }
}
