mod common;

use common::{write_order, OrderTable};
use nirspec_orders::data::stats::nanmedian;
use nirspec_orders::{EchelleSpectrum, FluxUnit, LoaderConfig, OrderList, OrderMeta, SpectrumError};

/// Three orders with distinct continuum levels, in non-sorted order.
fn write_reduction(root: &std::path::Path) -> Vec<std::path::PathBuf> {
    [(64, 300.0), (62, 100.0), (63, 200.0)]
        .iter()
        .map(|&(m, level)| {
            let start = 740_000.0 / m as f64;
            let mut table = OrderTable::flat(1024, start, level);
            table.flux[0] = f64::NAN;
            table.flux[500] = level * 40.0;
            write_order(root, m, &table, true)
        })
        .collect()
}

#[test]
fn read_keeps_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_reduction(dir.path());

    let list = OrderList::read(&files, &LoaderConfig::default()).unwrap();
    assert_eq!(list.len(), files.len());
    assert_eq!(list.order_numbers(), vec![64, 62, 63]);
    assert!(list.iter().all(|o| o.header().is_ok()));
}

#[test]
fn read_aborts_on_the_first_bad_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = write_reduction(dir.path());
    files.insert(1, dir.path().join("fitstbl/NS.20100530.49520_65_flux.fits"));

    let err = OrderList::read(&files, &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, SpectrumError::UnsupportedFormat(_)));

    let mut files = write_reduction(dir.path());
    files.push(dir.path().join("fitstbl/NS.20100530.49520_66_flux_tbl.fits"));
    let err = OrderList::read(&files, &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, SpectrumError::FileNotFound(_)));
}

#[test]
fn normalize_scales_every_order_by_the_first_median() {
    let dir = tempfile::tempdir().unwrap();
    let list = OrderList::read(&write_reduction(dir.path()), &LoaderConfig::default()).unwrap();
    let before: Vec<f64> = list.iter().map(|o| o.flux()[10]).collect();
    let scale = nanmedian(list[0].flux());

    let normalized = list.normalize().unwrap();
    assert!((nanmedian(normalized[0].flux()) - 1.0).abs() < 1e-12);
    for (order, raw) in normalized.iter().zip(before) {
        assert!((order.flux()[10] - raw / scale).abs() < 1e-12);
        assert_eq!(order.flux_unit(), FluxUnit::Dimensionless);
    }
}

#[test]
fn normalize_of_an_empty_list_fails() {
    assert!(matches!(
        OrderList::default().normalize(),
        Err(SpectrumError::EmptyOrderList)
    ));
}

#[test]
fn stitch_concatenates_in_list_order() {
    let a = EchelleSpectrum::new(vec![3.0, 4.0, 5.0], vec![1.0, 2.0, 3.0]).unwrap();
    let b = EchelleSpectrum::new(vec![1.0, 2.0], vec![4.0, 5.0])
        .unwrap()
        .with_meta(OrderMeta {
            m: Some(40),
            ..OrderMeta::default()
        });
    let stitched = OrderList::new(vec![a, b]).stitch().unwrap();

    assert_eq!(stitched.len(), 5);
    assert_eq!(stitched.wavelength(), &[3.0, 4.0, 5.0, 1.0, 2.0]);
    assert_eq!(stitched.flux(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert!(stitched.uncertainty().is_none());
    assert!(stitched.order().is_err());
}

#[test]
fn cleaning_keeps_sky_aligned_with_the_science_spectrum() {
    let dir = tempfile::tempdir().unwrap();
    let list = OrderList::read(&write_reduction(dir.path()), &LoaderConfig::default())
        .unwrap()
        .remove_nans()
        .unwrap()
        .trim_edges()
        .unwrap()
        .remove_outliers(5.0)
        .unwrap();

    for order in &list {
        let sky = order.sky().unwrap();
        let x = order.x_values().unwrap();
        assert_eq!(sky.len(), order.len());
        assert_eq!(sky.wavelength(), order.wavelength());
        assert_eq!(x.len(), order.len());
        assert_eq!(x.first(), Some(&10));
        assert_eq!(x.last(), Some(&1000));
        // The spike at column 500 is gone, its neighbours are not.
        assert!(!x.contains(&500));
        assert!(x.contains(&499) && x.contains(&501));
        assert_eq!(order.len(), 990);
    }
}

#[test]
fn parquet_export_writes_one_file_per_order() {
    let dir = tempfile::tempdir().unwrap();
    let list = OrderList::read(&write_reduction(dir.path()), &LoaderConfig::default()).unwrap();
    let out = dir.path().join("export");

    let written = list.to_parquet(&out, "night1").unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["night1_m64.parquet", "night1_m62.parquet", "night1_m63.parquet"]
    );
    assert!(written.iter().all(|p| p.exists()));
}
