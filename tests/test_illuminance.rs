use std::io::Write;
use std::sync::Arc;

use daylight_metrics::grid::PointGrid;
use daylight_metrics::illuminance::*;
use daylight_metrics::types::{Point, ThresholdBand};
use daylight_metrics::DaylightError;
use tempfile::NamedTempFile;

macro_rules! assert_approx {
    ($left:expr, $right:expr, $tol:expr) => {
        let (l, r) = ($left as f64, $right as f64);
        assert!(
            (l - r).abs() <= $tol,
            "assert_approx failed: left={}, right={}, diff={}, tol={}",
            l, r, (l - r).abs(), $tol
        );
    };
}

fn line_grid(n: usize) -> Arc<PointGrid> {
    let points = (0..n)
        .map(|i| Point::new(i as f64, 0.0, 0.75, [0.0, 0.0, 1.0], i))
        .collect();
    Arc::new(PointGrid::from_points(points))
}

fn array(values: &[f64]) -> IlluminanceArray {
    IlluminanceArray::new(values.to_vec(), line_grid(values.len())).unwrap()
}

// ── Construction ──

#[test]
fn test_new_checks_length() {
    let err = IlluminanceArray::new(vec![1.0, 2.0], line_grid(3)).unwrap_err();
    assert!(matches!(err, DaylightError::LengthMismatch { expected: 3, found: 2 }));
}

#[test]
fn test_read_values_takes_last_token() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"Illuminance results\nP1 120.5\n\nP2 300\n410\n").unwrap();
    let values = read_values(file.path()).unwrap();
    assert_eq!(values, vec![120.5, 300.0, 410.0]);

    let arr = IlluminanceArray::from_file(file.path(), line_grid(3)).unwrap();
    assert_eq!(arr.values(), &[120.5, 300.0, 410.0]);
    assert!(IlluminanceArray::from_file(file.path(), line_grid(2)).is_err());
}

#[test]
fn test_read_values_missing_file() {
    assert!(matches!(
        read_values("/no/such/values.txt"),
        Err(DaylightError::FileNotFound { .. })
    ));
}

// ── Filtering ──

#[test]
fn test_filter_upper_bound_is_inclusive() {
    let arr = array(&[299.999, 300.0, 300.001]);
    let band = ThresholdBand::from_bounds(Some(300.0), None).unwrap();
    let summary = arr.filter(band, false);
    assert_eq!(summary.count, 2);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.percent, 0.667);
    assert!(summary.points.is_empty());
}

#[test]
fn test_filter_lower_bound_only() {
    let arr = array(&[299.999, 300.0, 300.001]);
    let band = ThresholdBand::from_bounds(None, Some(300.0)).unwrap();
    assert_eq!(arr.count(band), 2);
}

#[test]
fn test_filter_both_bounds() {
    let arr = array(&[50.0, 100.0, 500.0, 2000.0, 2500.0]);
    let band = ThresholdBand::from_bounds(Some(2000.0), Some(100.0)).unwrap();
    assert_eq!(band, ThresholdBand::Between { lower: 100.0, upper: 2000.0 });
    assert_eq!(arr.count(band), 3);
    assert_eq!(arr.fraction(band), 0.6);
}

#[test]
fn test_filter_without_bounds() {
    assert!(matches!(
        ThresholdBand::from_bounds(None, None),
        Err(DaylightError::MissingBounds)
    ));
}

#[test]
fn test_filter_is_repeatable() {
    let arr = array(&[10.0, 400.0, 800.0]);
    let band = ThresholdBand::AtLeast(300.0);
    let first = arr.filter(band, true);
    let second = arr.filter(band, true);
    assert_eq!(first, second);
    assert_eq!(arr.values(), &[10.0, 400.0, 800.0]);
}

#[test]
fn test_filter_lists_points() {
    let arr = array(&[10.0, 400.0, 800.0]);
    let summary = arr.filter(ThresholdBand::AtLeast(300.0), true);
    let listed: Vec<(usize, f64)> = summary
        .points
        .iter()
        .map(|r| (r.point.index, r.value))
        .collect();
    assert_eq!(listed, vec![(1, 400.0), (2, 800.0)]);
    assert_eq!(summary.points[0].point.x, 1.0);
}

#[test]
fn test_strict_bands() {
    let arr = array(&[99.0, 100.0, 2000.0, 2001.0]);
    assert_eq!(arr.count(ThresholdBand::Below(100.0)), 1);
    assert_eq!(arr.count(ThresholdBand::Above(2000.0)), 1);
}

// ── Extremes and statistics ──

#[test]
fn test_max_min_report_ties() {
    let arr = array(&[5.0, 9.0, 9.0, 1.0, 1.0]);
    assert_eq!(
        arr.max(),
        Some(Extreme {
            value: 9.0,
            points: vec![1, 2]
        })
    );
    assert_eq!(
        arr.min(),
        Some(Extreme {
            value: 1.0,
            points: vec![3, 4]
        })
    );
}

#[test]
fn test_empty_array() {
    let arr = array(&[]);
    assert!(arr.is_empty());
    assert_eq!(arr.max(), None);
    assert_eq!(arr.min(), None);
    assert_eq!(arr.average(), None);
    assert_eq!(arr.percentile(50.0), None);
    assert_eq!(arr.stats(), IlluminanceStats::default());
    let summary = arr.filter(ThresholdBand::AtLeast(0.0), false);
    assert_eq!((summary.count, summary.total, summary.percent), (0, 0, 0.0));
}

#[test]
fn test_stats_ratios() {
    let stats = array(&[100.0, 200.0, 300.0, 400.0]).stats();
    assert_eq!(stats.average, Some(250.0));
    assert_approx!(stats.average_to_max.unwrap(), 0.63, 1e-9);
    assert_approx!(stats.average_to_min.unwrap(), 2.5, 1e-9);
    assert_approx!(stats.max_to_min.unwrap(), 4.0, 1e-9);
}

#[test]
fn test_stats_zero_minimum() {
    let stats = array(&[0.0, 10.0]).stats();
    assert_eq!(stats.average, Some(5.0));
    assert_eq!(stats.average_to_min, None);
    assert_eq!(stats.max_to_min, None);
    assert_approx!(stats.average_to_max.unwrap(), 0.5, 1e-9);
}

#[test]
fn test_percentile() {
    let arr = array(&[5.0, 1.0, 4.0, 2.0, 3.0]);
    assert_approx!(arr.percentile(50.0).unwrap(), 3.0, 1e-9);
    assert_approx!(arr.percentile(25.0).unwrap(), 2.0, 1e-9);
    assert_approx!(arr.percentile(90.0).unwrap(), 4.6, 1e-9);
    assert_approx!(arr.percentile(0.0).unwrap(), 1.0, 1e-9);
    assert_approx!(arr.percentile(150.0).unwrap(), 5.0, 1e-9);
}

// ── Arithmetic ──

#[test]
fn test_arithmetic_leaves_inputs_untouched() {
    let grid = line_grid(3);
    let a = IlluminanceArray::new(vec![1.0, 2.0, 3.0], Arc::clone(&grid)).unwrap();
    let b = IlluminanceArray::new(vec![10.0, 20.0, 30.0], Arc::clone(&grid)).unwrap();

    assert_eq!(a.try_add(&b).unwrap().values(), &[11.0, 22.0, 33.0]);
    assert_eq!(b.try_sub(&a).unwrap().values(), &[9.0, 18.0, 27.0]);
    assert_eq!(a.try_mul(&b).unwrap().values(), &[10.0, 40.0, 90.0]);
    assert_eq!(a.scale(2.0).values(), &[2.0, 4.0, 6.0]);
    assert_eq!((&a * 0.5).values(), &[0.5, 1.0, 1.5]);
    assert_eq!(a.map(|v| v + 1.0).values(), &[2.0, 3.0, 4.0]);

    assert_eq!(a.values(), &[1.0, 2.0, 3.0]);
    assert_eq!(b.values(), &[10.0, 20.0, 30.0]);
}

#[test]
fn test_results_share_grid() {
    let a = array(&[1.0, 2.0]);
    let doubled = a.scale(2.0);
    assert!(Arc::ptr_eq(a.grid(), doubled.grid()));
}

#[test]
fn test_arithmetic_length_mismatch() {
    let a = array(&[1.0, 2.0, 3.0]);
    let b = array(&[1.0, 2.0]);
    assert!(matches!(
        a.try_add(&b),
        Err(DaylightError::LengthMismatch { expected: 3, found: 2 })
    ));
}
