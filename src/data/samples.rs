//! Built-in sample datasets.

use crate::data::cell::DataCell;
use crate::data::dataset::{DataOrigin, TabularDataset};
use crate::data::error::DataResult;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// The dataset of a new project
pub fn blank() -> DataResult<TabularDataset> {
    Ok(TabularDataset::blank())
}

/// Thirty samples of contamination against rawness
pub fn contamination() -> DataResult<TabularDataset> {
    const CONTAMINATION: [f64; 30] = [
        2.0, 3.0, 2.5, 4.0, 5.0, 3.0, 2.0, 1.0, 1.5, 2.0, 3.5, 5.0, 6.0, 7.0, 5.0, 4.0, 3.0, 2.5,
        2.0, 1.5, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 5.5, 4.5, 3.5, 2.5,
    ];
    const RAWNESS: [i64; 30] = [
        95, 93, 94, 90, 85, 92, 96, 98, 97, 95, 91, 86, 80, 75, 84, 88, 92, 93, 95, 96, 98, 96, 93,
        89, 86, 82, 84, 87, 91, 94,
    ];

    let ds = TabularDataset::from_columns(
        "Contamination vs Rawness Example",
        vec![
            ("Sample".to_string(), (1..=30).map(DataCell::Integer).collect()),
            (
                "Contamination (ppm)".to_string(),
                CONTAMINATION.iter().map(|v| DataCell::float(*v)).collect(),
            ),
            (
                "Rawness Index".to_string(),
                RAWNESS.iter().map(|v| DataCell::Integer(*v)).collect(),
            ),
        ],
    )?;
    Ok(ds.with_origin(sample_origin("contamination")))
}

/// One hundred days of three overlapping metrics
pub fn overlapping_trends() -> DataResult<TabularDataset> {
    let start = date(2023, 1, 1);
    let days: Vec<f64> = (0..100).map(f64::from).collect();

    let ds = TabularDataset::from_columns(
        "Overlapping Trends Example",
        vec![
            (
                "Date".to_string(),
                (0..100)
                    .map(|i| DataCell::DateTime(start + Duration::days(i)))
                    .collect(),
            ),
            series("Metric A", &days, |x| 100.0 + x * 0.5 + 10.0 * (x / 10.0).sin()),
            series("Metric B", &days, |x| 80.0 + x * 0.3 + 8.0 * (x / 15.0).cos()),
            series("Metric C", &days, |x| 120.0 + x * 0.2 + 5.0 * (x / 8.0).sin()),
        ],
    )?;
    Ok(ds.with_origin(sample_origin("overlapping_trends")))
}

/// Four years of month-end economic indicators, suited to a secondary axis
pub fn economic_indicators() -> DataResult<TabularDataset> {
    let months: Vec<f64> = (0..48).map(f64::from).collect();

    let ds = TabularDataset::from_columns(
        "Economic Indicators Example",
        vec![
            (
                "Date".to_string(),
                (0..48).map(|i| DataCell::DateTime(month_end(2020, i))).collect(),
            ),
            series("GDP (Billions)", &months, |x| 20000.0 + x * 100.0 + 500.0 * (x / 6.0).sin()),
            series("Unemployment (%)", &months, |x| 5.0 + 2.0 * (x / 8.0 + 1.0).sin()),
            series("Interest Rate (%)", &months, |x| 2.0 + 1.5 * (x / 10.0).cos()),
        ],
    )?;
    Ok(ds.with_origin(sample_origin("economic_indicators")))
}

fn sample_origin(name: &str) -> DataOrigin {
    DataOrigin::Sample {
        name: name.to_string(),
    }
}

fn series(name: &str, xs: &[f64], f: impl Fn(f64) -> f64) -> (String, Vec<DataCell>) {
    (name.to_string(), xs.iter().map(|x| DataCell::float(f(*x))).collect())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_default()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
}

/// Last day of the `offset`-th month after January of `year`
fn month_end(year: i32, offset: i32) -> NaiveDateTime {
    let index = offset + 1;
    let (y, m) = (year + index / 12, (index % 12) as u32 + 1);
    let first_of_next = date(y, m, 1);
    first_of_next - Duration::days(1)
}
