use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::calendar::round_to;
use crate::error::{DaylightError, Result};
use crate::grid::PointGrid;
use crate::illuminance::{ratio, IlluminanceArray};
use crate::time_series::TimeSeries;
use crate::types::{
    AnalysisConfig, AseCriteria, HourWindow, SdaCriteria, ThresholdBand, UdiCriteria,
};

const MERGE_DECIMALS: u32 = 2;

#[derive(Debug, Clone)]
pub struct AnnualIlluminance {
    series: TimeSeries,
    grid: Arc<PointGrid>,
    arrays: Vec<IlluminanceArray>,
    span: tracing::Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointQuery {
    pub window: Option<HourWindow>,
    pub difference_from: Option<f64>,
    pub percent_of: Option<f64>,
    pub decimals: u32,
}

impl Default for PointQuery {
    fn default() -> Self {
        Self {
            window: None,
            difference_from: None,
            percent_of: None,
            decimals: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointHours {
    pub counts: Vec<usize>,
    pub window_hours: usize,
}

impl PointHours {
    pub fn fractions(&self) -> Vec<f64> {
        self.counts
            .iter()
            .map(|&c| ratio(c, self.window_hours))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UdiBands<T> {
    pub below: Vec<T>,
    pub useful: Vec<T>,
    pub above: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub sda: f64,
    pub ase: f64,
    pub udi_below: f64,
    pub udi_useful: f64,
    pub udi_above: f64,
}

impl AnnualIlluminance {
    pub fn load(
        ill_path: impl AsRef<Path>,
        pts_path: impl AsRef<Path>,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        let grid = PointGrid::parse_with(pts_path, &config.grid)?;
        let series = TimeSeries::parse(ill_path, &config.parse)?;
        Self::from_parts(series, Arc::new(grid))
    }

    pub fn load_with_timestamps(
        ill_path: impl AsRef<Path>,
        pts_path: impl AsRef<Path>,
        timestamp_path: impl AsRef<Path>,
        merged_path: Option<&Path>,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        let stamps = TimeSeries::parse(timestamp_path, &config.parse)?;
        let merged =
            stamps.merge_timestamps(ill_path, merged_path, Some(MERGE_DECIMALS), true)?;
        Self::load(merged, pts_path, config)
    }

    pub fn from_parts(series: TimeSeries, grid: Arc<PointGrid>) -> Result<Self> {
        let span = tracing::info_span!(
            "annual_illuminance",
            ill = %display_path(series.source()),
            pts = %display_path(grid.source()),
        );
        let arrays = {
            let _guard = span.enter();
            let arrays = series
                .records()
                .iter()
                .map(|record| {
                    let values =
                        record
                            .data
                            .numbers()
                            .ok_or(DaylightError::NonNumericPayload {
                                hour_of_year: record.hour_of_year,
                            })?;
                    IlluminanceArray::new(values, Arc::clone(&grid))
                })
                .collect::<Result<Vec<_>>>()?;
            tracing::info!(
                records = arrays.len(),
                points = grid.len(),
                "bound illuminance to grid"
            );
            arrays
        };
        Ok(Self {
            series,
            grid,
            arrays,
            span,
        })
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn grid(&self) -> &Arc<PointGrid> {
        &self.grid
    }

    pub fn arrays(&self) -> &[IlluminanceArray] {
        &self.arrays
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.series.timestamps()
    }

    pub fn full_window(&self) -> HourWindow {
        let hours = self.series.records().iter().map(|r| r.hour);
        let start = hours.clone().fold(f64::INFINITY, f64::min);
        let end = hours.fold(f64::NEG_INFINITY, f64::max);
        HourWindow::new(start, end)
    }

    fn window_indices(&self, window: HourWindow) -> Vec<usize> {
        self.series
            .records()
            .iter()
            .enumerate()
            .filter(|(_, r)| window.contains(r.hour))
            .map(|(i, _)| i)
            .collect()
    }

    // 1-based in, 0-based out; `None` selects every point.
    fn select_points(&self, points: Option<&[usize]>) -> Result<Vec<usize>> {
        let count = self.grid.len();
        match points {
            None => Ok((0..count).collect()),
            Some(points) => points
                .iter()
                .map(|&point| {
                    if (1..=count).contains(&point) {
                        Ok(point - 1)
                    } else {
                        Err(DaylightError::PointOutOfRange { point, count })
                    }
                })
                .collect(),
        }
    }

    /// Illuminance of one point (1-based) over the hours inside the query window.
    pub fn point_illuminance(&self, point: usize, query: &PointQuery) -> Result<Vec<f64>> {
        let index = self.select_points(Some(std::slice::from_ref(&point)))?[0];
        if let (Some(difference_from), Some(percent_of)) = (query.difference_from, query.percent_of) {
            return Err(DaylightError::ConflictingNormalization {
                difference_from,
                percent_of,
            });
        }
        if query.percent_of == Some(0.0) {
            return Err(DaylightError::ZeroReference);
        }
        let window = query.window.unwrap_or_else(|| self.full_window());
        let values = self
            .window_indices(window)
            .into_iter()
            .filter_map(|i| self.arrays[i].get(index));
        let values: Vec<f64> = match (query.difference_from, query.percent_of) {
            (Some(reference), _) => values
                .map(|v| round_to(v - reference, query.decimals))
                .collect(),
            (_, Some(reference)) => values
                .map(|v| round_to(v / reference, query.decimals))
                .collect(),
            _ => values.collect(),
        };
        Ok(values)
    }

    /// Points are 1-based; `None` selects all of them.
    pub fn points_time_summary(
        &self,
        band: ThresholdBand,
        window: HourWindow,
        points: Option<&[usize]>,
    ) -> Result<PointHours> {
        let selected = self.select_points(points)?;
        let hours = self.window_indices(window);
        let counts = selected
            .iter()
            .map(|&p| {
                hours
                    .iter()
                    .filter(|&&h| self.arrays[h].get(p).is_some_and(|v| band.contains(v)))
                    .count()
            })
            .collect();
        Ok(PointHours {
            counts,
            window_hours: hours.len(),
        })
    }

    pub fn sda_detailed(&self, criteria: &SdaCriteria) -> Result<Vec<f64>> {
        let _guard = self.span.enter();
        let summary =
            self.points_time_summary(ThresholdBand::AtLeast(criteria.threshold), criteria.window, None)?;
        Ok(summary.fractions())
    }

    pub fn spatial_daylight_autonomy(&self, criteria: &SdaCriteria) -> Result<f64> {
        let fractions = self.sda_detailed(criteria)?;
        let passing = fractions.iter().filter(|&&f| f >= criteria.cutoff).count();
        let sda = share(passing, fractions.len());
        let _guard = self.span.enter();
        tracing::debug!(sda, passing, points = fractions.len(), "computed sDA");
        Ok(sda)
    }

    /// Hours each point spends strictly above the ASE threshold.
    pub fn ase_detailed(&self, criteria: &AseCriteria) -> Result<PointHours> {
        let _guard = self.span.enter();
        self.points_time_summary(ThresholdBand::Above(criteria.threshold), criteria.window, None)
    }

    pub fn annual_sunlight_exposure(&self, criteria: &AseCriteria) -> Result<f64> {
        let summary = self.ase_detailed(criteria)?;
        let exposed = summary.counts.iter().filter(|&&c| c > criteria.hours).count();
        let ase = share(exposed, summary.counts.len());
        let _guard = self.span.enter();
        tracing::debug!(ase, exposed, points = summary.counts.len(), "computed ASE");
        Ok(ase)
    }

    pub fn udi_hours(&self, criteria: &UdiCriteria) -> Result<UdiBands<usize>> {
        let _guard = self.span.enter();
        let count = |band| {
            self.points_time_summary(band, criteria.window, None)
                .map(|summary| summary.counts)
        };
        Ok(UdiBands {
            below: count(ThresholdBand::Below(criteria.low))?,
            useful: count(ThresholdBand::Between {
                lower: criteria.low,
                upper: criteria.high,
            })?,
            above: count(ThresholdBand::Above(criteria.high))?,
        })
    }

    pub fn udi_fractions(&self, criteria: &UdiCriteria) -> Result<UdiBands<f64>> {
        let window_hours = self.window_indices(criteria.window).len();
        let hours = self.udi_hours(criteria)?;
        let to_fractions = |counts: Vec<usize>| -> Vec<f64> {
            counts.into_iter().map(|c| ratio(c, window_hours)).collect()
        };
        Ok(UdiBands {
            below: to_fractions(hours.below),
            useful: to_fractions(hours.useful),
            above: to_fractions(hours.above),
        })
    }

    pub fn metrics_summary(&self, config: &AnalysisConfig) -> Result<MetricsSummary> {
        let udi = self.udi_fractions(&config.udi)?;
        Ok(MetricsSummary {
            sda: self.spatial_daylight_autonomy(&config.sda)?,
            ase: self.annual_sunlight_exposure(&config.ase)?,
            udi_below: mean(&udi.below),
            udi_useful: mean(&udi.useful),
            udi_above: mean(&udi.above),
        })
    }

    /// Illuminance of every point at record `index` (0-based).
    pub fn illuminance_at(&self, index: usize) -> Result<Vec<f64>> {
        self.arrays
            .get(index)
            .map(|a| a.values().to_vec())
            .ok_or(DaylightError::RecordOutOfRange {
                index,
                len: self.arrays.len(),
            })
    }

    pub fn illuminance_full(&self) -> Vec<Vec<f64>> {
        self.arrays.iter().map(|a| a.values().to_vec()).collect()
    }

    pub fn illuminance_monthly(&self, month: u32) -> Result<Vec<Vec<f64>>> {
        self.slice_by(month, |ts| ts.month())
            .ok_or_else(|| DaylightError::MonthNotFound {
                month,
                available: self.distinct(|ts| ts.month()),
            })
    }

    /// Every record whose clock hour (0 to 23) is `hour`.
    pub fn illuminance_hourly(&self, hour: u32) -> Result<Vec<Vec<f64>>> {
        self.slice_by(hour, |ts| ts.hour())
            .ok_or_else(|| DaylightError::HourNotFound {
                hour,
                available: self.distinct(|ts| ts.hour()),
            })
    }

    fn slice_by(&self, wanted: u32, key: impl Fn(&NaiveDateTime) -> u32) -> Option<Vec<Vec<f64>>> {
        let rows: Vec<Vec<f64>> = self
            .series
            .records()
            .iter()
            .zip(&self.arrays)
            .filter(|(r, _)| key(&r.timestamp) == wanted)
            .map(|(_, a)| a.values().to_vec())
            .collect();
        (!rows.is_empty()).then_some(rows)
    }

    fn distinct(&self, key: impl Fn(&NaiveDateTime) -> u32) -> Vec<u32> {
        self.series
            .records()
            .iter()
            .map(|r| key(&r.timestamp))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn hourly_max(&self) -> Vec<Option<f64>> {
        self.arrays.iter().map(|a| a.max().map(|e| e.value)).collect()
    }

    pub fn hourly_min(&self) -> Vec<Option<f64>> {
        self.arrays.iter().map(|a| a.min().map(|e| e.value)).collect()
    }

    pub fn hourly_band_counts(&self, band: ThresholdBand) -> Vec<usize> {
        self.arrays.iter().map(|a| a.count(band)).collect()
    }

    pub fn try_add(&self, other: &Self) -> Result<Self> {
        self.combine(other, IlluminanceArray::try_add)
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self> {
        self.combine(other, IlluminanceArray::try_sub)
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            series: self.series.clone(),
            grid: Arc::clone(&self.grid),
            arrays: self.arrays.iter().map(|a| a.scale(factor)).collect(),
            span: self.span.clone(),
        }
    }

    fn combine(
        &self,
        other: &Self,
        op: impl Fn(&IlluminanceArray, &IlluminanceArray) -> Result<IlluminanceArray>,
    ) -> Result<Self> {
        if other.len() != self.len() {
            return Err(DaylightError::LengthMismatch {
                expected: self.len(),
                found: other.len(),
            });
        }
        let arrays = self
            .arrays
            .iter()
            .zip(&other.arrays)
            .map(|(a, b)| op(a, b))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            series: self.series.clone(),
            grid: Arc::clone(&self.grid),
            arrays,
            span: self.span.clone(),
        })
    }
}

impl fmt::Display for AnnualIlluminance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files and Points Summary:")?;
        writeln!(f, "\tIlluminance file: {}", display_path(self.series.source()))?;
        writeln!(f, "\tPoints file: {}", display_path(self.grid.source()))?;
        for line in self.grid.summary().to_string().lines() {
            writeln!(f, "\t{}", line)?;
        }

        let records = self.series.records();
        let months: BTreeSet<u32> = records.iter().map(|r| r.month).collect();
        let dates: BTreeSet<u32> = records.iter().map(|r| r.day).collect();
        let mut hours: Vec<f64> = records.iter().map(|r| r.hour).collect();
        hours.sort_by(f64::total_cmp);
        hours.dedup();

        writeln!(f)?;
        writeln!(f, "TimeSeries summary:")?;
        writeln!(f, "\tMonths({}): {}", months.len(), join(months.iter()))?;
        writeln!(f, "\tDates({}): {}", dates.len(), join(dates.iter()))?;
        writeln!(f, "\tHours({}): {}", hours.len(), join(hours.iter()))?;
        write!(f, "\tTotal Number of data points: {}", records.len())
    }
}

fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(",")
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| String::from("<memory>"))
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        round_to(values.iter().sum::<f64>() / values.len() as f64, 3)
    }
}
