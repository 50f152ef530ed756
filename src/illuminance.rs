use std::fs;
use std::ops::Mul;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::calendar::round_to;
use crate::error::{DaylightError, Result};
use crate::grid::PointGrid;
use crate::types::{Point, ThresholdBand};

/// Illuminance of every sensor point at one timestep. Value `i` belongs to the point with
/// file index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct IlluminanceArray {
    values: Vec<f64>,
    grid: Arc<PointGrid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointReading {
    pub point: Point,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSummary {
    pub band: ThresholdBand,
    pub count: usize,
    pub total: usize,
    pub percent: f64,
    pub points: Vec<PointReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extreme {
    pub value: f64,
    pub points: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct IlluminanceStats {
    pub average: Option<f64>,
    pub average_to_max: Option<f64>,
    pub average_to_min: Option<f64>,
    pub max_to_min: Option<f64>,
}

impl IlluminanceArray {
    pub fn new(values: Vec<f64>, grid: Arc<PointGrid>) -> Result<Self> {
        if values.len() != grid.len() {
            return Err(DaylightError::LengthMismatch {
                expected: grid.len(),
                found: values.len(),
            });
        }
        Ok(Self { values, grid })
    }

    pub fn from_file(path: impl AsRef<Path>, grid: Arc<PointGrid>) -> Result<Self> {
        Self::new(read_values(path)?, grid)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn grid(&self) -> &Arc<PointGrid> {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn try_add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn try_mul(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            values: self.values.iter().map(|&v| f(v)).collect(),
            grid: Arc::clone(&self.grid),
        }
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        if other.len() != self.len() {
            return Err(DaylightError::LengthMismatch {
                expected: self.len(),
                found: other.len(),
            });
        }
        Ok(Self {
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
            grid: Arc::clone(&self.grid),
        })
    }

    pub fn count(&self, band: ThresholdBand) -> usize {
        self.values.iter().filter(|&&v| band.contains(v)).count()
    }

    pub fn fraction(&self, band: ThresholdBand) -> f64 {
        ratio(self.count(band), self.len())
    }

    pub fn filter(&self, band: ThresholdBand, list_points: bool) -> FilterSummary {
        let count = self.count(band);
        let points = if list_points {
            self.values
                .iter()
                .enumerate()
                .filter(|(_, &v)| band.contains(v))
                .filter_map(|(i, &value)| {
                    self.grid.point(i).map(|point| PointReading {
                        point: point.clone(),
                        value,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };
        FilterSummary {
            band,
            count,
            total: self.len(),
            percent: ratio(count, self.len()),
            points,
        }
    }

    pub fn max(&self) -> Option<Extreme> {
        self.extreme(f64::max)
    }

    pub fn min(&self) -> Option<Extreme> {
        self.extreme(f64::min)
    }

    fn extreme(&self, pick: fn(f64, f64) -> f64) -> Option<Extreme> {
        let value = self.values.iter().copied().reduce(pick)?;
        let points = self
            .values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == value)
            .map(|(i, _)| i)
            .collect();
        Some(Extreme { value, points })
    }

    pub fn average(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.len() as f64)
    }

    pub fn stats(&self) -> IlluminanceStats {
        let (Some(average), Some(max), Some(min)) = (self.average(), self.max(), self.min()) else {
            return IlluminanceStats::default();
        };
        let divide = |a: f64, b: f64| (b != 0.0).then(|| round_to(a / b, 2));
        IlluminanceStats {
            average: Some(round_to(average, 2)),
            average_to_max: divide(average, max.value),
            average_to_min: divide(average, min.value),
            max_to_min: divide(max.value, min.value),
        }
    }

    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
    }
}

impl Mul<f64> for &IlluminanceArray {
    type Output = IlluminanceArray;

    fn mul(self, factor: f64) -> IlluminanceArray {
        self.scale(factor)
    }
}

/// Reads one value per line, taking the last token so labelled exports parse. Lines whose
/// last token is not a number are skipped.
pub fn read_values(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DaylightError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|e| DaylightError::io(path, e))?;
    let mut values = Vec::new();
    let mut skipped = 0;
    for line in text.lines() {
        let Some(last) = line.split_whitespace().last() else {
            continue;
        };
        match last.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped,
            values = values.len(),
            "illuminance file contains text in addition to numbers"
        );
    }
    Ok(values)
}

pub(crate) fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_to(count as f64 / total as f64, 3)
    }
}
