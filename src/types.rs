use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DaylightError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub normal: [f64; 3],
    /// Position of the point in its source file, starting at 0.
    pub index: usize,
    pub id: String,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64, normal: [f64; 3], index: usize) -> Self {
        let id = format!(
            "({},{},{}),({},{},{})",
            x, y, z, normal[0], normal[1], normal[2]
        );
        Self {
            x,
            y,
            z,
            normal,
            index,
            id,
        }
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn coord(&self, axis: Axis) -> f64 {
        self.coords()[axis.index()]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "3D Point at x:{}, y:{}, z:{}. The vector is ({}, {}, {})",
            self.x, self.y, self.z, self.normal[0], self.normal[1], self.normal[2]
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn extent(&self, axis: Axis) -> (f64, f64) {
        (self.min[axis.index()], self.max[axis.index()])
    }

    pub fn span(&self, axis: Axis) -> f64 {
        self.max[axis.index()] - self.min[axis.index()]
    }
}

/// `AtLeast`, `AtMost` and `Between` are inclusive; `Above` and `Below` are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThresholdBand {
    AtLeast(f64),
    AtMost(f64),
    Between { lower: f64, upper: f64 },
    Above(f64),
    Below(f64),
}

impl ThresholdBand {
    /// Selects the filter mode from optional bounds: `upper` alone keeps values at or above
    /// it, `lower` alone keeps values at or below it, and both keep the closed range.
    pub fn from_bounds(upper: Option<f64>, lower: Option<f64>) -> Result<Self> {
        match (upper, lower) {
            (Some(upper), None) => Ok(ThresholdBand::AtLeast(upper)),
            (None, Some(lower)) => Ok(ThresholdBand::AtMost(lower)),
            (Some(upper), Some(lower)) => Ok(ThresholdBand::Between { lower, upper }),
            (None, None) => Err(DaylightError::MissingBounds),
        }
    }

    pub fn from_range(min: Option<f64>, max: Option<f64>) -> Result<Self> {
        match (min, max) {
            (Some(min), None) => Ok(ThresholdBand::AtLeast(min)),
            (None, Some(max)) => Ok(ThresholdBand::AtMost(max)),
            (Some(lower), Some(upper)) => Ok(ThresholdBand::Between { lower, upper }),
            (None, None) => Err(DaylightError::MissingBounds),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        match *self {
            ThresholdBand::AtLeast(t) => value >= t,
            ThresholdBand::AtMost(t) => value <= t,
            ThresholdBand::Between { lower, upper } => lower <= value && value <= upper,
            ThresholdBand::Above(t) => value > t,
            ThresholdBand::Below(t) => value < t,
        }
    }
}

impl fmt::Display for ThresholdBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdBand::AtLeast(t) => write!(f, ">= {}", t),
            ThresholdBand::AtMost(t) => write!(f, "<= {}", t),
            ThresholdBand::Between { lower, upper } => write!(f, "between {} and {}", lower, upper),
            ThresholdBand::Above(t) => write!(f, "> {}", t),
            ThresholdBand::Below(t) => write!(f, "< {}", t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: f64,
    pub end: f64,
}

impl HourWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: f64) -> bool {
        self.start <= hour && hour <= self.end
    }
}

impl Default for HourWindow {
    fn default() -> Self {
        Self::new(8.0, 18.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub delimiter: Option<char>,
    pub year: Option<i32>,
    /// Weekday of January 1st, 1 = Sunday .. 7 = Saturday.
    pub first_weekday: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub default_normal: [f64; 3],
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            default_normal: [0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdaCriteria {
    pub threshold: f64,
    pub cutoff: f64,
    pub window: HourWindow,
}

impl Default for SdaCriteria {
    fn default() -> Self {
        Self {
            threshold: 300.0,
            cutoff: 0.5,
            window: HourWindow::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AseCriteria {
    pub threshold: f64,
    /// A point counts once its exposed hours exceed this number.
    pub hours: usize,
    pub window: HourWindow,
}

impl Default for AseCriteria {
    fn default() -> Self {
        Self {
            threshold: 1000.0,
            hours: 250,
            window: HourWindow::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UdiCriteria {
    pub low: f64,
    pub high: f64,
    pub window: HourWindow,
}

impl Default for UdiCriteria {
    fn default() -> Self {
        Self {
            low: 100.0,
            high: 2000.0,
            window: HourWindow::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub parse: ParseOptions,
    pub grid: GridOptions,
    pub sda: SdaCriteria,
    pub ase: AseCriteria,
    pub udi: UdiCriteria,
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("DAYLIGHT_SDA_THRESHOLD") {
            config.sda.threshold = v;
        }
        if let Some(v) = env_parse("DAYLIGHT_SDA_CUTOFF") {
            config.sda.cutoff = v;
        }
        if let Some(v) = env_parse("DAYLIGHT_ASE_THRESHOLD") {
            config.ase.threshold = v;
        }
        if let Some(v) = env_parse("DAYLIGHT_ASE_HOURS") {
            config.ase.hours = v;
        }
        if let Some(v) = env_parse("DAYLIGHT_UDI_LOW") {
            config.udi.low = v;
        }
        if let Some(v) = env_parse("DAYLIGHT_UDI_HIGH") {
            config.udi.high = v;
        }
        if let Some(v) = env_parse("DAYLIGHT_YEAR") {
            config.parse.year = Some(v);
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
