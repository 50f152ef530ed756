use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaylightError {
    #[error("File not found at {path}")]
    FileNotFound { path: PathBuf },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed point in {path} at line {line}: '{content}' (expected at least 3 numbers)")]
    MalformedPoint {
        path: PathBuf,
        line: usize,
        content: String,
    },
    #[error("The year {0} is a leap year; annual series assume 365 days")]
    LeapYear(i32),
    #[error("First weekday {0} is invalid; expected 1 (Sunday) to 7 (Saturday)")]
    InvalidWeekday(u8),
    #[error("No upper or lower illuminance bound was given for filtering")]
    MissingBounds,
    #[error("Both difference-from ({difference_from}) and percent-of ({percent_of}) were requested")]
    ConflictingNormalization { difference_from: f64, percent_of: f64 },
    #[error("Percent-of reference must be non-zero")]
    ZeroReference,
    #[error("Point {point} is out of range; valid points are 1 to {count}")]
    PointOutOfRange { point: usize, count: usize },
    #[error("Array length {found} does not match the expected length {expected}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("Data line {line} in {path} has no timestamp; the series only has {available} timestamps")]
    TimestampOutOfRange {
        path: PathBuf,
        line: usize,
        available: usize,
    },
    #[error("Record at hour of year {hour_of_year} has a non-numeric payload")]
    NonNumericPayload { hour_of_year: usize },
    #[error("Month {month} is not in the data; months present: {available:?}")]
    MonthNotFound { month: u32, available: Vec<u32> },
    #[error("Hour {hour} is not in the data; hours present: {available:?}")]
    HourNotFound { hour: u32, available: Vec<u32> },
    #[error("Record index {index} is out of range; the series holds {len} records")]
    RecordOutOfRange { index: usize, len: usize },
    #[error("Input and output paths are the same: {path}")]
    SamePath { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, DaylightError>;

impl DaylightError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
