pub mod annual;
pub mod calendar;
pub mod error;
pub mod grid;
pub mod illuminance;
pub mod time_series;
pub mod types;

pub use annual::{AnnualIlluminance, MetricsSummary, PointHours, PointQuery, UdiBands};

pub use calendar::{
    day_of_year, days_in_month, days_in_months, doy_to_month_day, leap_year, resolve_year,
    year_for_first_weekday, DEFAULT_YEAR,
};

pub use error::{DaylightError, Result};

pub use grid::{count_points, GridSummary, PointGrid, RelativePosition};

pub use illuminance::{
    read_values, Extreme, FilterSummary, IlluminanceArray, IlluminanceStats, PointReading,
};

pub use time_series::{Field, Payload, SourceStamp, TimeFilter, TimeRecord, TimeSeries};

pub use types::{
    AnalysisConfig, AseCriteria, Axis, BoundingBox, GridOptions, HourWindow, ParseOptions,
    Point, SdaCriteria, ThresholdBand, UdiCriteria,
};
