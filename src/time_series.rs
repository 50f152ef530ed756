use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::calendar::{self, round_to, HOURS_PER_DAY};
use crate::error::{DaylightError, Result};
use crate::types::ParseOptions;

/// A leading number above this is read as a year rather than a month.
pub const YEAR_MARKER: f64 = 1000.0;

pub const MERGED_SUFFIX: &str = "_rev.ill";

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Number(f64),
    Text(String),
}

impl Field {
    fn parse(token: &str) -> Self {
        match token.parse::<f64>() {
            Ok(v) => Field::Number(v),
            Err(_) => Field::Text(token.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Number(v) => Some(*v),
            Field::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scalar(Field),
    Vector(Vec<Field>),
}

impl Payload {
    fn from_fields(mut fields: Vec<Field>) -> Self {
        if fields.len() == 1 {
            Payload::Scalar(fields.remove(0))
        } else {
            Payload::Vector(fields)
        }
    }

    pub fn fields(&self) -> &[Field] {
        match self {
            Payload::Scalar(field) => std::slice::from_ref(field),
            Payload::Vector(fields) => fields,
        }
    }

    pub fn len(&self) -> usize {
        self.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn as_scalar(&self) -> Option<&Field> {
        match self {
            Payload::Scalar(field) => Some(field),
            Payload::Vector(_) => None,
        }
    }

    pub fn numbers(&self) -> Option<Vec<f64>> {
        self.fields().iter().map(Field::as_number).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceStamp {
    pub month: u32,
    pub day: u32,
    pub hour: f64,
}

impl fmt::Display for SourceStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.month, self.day, self.hour)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeRecord {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Source hour, 1-based and possibly fractional.
    pub hour: f64,
    pub timestamp: NaiveDateTime,
    pub day_of_year: u32,
    /// Position among the parsed records, starting at 1.
    pub hour_of_year: usize,
    pub data: Payload,
}

impl fmt::Display for TimeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Time: {}", self.timestamp.format("%H:%M on %A,%d-%b-%Y"))?;
        write!(f, "Data: {:?}", self.data)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeFilter {
    pub months: Option<Vec<u32>>,
    /// 1-based clock hours; a timestamp with minutes counts toward the next hour.
    pub hours: Option<Vec<u32>>,
    /// 0 = Monday .. 6 = Sunday.
    pub weekdays: Option<Vec<u32>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    source: Option<PathBuf>,
    year: i32,
    stamps: Vec<SourceStamp>,
    records: Vec<TimeRecord>,
    unparsed: Vec<String>,
}

impl TimeSeries {
    pub fn parse(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DaylightError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| DaylightError::io(path, e))?;
        let mut series = Self::from_lines(text.lines(), options)?;
        series.source = Some(path.to_path_buf());
        tracing::debug!(
            path = %path.display(),
            records = series.records.len(),
            unparsed = series.unparsed.len(),
            "parsed time series"
        );
        Ok(series)
    }

    pub fn from_lines<I, S>(lines: I, options: &ParseOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = Builder::new(calendar::resolve_year(options.year, options.first_weekday)?);
        for line in lines {
            let line = line.as_ref();
            let tokens: Vec<&str> = match options.delimiter {
                Some(delim) => line.trim().split(delim).map(str::trim).collect(),
                None => line.split_whitespace().collect(),
            };
            builder.push(line, &tokens);
        }
        Ok(builder.finish())
    }

    pub fn from_token_lines<I, L, T>(lines: I, options: &ParseOptions) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut builder = Builder::new(calendar::resolve_year(options.year, options.first_weekday)?);
        for line in lines {
            let owned: Vec<T> = line.into_iter().collect();
            let tokens: Vec<&str> = owned.iter().map(|t| t.as_ref()).collect();
            let raw = tokens.join(" ");
            builder.push(&raw, &tokens);
        }
        Ok(builder.finish())
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TimeRecord] {
        &self.records
    }

    pub fn stamps(&self) -> &[SourceStamp] {
        &self.stamps
    }

    pub fn unparsed_lines(&self) -> &[String] {
        &self.unparsed
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.records.iter().map(|r| r.timestamp).collect()
    }

    pub fn payloads(&self) -> Vec<&Payload> {
        self.records.iter().map(|r| &r.data).collect()
    }

    pub fn record(&self, hour_of_year: usize) -> Option<&TimeRecord> {
        hour_of_year
            .checked_sub(1)
            .and_then(|idx| self.records.get(idx))
    }

    pub fn records_at(&self, hours_of_year: &[usize]) -> Result<Vec<&TimeRecord>> {
        hours_of_year
            .iter()
            .map(|&hoy| {
                self.record(hoy).ok_or(DaylightError::RecordOutOfRange {
                    index: hoy,
                    len: self.records.len(),
                })
            })
            .collect()
    }

    /// Records of whole days (1 to 365), assuming 24 records per day. Day 0 and days past
    /// the end of the data select nothing.
    pub fn days(&self, days: &[u32]) -> Vec<&TimeRecord> {
        days.iter()
            .filter(|&&day| day > 0)
            .flat_map(|&day| {
                let first = (day as usize - 1) * HOURS_PER_DAY;
                (1..=HOURS_PER_DAY).filter_map(move |h| self.record(first + h))
            })
            .collect()
    }

    /// Records of whole calendar months (1 to 12); other month numbers select nothing.
    pub fn months(&self, months: &[u32]) -> Vec<&TimeRecord> {
        let days: Vec<u32> = months
            .iter()
            .filter(|&&month| (1..=12).contains(&month))
            .filter_map(|&month| {
                let length = calendar::days_in_month(self.year, month)?;
                let first = calendar::day_of_year(self.year, month, 1);
                Some(first..first + length)
            })
            .flatten()
            .collect();
        self.days(&days)
    }

    pub fn filter_time(&self, filter: &TimeFilter) -> Vec<&TimeRecord> {
        let allowed = |set: &Option<Vec<u32>>, value: u32| {
            set.as_ref().map_or(true, |values| values.contains(&value))
        };
        self.records
            .iter()
            .filter(|r| {
                let ts = r.timestamp;
                let mut hour = ts.hour() + 1;
                if ts.minute() > 0 {
                    hour += 1;
                }
                allowed(&filter.months, ts.month())
                    && allowed(&filter.hours, hour)
                    && allowed(&filter.weekdays, ts.weekday().num_days_from_monday())
            })
            .collect()
    }

    /// Prefixes each numeric line of `companion` with the timestamp at the same position.
    pub fn merge_timestamps(
        &self,
        companion: impl AsRef<Path>,
        output: Option<&Path>,
        decimal_places: Option<u32>,
        round_to_integer: bool,
    ) -> Result<PathBuf> {
        let companion = companion.as_ref();
        if !companion.exists() {
            return Err(DaylightError::FileNotFound {
                path: companion.to_path_buf(),
            });
        }
        let output = match output {
            Some(path) => path.to_path_buf(),
            None => default_merge_path(companion),
        };
        if output == companion {
            return Err(DaylightError::SamePath { path: output });
        }

        let text = fs::read_to_string(companion).map_err(|e| DaylightError::io(companion, e))?;
        let mut merged = String::with_capacity(text.len() + self.stamps.len() * 12);
        let mut count = 0;
        let mut skipped = 0;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(values) = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<_>, _>>()
            else {
                skipped += 1;
                continue;
            };
            let stamp = self
                .stamps
                .get(count)
                .ok_or_else(|| DaylightError::TimestampOutOfRange {
                    path: companion.to_path_buf(),
                    line: count + 1,
                    available: self.stamps.len(),
                })?;
            merged.push_str(&stamp.to_string());
            for value in values {
                merged.push(' ');
                merged.push_str(&format_value(value, decimal_places, round_to_integer));
            }
            merged.push('\n');
            count += 1;
        }

        fs::write(&output, merged).map_err(|e| DaylightError::io(&output, e))?;
        if skipped > 0 {
            tracing::debug!(path = %companion.display(), skipped, "dropped text lines while merging");
        }
        tracing::info!(
            companion = %companion.display(),
            output = %output.display(),
            lines = count,
            "merged timestamps"
        );
        Ok(output)
    }
}

fn default_merge_path(companion: &Path) -> PathBuf {
    let stem = companion
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    companion.with_file_name(format!("{}{}", stem, MERGED_SUFFIX))
}

fn format_value(value: f64, decimal_places: Option<u32>, round_to_integer: bool) -> String {
    let value = decimal_places.map_or(value, |places| round_to(value, places));
    if round_to_integer {
        (value.trunc() as i64).to_string()
    } else {
        value.to_string()
    }
}

// Hour 1 is 00:00. Hours below 1 have no clock time of their own.
fn clock_time(date: NaiveDate, hour: f64) -> Option<NaiveDateTime> {
    if !hour.is_finite() || hour < 1.0 {
        return None;
    }
    let whole = hour.trunc();
    let clock = whole as u32 - 1;
    let minute = ((hour - whole) * 60.0) as u32;
    date.and_hms_opt(clock, minute, 0)
}

fn whole_number(field: &Field) -> Option<u32> {
    let v = field.as_number()?;
    (v.fract() == 0.0 && v >= 0.0).then_some(v as u32)
}

struct Builder {
    year: i32,
    stamps: Vec<SourceStamp>,
    records: Vec<TimeRecord>,
    unparsed: Vec<String>,
}

impl Builder {
    fn new(year: i32) -> Self {
        Self {
            year,
            stamps: Vec::new(),
            records: Vec::new(),
            unparsed: Vec::new(),
        }
    }

    fn push(&mut self, raw: &str, tokens: &[&str]) {
        if tokens.iter().all(|t| t.is_empty()) {
            return;
        }
        match self.parse_record(tokens) {
            Some(record) => {
                self.stamps.push(SourceStamp {
                    month: record.month,
                    day: record.day,
                    hour: record.hour,
                });
                self.records.push(record);
            }
            None => self.unparsed.push(raw.to_string()),
        }
    }

    fn parse_record(&self, tokens: &[&str]) -> Option<TimeRecord> {
        let lead = tokens.first()?.parse::<f64>().ok()?;
        let mut fields: Vec<Field> = tokens.iter().map(|t| Field::parse(t)).collect();

        let (year, offset) = if lead > YEAR_MARKER {
            (lead as i32, 1)
        } else {
            (self.year, 0)
        };
        if fields.len() < offset + 3 {
            return None;
        }
        let month = whole_number(&fields[offset])?;
        let day = whole_number(&fields[offset + 1])?;
        let hour = fields[offset + 2].as_number()?;

        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let timestamp = clock_time(date, hour)?;
        let data = Payload::from_fields(fields.split_off(offset + 3));

        Some(TimeRecord {
            year,
            month,
            day,
            hour,
            timestamp,
            day_of_year: timestamp.ordinal(),
            hour_of_year: self.records.len() + 1,
            data,
        })
    }

    fn finish(self) -> TimeSeries {
        if !self.unparsed.is_empty() {
            tracing::debug!(lines = self.unparsed.len(), "kept non-numeric lines aside");
        }
        TimeSeries {
            source: None,
            year: self.year,
            stamps: self.stamps,
            records: self.records,
            unparsed: self.unparsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_maps_one_based_hours() {
        let date = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        assert_eq!(clock_time(date, 1.0).unwrap().hour(), 0);
        assert_eq!(clock_time(date, 24.0).unwrap().hour(), 23);
        let half = clock_time(date, 12.5).unwrap();
        assert_eq!((half.hour(), half.minute()), (11, 30));
        assert!(clock_time(date, 0.5).is_none());
        assert!(clock_time(date, 0.0).is_none());
        assert!(clock_time(date, 25.0).is_none());
    }

    #[test]
    fn format_value_rounding() {
        assert_eq!(format_value(12.346, Some(2), false), "12.35");
        assert_eq!(format_value(12.9, Some(2), true), "12");
        assert_eq!(format_value(100.0, None, false), "100");
    }
}
