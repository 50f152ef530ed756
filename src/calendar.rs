use crate::error::{DaylightError, Result};

pub const DEFAULT_YEAR: i32 = 2015;

pub const HOURS_PER_DAY: usize = 24;

pub fn leap_year(year: i32) -> bool {
    (year % 400 == 0) || (year % 4 == 0 && year % 100 != 0)
}

pub fn days_in_months(year: i32) -> [u32; 12] {
    [
        31,
        if leap_year(year) { 29 } else { 28 },
        31, 30, 31, 30, 31, 31, 30, 31, 30, 31,
    ]
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    days_in_months(year).get(month.checked_sub(1)? as usize).copied()
}

pub fn day_of_year(year: i32, month: u32, day: u32) -> u32 {
    let dim = days_in_months(year);
    let sum: u32 = dim[..(month.clamp(1, 12) - 1) as usize].iter().sum();
    sum + day
}

pub fn doy_to_month_day(year: i32, doy: u32) -> (u32, u32) {
    let mut remaining = doy;
    for (month_idx, &dim) in days_in_months(year).iter().enumerate() {
        if remaining <= dim {
            return (month_idx as u32 + 1, remaining);
        }
        remaining -= dim;
    }
    (12, 31)
}

/// Non-leap year whose January 1st falls on `first_weekday` (1 = Sunday .. 7 = Saturday).
pub fn year_for_first_weekday(first_weekday: u8) -> Result<i32> {
    match first_weekday {
        1 => Ok(2006),
        2 => Ok(2007),
        3 => Ok(2013),
        4 => Ok(2014),
        5 => Ok(2015),
        6 => Ok(2010),
        7 => Ok(2011),
        other => Err(DaylightError::InvalidWeekday(other)),
    }
}

/// Picks the calendar year for a series. `first_weekday` wins over `year`, but a leap
/// `year` is rejected either way.
pub fn resolve_year(year: Option<i32>, first_weekday: Option<u8>) -> Result<i32> {
    if let Some(y) = year.filter(|&y| leap_year(y)) {
        return Err(DaylightError::LeapYear(y));
    }
    match first_weekday {
        Some(weekday) => year_for_first_weekday(weekday),
        None => Ok(year.unwrap_or(DEFAULT_YEAR)),
    }
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
