use daylight_metrics::calendar::*;
use daylight_metrics::DaylightError;

// ── day_of_year ──

#[test]
fn test_day_of_year_known_dates() {
    assert_eq!(day_of_year(2015, 1, 1), 1);
    assert_eq!(day_of_year(2015, 3, 21), 80);
    assert_eq!(day_of_year(2015, 12, 31), 365);
}

#[test]
fn test_day_of_year_leap_year() {
    assert_eq!(day_of_year(2024, 2, 29), 60);
    assert_eq!(day_of_year(2024, 3, 1), 61);
    assert_eq!(day_of_year(2024, 12, 31), 366);
}

#[test]
fn test_first_day_of_each_month_non_leap() {
    let expected = [1, 32, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];
    for (i, &exp) in expected.iter().enumerate() {
        let month = i as u32 + 1;
        assert_eq!(day_of_year(2015, month, 1), exp, "Month {}", month);
    }
}

// ── doy_to_month_day ──

#[test]
fn test_doy_roundtrip() {
    let cases: &[(i32, u32, u32)] = &[
        (2015, 1, 1),
        (2015, 3, 21),
        (2015, 7, 4),
        (2015, 12, 31),
        (2024, 2, 29),
    ];
    for &(year, month, day) in cases {
        let doy = day_of_year(year, month, day);
        assert_eq!(doy_to_month_day(year, doy), (month, day), "{}-{}-{}", year, month, day);
    }
}

#[test]
fn test_days_in_month() {
    assert_eq!(days_in_month(2015, 2), Some(28));
    assert_eq!(days_in_month(2024, 2), Some(29));
    assert_eq!(days_in_month(2015, 0), None);
    assert_eq!(days_in_month(2015, 13), None);
}

// ── Year resolution ──

#[test]
fn test_resolve_year_default() {
    assert_eq!(resolve_year(None, None).unwrap(), DEFAULT_YEAR);
}

#[test]
fn test_resolve_year_explicit() {
    assert_eq!(resolve_year(Some(2013), None).unwrap(), 2013);
}

#[test]
fn test_resolve_year_rejects_leap_year() {
    assert!(matches!(resolve_year(Some(2016), None), Err(DaylightError::LeapYear(2016))));
}

#[test]
fn test_first_weekday_takes_precedence() {
    assert_eq!(resolve_year(Some(2013), Some(1)).unwrap(), 2006);
    assert!(matches!(resolve_year(Some(2016), Some(1)), Err(DaylightError::LeapYear(2016))));
}

#[test]
fn test_first_weekday_out_of_range() {
    assert!(matches!(resolve_year(None, Some(0)), Err(DaylightError::InvalidWeekday(0))));
    assert!(matches!(resolve_year(None, Some(8)), Err(DaylightError::InvalidWeekday(8))));
}
