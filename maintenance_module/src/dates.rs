//! Calendar math over UTC calendar days.
//!
//! Everything here works on `NaiveDate` so the schedule is identical across
//! installations regardless of host timezone or DST rules.

use chrono::{Datelike, NaiveDate, Weekday};

/// First calendar day of the given month. `month0` is zero-based.
pub fn first_of_month(year: i32, month0: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).expect("month index in 0..12")
}

/// Normalize to the first of the month, then move `n` months, carrying
/// year overflow in either direction.
pub fn add_months(date: NaiveDate, n: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + n;
    first_of_month(total.div_euclid(12), total.rem_euclid(12) as u32)
}

/// Last calendar day of the month, stepped backward past Saturday and
/// Sunday to the preceding weekday.
pub fn last_weekday_of_month(year: i32, month0: u32) -> NaiveDate {
    let mut day = add_months(first_of_month(year, month0), 1)
        .pred_opt()
        .expect("month start has a predecessor");
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day = day.pred_opt().expect("weekday walk stays in-range");
    }
    day
}

/// Canonical `YYYY-MM-DD` form of a calendar day at UTC midnight.
pub fn to_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse the canonical `YYYY-MM-DD` form back into a calendar day.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
}
