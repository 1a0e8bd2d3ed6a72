//! The 8760-hour tz-naive year used by every profile. Feb 29 is dropped in leap years.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{StockError, StockResult};

/// Hours in a profile year.
pub const HOURS: usize = 8760;

/// Wall-clock hours of `year` with Feb 29 removed.
pub fn hourly_index(year: i32) -> StockResult<Vec<NaiveDateTime>> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| StockError::Data(format!("year {year} is out of range")))?;
    let index = start.iter_days()
        .take_while(|d| d.year() == year)
        .filter(|d| !is_leap_day(*d))
        .flat_map(|d| (0..24).map(move |h| d.and_hms_opt(h, 0, 0)))
        .flatten()
        .collect::<Vec<_>>();
    debug_assert_eq!(index.len(), HOURS);
    Ok(index)
}

#[inline]
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

#[inline]
fn is_leap_day(date: NaiveDate) -> bool {
    date.month() == 2 && date.day() == 29
}

/// Position of a wall-clock hour in the 8760 index, or `None` on Feb 29.
pub fn hour_of_year(time: NaiveDateTime) -> Option<usize> {
    let date = time.date();
    if is_leap_day(date) { return None }
    let mut day = date.ordinal0() as usize;
    if is_leap_year(date.year()) && date.month() > 2 {
        day -= 1;
    }
    Some(day * 24 + time.hour() as usize)
}

/// Shift a UTC time to a fixed-offset local wall clock (no DST).
#[inline]
pub fn to_local(utc: NaiveDateTime, offset_hours: i32) -> NaiveDateTime {
    utc + Duration::hours(i64::from(offset_hours))
}

/// Milliseconds since the epoch for each hour, as stored in profile files.
pub fn index_millis(year: i32) -> StockResult<Vec<i64>> {
    Ok(hourly_index(year)?.into_iter().map(|t| t.and_utc().timestamp_millis()).collect())
}
