//! Calendar features for the industrial load regressor.

use std::f64::consts::PI;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use ndarray::Array2;

/// hour-of-day, day-of-week (Monday = 0), cos(2π·hour/24), weekend-or-holiday.
pub const FEATURES: [&str; 4] = ["hour", "day_of_week", "hour_cos", "off_day"];

/// The eight holidays on which industrial load follows a weekend shape.
pub fn holidays(year: i32) -> Vec<NaiveDate> {
    let fixed = |m, d| NaiveDate::from_ymd_opt(year, m, d);
    let nth = |m, wd, n| NaiveDate::from_weekday_of_month_opt(year, m, wd, n);
    let memorial = nth(5, Weekday::Mon, 5).or_else(|| nth(5, Weekday::Mon, 4));
    let thanksgiving = nth(11, Weekday::Thu, 4);
    [
        fixed(1, 1),
        memorial,
        fixed(7, 4),
        nth(9, Weekday::Mon, 1),
        thanksgiving,
        thanksgiving.map(|d| d + Duration::days(1)),
        fixed(12, 24),
        fixed(12, 25),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[inline]
pub fn is_off_day(date: NaiveDate, holidays: &[NaiveDate]) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || holidays.contains(&date)
}

pub fn features_of(time: NaiveDateTime, holidays: &[NaiveDate]) -> [f64; 4] {
    let hour = time.hour() as f64;
    [
        hour,
        time.weekday().num_days_from_monday() as f64,
        (2.0 * PI * hour / 24.0).cos(),
        if is_off_day(time.date(), holidays) { 1.0 } else { 0.0 },
    ]
}

/// One feature row per timestamp. Holidays are looked up for each timestamp's own year.
pub fn feature_matrix(times: &[NaiveDateTime]) -> Array2<f64> {
    let mut x = Array2::zeros((times.len(), FEATURES.len()));
    let mut cached: Option<(i32, Vec<NaiveDate>)> = None;
    for (i, time) in times.iter().enumerate() {
        let year = time.year();
        if !matches!(&cached, Some((y, _)) if *y == year) {
            cached = Some((year, holidays(year)));
        }
        let days = cached.as_ref().map(|(_, d)| d.as_slice()).unwrap_or_default();
        for (j, v) in features_of(*time, days).into_iter().enumerate() {
            x[[i, j]] = v;
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn holiday_dates_2018() {
        let days = holidays(2018);
        assert_eq!(days.len(), 8);
        for d in [date(2018, 1, 1), date(2018, 5, 28), date(2018, 7, 4), date(2018, 9, 3),
                  date(2018, 11, 22), date(2018, 11, 23), date(2018, 12, 24), date(2018, 12, 25)] {
            assert!(days.contains(&d), "{d} missing");
        }
    }

    #[test]
    fn memorial_day_is_last_monday() {
        // May 2021 has five Mondays.
        assert!(holidays(2021).contains(&date(2021, 5, 31)));
        assert!(holidays(2019).contains(&date(2019, 5, 27)));
    }

    #[test]
    fn features_of_weekday_and_weekend_hours() {
        let days = holidays(2018);
        // Tuesday 2018-01-02 06:00
        let tue = date(2018, 1, 2).and_hms_opt(6, 0, 0).unwrap();
        let f = features_of(tue, &days);
        assert_eq!(f[0], 6.0);
        assert_eq!(f[1], 1.0);
        assert!(f[2].abs() < 1e-12);
        assert_eq!(f[3], 0.0);

        let sat = date(2018, 1, 6).and_hms_opt(0, 0, 0).unwrap();
        let f = features_of(sat, &days);
        assert_eq!(f[1], 5.0);
        assert_eq!(f[2], 1.0);
        assert_eq!(f[3], 1.0);

        let new_year = date(2018, 1, 1).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(features_of(new_year, &days)[3], 1.0);
    }

    #[test]
    fn matrix_has_one_row_per_time() {
        let times = (0..48).map(|h| date(2018, 12, 31).and_hms_opt(0, 0, 0).unwrap() + Duration::hours(h)).collect::<Vec<_>>();
        let x = feature_matrix(&times);
        assert_eq!(x.dim(), (48, 4));
        // 2019-01-01 is a holiday
        assert_eq!(x[[30, 3]], 1.0);
        // 2018-12-31 is a Monday and not a holiday
        assert_eq!(x[[5, 3]], 0.0);
    }
}
