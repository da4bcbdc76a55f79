//! Deterministic regressor generation.
//!
//! Builds the calendar and outlier regressor columns consumed by the
//! estimation layer: trading-day and working-day contrasts, the leap-year
//! correction, the Easter effect and the four outlier patterns.

use chrono::{Datelike, NaiveDate};

use crate::model::variables::OutlierKind;

/// Decay rate of the transitory-change outlier pattern.
pub const TC_DECAY: f64 = 0.7;

/// Default length, in days, of the Easter effect window.
pub const EASTER_DURATION: u32 = 6;

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Calendar position of observation `index`: `(year, zero-based period)`.
fn position(start: (i32, usize), frequency: usize, index: usize) -> (i32, usize) {
    let absolute = start.1 + index;
    (
        start.0 + (absolute / frequency) as i32,
        absolute % frequency,
    )
}

/// Count days of each weekday (Monday..Sunday) in the period covering
/// `months_per_period` months from `first_month` (1-based) of `year`.
fn weekday_counts(year: i32, first_month: u32, months_per_period: u32) -> [u32; 7] {
    let mut counts = [0u32; 7];
    for m in 0..months_per_period {
        let month = first_month + m;
        for day in 1..=days_in_month(year, month) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                counts[date.weekday().num_days_from_monday() as usize] += 1;
            }
        }
    }
    counts
}

/// Trading-day contrast columns.
///
/// Six columns, one per weekday Monday..Saturday, each holding the count of
/// that weekday in the period minus the count of Sundays.
pub fn trading_day_columns(n: usize, frequency: usize, start: (i32, usize)) -> Vec<Vec<f64>> {
    let months_per_period = (12 / frequency) as u32;
    let mut columns = vec![Vec::with_capacity(n); 6];
    for index in 0..n {
        let (year, period) = position(start, frequency, index);
        let first_month = period as u32 * months_per_period + 1;
        let counts = weekday_counts(year, first_month, months_per_period);
        for (j, column) in columns.iter_mut().enumerate() {
            column.push(counts[j] as f64 - counts[6] as f64);
        }
    }
    columns
}

/// Working-day contrast column: weekdays minus 5/2 times weekend days.
pub fn working_day_column(n: usize, frequency: usize, start: (i32, usize)) -> Vec<f64> {
    let months_per_period = (12 / frequency) as u32;
    (0..n)
        .map(|index| {
            let (year, period) = position(start, frequency, index);
            let first_month = period as u32 * months_per_period + 1;
            let counts = weekday_counts(year, first_month, months_per_period);
            let weekdays: u32 = counts[..5].iter().sum();
            let weekend = counts[5] + counts[6];
            weekdays as f64 - 2.5 * weekend as f64
        })
        .collect()
}

/// Leap-year correction column.
///
/// The period containing February carries 0.75 in leap years and -0.25
/// otherwise; every other period is zero.
pub fn leap_year_column(n: usize, frequency: usize, start: (i32, usize)) -> Vec<f64> {
    let months_per_period = 12 / frequency;
    (0..n)
        .map(|index| {
            let (year, period) = position(start, frequency, index);
            let first_month = period * months_per_period + 1;
            let contains_february = first_month <= 2 && 2 < first_month + months_per_period;
            if !contains_february {
                0.0
            } else if is_leap_year(year) {
                0.75
            } else {
                -0.25
            }
        })
        .collect()
}

/// Gregorian Easter Sunday for the given year (anonymous computus).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Easter effect column.
///
/// For each observation, the proportion of the `duration`-day window ending
/// the day before Easter Sunday that falls inside the observation's period,
/// centered by removing the column's sample mean.
pub fn easter_column(n: usize, frequency: usize, start: (i32, usize), duration: u32) -> Vec<f64> {
    let months_per_period = (12 / frequency) as u32;
    let mut column: Vec<f64> = (0..n)
        .map(|index| {
            let (year, period) = position(start, frequency, index);
            let first_month = period as u32 * months_per_period + 1;
            let Some(easter) = easter_sunday(year) else {
                return 0.0;
            };
            let Some(period_start) = NaiveDate::from_ymd_opt(year, first_month, 1) else {
                return 0.0;
            };
            let last_month = first_month + months_per_period - 1;
            let Some(period_end) =
                NaiveDate::from_ymd_opt(year, last_month, days_in_month(year, last_month))
            else {
                return 0.0;
            };
            // window covers the `duration` days before Easter Sunday
            let window_start = easter - chrono::Duration::days(duration as i64);
            let window_end = easter - chrono::Duration::days(1);
            let overlap_start = window_start.max(period_start);
            let overlap_end = window_end.min(period_end);
            if overlap_start > overlap_end {
                0.0
            } else {
                ((overlap_end - overlap_start).num_days() + 1) as f64 / duration as f64
            }
        })
        .collect();

    let mean = column.iter().sum::<f64>() / n.max(1) as f64;
    for v in &mut column {
        *v -= mean;
    }
    column
}

/// Outlier regressor column on the observation domain.
pub fn outlier_column(kind: OutlierKind, pos: usize, n: usize, frequency: usize) -> Vec<f64> {
    let mut column = vec![0.0; n];
    match kind {
        OutlierKind::Additive => {
            if pos < n {
                column[pos] = 1.0;
            }
        }
        OutlierKind::LevelShift => {
            for v in column.iter_mut().skip(pos) {
                *v = 1.0;
            }
        }
        OutlierKind::TransitoryChange => {
            let mut weight = 1.0;
            for v in column.iter_mut().skip(pos) {
                *v = weight;
                weight *= TC_DECAY;
            }
        }
        OutlierKind::Seasonal => {
            // impulse at the outlier's phase, balanced over the other phases
            let s = frequency.max(2);
            let balance = -1.0 / (s as f64 - 1.0);
            for (t, v) in column.iter_mut().enumerate().skip(pos) {
                *v = if t % s == pos % s { 1.0 } else { balance };
            }
        }
    }
    column
}
