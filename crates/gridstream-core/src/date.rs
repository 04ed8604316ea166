//! Serial date numbers
//!
//! Dates are stored as a count of days since an epoch, with the time of day
//! as the fractional part. The 1900 system counts a 29 February 1900 that
//! never existed (serial 60), so serials from 61 on are one day ahead of a
//! plain day count.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// The phantom 1900-02-29 of the 1900 date system
pub const PHANTOM_LEAP_DAY: i64 = 60;

/// Which epoch a workbook counts serial numbers from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01
    #[default]
    V1900,
    /// Serial 0 is 1904-01-01 (`<workbookPr date1904="1"/>`)
    V1904,
}

impl DateSystem {
    /// Pick the system from the `date1904` workbook flag
    pub fn from_date1904(date1904: bool) -> Self {
        if date1904 {
            DateSystem::V1904
        } else {
            DateSystem::V1900
        }
    }

    /// True for the 1904 system
    pub fn is_1904(&self) -> bool {
        matches!(self, DateSystem::V1904)
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn date_from_days(days: i64, system: DateSystem) -> Option<NaiveDate> {
    let (epoch, offset) = match system {
        DateSystem::V1904 => (ymd(1904, 1, 1), days),
        DateSystem::V1900 if days == PHANTOM_LEAP_DAY => return None,
        DateSystem::V1900 if days < PHANTOM_LEAP_DAY => (ymd(1899, 12, 31), days),
        DateSystem::V1900 => (ymd(1899, 12, 30), days),
    };
    if offset < 0 {
        return None;
    }
    epoch.checked_add_signed(Duration::try_days(offset)?)
}

/// Split a serial into whole days and rounded seconds of the day
fn split_serial(serial: f64) -> Option<(i64, u32)> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.floor();
    let seconds = ((serial - days) * SECONDS_PER_DAY).round() as u32;
    Some((days as i64, seconds))
}

/// True when the serial falls on the phantom 1900-02-29
pub fn is_phantom_leap_day(serial: f64, system: DateSystem) -> bool {
    system == DateSystem::V1900 && serial.floor() as i64 == PHANTOM_LEAP_DAY
}

/// Calendar date of a serial, ignoring the time of day
///
/// Returns `None` for negative serials and the phantom 1900-02-29.
pub fn serial_to_date(serial: f64, system: DateSystem) -> Option<NaiveDate> {
    let (days, _) = split_serial(serial)?;
    date_from_days(days, system)
}

/// Time of day of a serial, rounded to the nearest second
///
/// A fraction that rounds up to a full day wraps to midnight.
pub fn serial_to_time(serial: f64) -> Option<NaiveTime> {
    let (_, seconds) = split_serial(serial)?;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds % 86_400, 0)
}

/// Date and time of a serial, rounded to the nearest second
///
/// A fraction that rounds up to a full day carries into the next day.
pub fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if is_phantom_leap_day(serial, system) {
        return None;
    }
    let (mut days, mut seconds) = split_serial(serial)?;
    if seconds >= 86_400 {
        days += 1;
        seconds -= 86_400;
    }
    let date = date_from_days(days, system)?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
    Some(date.and_time(time))
}

/// Serial number of a calendar date
pub fn date_to_serial(date: NaiveDate, system: DateSystem) -> f64 {
    match system {
        DateSystem::V1904 => (date - ymd(1904, 1, 1)).num_days() as f64,
        DateSystem::V1900 => {
            let days = (date - ymd(1899, 12, 30)).num_days();
            if days <= PHANTOM_LEAP_DAY {
                (days - 1) as f64
            } else {
                days as f64
            }
        }
    }
}

/// Fraction of a day for a time of day
pub fn time_to_serial(time: NaiveTime) -> f64 {
    let seconds = f64::from(time.num_seconds_from_midnight())
        + f64::from(time.nanosecond()) / 1_000_000_000.0;
    seconds / SECONDS_PER_DAY
}

/// Serial number of a date and time
pub fn datetime_to_serial(datetime: NaiveDateTime, system: DateSystem) -> f64 {
    date_to_serial(datetime.date(), system) + time_to_serial(datetime.time())
}
