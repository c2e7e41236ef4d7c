//! Time conversion utilities for DataFlash logs
//!
//! GPS receivers report time as a week number plus milliseconds into the
//! week. These helpers turn that pair into Unix time and render Unix time
//! as ISO-8601 for reports.

/// Days from 1970-01-01 to the GPS epoch 1980-01-06: ten 365-day years,
/// the leap days of 1972 and 1976, and five days into January 1980.
pub const GPS_EPOCH_DAYS: u64 = 10 * 365 + 2 + 5;

/// GPS time runs ahead of UTC by this many seconds
pub const GPS_LEAP_SECONDS: u64 = 15;

/// Week numbers above this are treated as "no fix yet"
pub const MAX_PLAUSIBLE_GPS_WEEK: u64 = 3000;

const SECS_PER_DAY: u64 = 86_400;
const SECS_PER_WEEK: u64 = 7 * SECS_PER_DAY;

/// Convert GPS week + milliseconds-of-week to microseconds since 1970.
///
/// Returns `None` for week 0 or an implausibly large week, which is what
/// receivers report before they have a fix, and for a milliseconds value
/// too large to represent.
pub fn gps_time_to_unix_us(week: u64, ms_of_week: u64) -> Option<u64> {
    if week == 0 || week > MAX_PLAUSIBLE_GPS_WEEK {
        return None;
    }
    let secs = GPS_EPOCH_DAYS * SECS_PER_DAY + week * SECS_PER_WEEK - GPS_LEAP_SECONDS;
    ms_of_week
        .checked_mul(1000)
        .and_then(|us| us.checked_add(secs * 1_000_000))
}

/// Render microseconds since 1970 as `YYYY-MM-DDTHH:MM:SS.ffffffZ`
pub fn format_unix_time_us(unix_us: u64) -> String {
    let total_seconds = unix_us / 1_000_000;
    let microseconds = unix_us % 1_000_000;

    let days = total_seconds / SECS_PER_DAY;
    let time_of_day = total_seconds % SECS_PER_DAY;
    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    let (year, month, day) = days_to_ymd(days);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06}Z",
        year, month, day, hours, minutes, seconds, microseconds
    )
}

/// Convert days since Unix epoch to year/month/day
fn days_to_ymd(days: u64) -> (u32, u32, u32) {
    let mut remaining_days = days as i64;
    let mut year = 1970u32;

    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining_days < days_in_year {
            break;
        }
        remaining_days -= days_in_year;
        year += 1;
    }

    let mut days_in_month = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if is_leap_year(year) {
        days_in_month[2] = 29;
    }

    let mut month = 1u32;
    for (m, &days) in days_in_month.iter().enumerate().skip(1) {
        if remaining_days < days as i64 {
            month = m as u32;
            break;
        }
        remaining_days -= days as i64;
    }

    let day = (remaining_days + 1) as u32;

    (year, month, day)
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
