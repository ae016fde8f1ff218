//! Canonical weekly calendar.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Every `weekday` between `start` and `end`, both inclusive.
///
/// The first date is the first `weekday` on or after `start`. Empty when
/// `start > end`.
pub fn weekly_calendar(start: NaiveDate, end: NaiveDate, weekday: Weekday) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }

    let lead = (weekday.num_days_from_monday() + 7 - start.weekday().num_days_from_monday()) % 7;
    let Some(mut date) = start.checked_add_signed(Duration::days(i64::from(lead))) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(((end - start).num_days() / 7 + 1) as usize);
    while date <= end {
        out.push(date);
        match date.checked_add_signed(Duration::days(7)) {
            Some(next) => date = next,
            None => break,
        }
    }
    out
}
