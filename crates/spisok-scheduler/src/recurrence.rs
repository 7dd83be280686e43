//! Next-occurrence arithmetic for weekly reminders
//!
//! Everything here is pure: the caller supplies the reference instant and the
//! time zone travels with it. Weeks are ISO weeks (Monday first) to match the
//! canonical weekday encoding.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};

use crate::weekday::{TimeOfDay, Weekday};

/// Longest local-time gap we step across when a wall-clock time does not
/// exist (DST spring-forward).
const MAX_GAP_MINUTES: i64 = 180;

/// The next instant strictly after `reference` that falls on `weekday` at
/// `time`, in the reference's time zone.
///
/// The candidate is built inside the reference's week; if it is at or before
/// the reference it moves forward by exactly one week. The result is therefore
/// one week after the most recent occurrence that is `<= reference`.
pub fn next_fire_instant<Tz: TimeZone>(
    time: TimeOfDay,
    weekday: Weekday,
    reference: &DateTime<Tz>,
) -> DateTime<Tz> {
    let tz = reference.timezone();
    let date = date_in_week(weekday, reference.date_naive());

    let candidate = resolve_local(&tz, date.and_time(time.to_naive()));
    if candidate > *reference {
        return candidate;
    }

    resolve_local(&tz, add_week(date).and_time(time.to_naive()))
}

/// The occurrence of `weekday` at `time` in the week after `now`'s week.
///
/// Used after a job has fired: the firing consumed this week's slot, so the
/// successor always lands a full week on, even if delivery ran early or late
/// within the day. Always strictly after `now`.
pub fn successor_fire_instant<Tz: TimeZone>(
    time: TimeOfDay,
    weekday: Weekday,
    now: &DateTime<Tz>,
) -> DateTime<Tz> {
    let tz = now.timezone();
    let date = add_week(date_in_week(weekday, now.date_naive()));
    resolve_local(&tz, date.and_time(time.to_naive()))
}

/// The date of `weekday` within the ISO week containing `date`.
fn date_in_week(weekday: Weekday, date: NaiveDate) -> NaiveDate {
    let monday = date
        .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(date);
    monday
        .checked_add_days(Days::new(u64::from(weekday.days_from_monday())))
        .unwrap_or(monday)
}

fn add_week(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(7)).unwrap_or(date)
}

/// Map a local wall-clock time to an instant.
///
/// Ambiguous times take the earlier mapping; times inside a gap move to the
/// first minute after it. A gap longer than [`MAX_GAP_MINUTES`] (a zone
/// skipping a whole day) resolves to the same wall time on the next day
/// that has one.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    if let Some(t) = tz.from_local_datetime(&local).earliest() {
        return t;
    }

    for minutes in 1..=MAX_GAP_MINUTES {
        let shifted = local + TimeDelta::minutes(minutes);
        if let Some(t) = tz.from_local_datetime(&shifted).earliest() {
            return t;
        }
    }

    for days in 1..=7 {
        let shifted = local + TimeDelta::days(days);
        if let Some(t) = tz.from_local_datetime(&shifted).earliest() {
            return t;
        }
    }

    // No zone has a week-long gap; stay after `local` regardless.
    tz.from_utc_datetime(&(local + TimeDelta::days(8)))
}
