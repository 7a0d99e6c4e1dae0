// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily fire-time arithmetic.
//!
//! The next fire is always derived from the current instant and a fixed
//! local time of day, never from the previous fire, so a slow pass cannot
//! push later passes off schedule.

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

/// Process-lifetime state of the daily trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    Idle,
    Waiting { next_fire: DateTime<Local> },
    Firing,
}

/// Next occurrence of `at` strictly after `now`: today if it has not been
/// reached yet, otherwise tomorrow.
///
/// Local times that fall into a DST gap fire one hour later; ambiguous local
/// times resolve to their earlier instant.
pub fn next_fire_time<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();

    let candidate = resolve_local(&tz, today.and_time(at));
    if candidate > *now {
        return candidate;
    }

    match today.succ_opt() {
        Some(tomorrow) => resolve_local(&tz, tomorrow.and_time(at)),
        None => candidate + TimeDelta::days(1),
    }
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn before_fire_time_fires_today() {
        let next = next_fire_time(&at(9, 15), noon());
        assert_eq!(next, at(12, 0));
    }

    #[test]
    fn after_fire_time_fires_tomorrow() {
        let next = next_fire_time(&at(13, 0), noon());
        assert_eq!(next, at(12, 0) + TimeDelta::days(1));
    }

    #[test]
    fn exactly_at_fire_time_fires_tomorrow() {
        let next = next_fire_time(&at(12, 0), noon());
        assert_eq!(next, at(12, 0) + TimeDelta::days(1));
    }

    #[test]
    fn honours_the_local_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        // 11:00 local is 09:00 UTC.
        let now = at(9, 0).with_timezone(&offset);
        let next = next_fire_time(&now, noon());
        assert_eq!(next.with_timezone(&Utc), at(10, 0));
    }

    #[test]
    fn crosses_month_boundary() {
        let now = NaiveDate::from_ymd_opt(2026, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap()
            .and_utc();
        let next = next_fire_time(&now, noon());
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
    }

    #[test]
    fn repeated_fires_are_one_day_apart() {
        let first = next_fire_time(&at(8, 0), noon());
        let second = next_fire_time(&first, noon());
        assert_eq!(second - first, TimeDelta::days(1));
    }
}
