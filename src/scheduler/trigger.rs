//! Fire-time computation in the fixed local zone

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc, Weekday};
use serde::Serialize;

/// Zone every trigger is interpreted in
pub const TIMEZONE_NAME: &str = "Asia/Riyadh";

/// Asia/Riyadh is UTC+03:00 all year round
pub const UTC_OFFSET_SECONDS: i32 = 3 * 3600;

/// Process-wide scheduling offset
pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(UTC_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// UTC instant of a local wall-clock date and time
pub fn at_local(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let naive_utc = date.and_time(time) - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(naive_utc, Utc)
}

/// When a job fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Every day at a local time
    Daily { at: NaiveTime },
    /// Once a week on a weekday at a local time
    Weekly { weekday: Weekday, at: NaiveTime },
    /// Every `minutes`, counted from registration
    Interval { minutes: u32 },
}

impl Trigger {
    /// Fixed slot of the Friday-Kahf reminder: Thursday 11:00
    pub fn friday_kahf() -> Self {
        Trigger::Weekly {
            weekday: Weekday::Thu,
            at: NaiveTime::from_hms_opt(11, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Fixed slot of the Friday prayer reminder: Friday 10:00
    pub fn friday_dua() -> Self {
        Trigger::Weekly {
            weekday: Weekday::Fri,
            at: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    /// First fire strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let offset = local_offset();
        let today = now.with_timezone(&offset).date_naive();

        match *self {
            Trigger::Daily { at } => {
                let candidate = at_local(today, at, offset);
                if candidate > now {
                    candidate
                } else {
                    at_local(today + Duration::days(1), at, offset)
                }
            }
            Trigger::Weekly { weekday, at } => {
                let ahead = (7 + weekday.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
                let candidate = at_local(today + Duration::days(i64::from(ahead)), at, offset);
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(7)
                }
            }
            Trigger::Interval { minutes } => now + self.period(minutes),
        }
    }

    /// Next fire after a fire scheduled at `fired_at`, skipping every
    /// instant that is already in the past at `now`
    pub fn advance(&self, fired_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Trigger::Interval { minutes } => {
                let period = self.period(minutes);
                let elapsed = (now - fired_at).num_seconds().max(0);
                let steps = elapsed / period.num_seconds() + 1;
                fired_at + period * steps as i32
            }
            _ => self.next_after(now.max(fired_at)),
        }
    }

    fn period(&self, minutes: u32) -> Duration {
        Duration::minutes(i64::from(minutes.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn riyadh(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        local_offset()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_daily_later_today() {
        let now = riyadh(2024, 5, 6, 4, 0);
        let next = Trigger::Daily { at: time(6, 0) }.next_after(now);
        assert_eq!(next, riyadh(2024, 5, 6, 6, 0));
        assert_eq!(next.with_timezone(&Utc).format("%H:%M").to_string(), "03:00");
    }

    #[test]
    fn test_daily_rolls_to_tomorrow_when_passed_or_equal() {
        let trigger = Trigger::Daily { at: time(6, 0) };
        assert_eq!(trigger.next_after(riyadh(2024, 5, 6, 6, 0)), riyadh(2024, 5, 7, 6, 0));
        assert_eq!(trigger.next_after(riyadh(2024, 5, 6, 23, 59)), riyadh(2024, 5, 7, 6, 0));
    }

    #[test]
    fn test_daily_near_utc_midnight_uses_local_date() {
        // 22:30 UTC on the 6th is already 01:30 on the 7th in Riyadh
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 22, 30, 0).single().unwrap();
        let next = Trigger::Daily { at: time(5, 0) }.next_after(now);
        assert_eq!(next, riyadh(2024, 5, 7, 5, 0));
    }

    #[test]
    fn test_weekly_friday_slots() {
        // 2024-05-06 is a Monday
        let monday = riyadh(2024, 5, 6, 12, 0);
        assert_eq!(Trigger::friday_kahf().next_after(monday), riyadh(2024, 5, 9, 11, 0));
        assert_eq!(Trigger::friday_dua().next_after(monday), riyadh(2024, 5, 10, 10, 0));

        let friday_noon = riyadh(2024, 5, 10, 12, 0);
        assert_eq!(Trigger::friday_dua().next_after(friday_noon), riyadh(2024, 5, 17, 10, 0));
    }

    #[test]
    fn test_interval_from_registration() {
        let now = riyadh(2024, 5, 6, 12, 0);
        let trigger = Trigger::Interval { minutes: 60 };
        assert_eq!(trigger.next_after(now), riyadh(2024, 5, 6, 13, 0));
    }

    #[test]
    fn test_advance_skips_missed_instants() {
        let trigger = Trigger::Interval { minutes: 30 };
        let fired_at = riyadh(2024, 5, 6, 12, 0);
        let now = riyadh(2024, 5, 6, 13, 10);
        assert_eq!(trigger.advance(fired_at, now), riyadh(2024, 5, 6, 13, 30));

        let daily = Trigger::Daily { at: time(12, 0) };
        let after_downtime = riyadh(2024, 5, 9, 8, 0);
        assert_eq!(daily.advance(fired_at, after_downtime), riyadh(2024, 5, 9, 12, 0));
    }
}
