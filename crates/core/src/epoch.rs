//! Epoch keys scope idempotency for recurring automations.
//!
//! An effect record is unique per `(business, customer, automation type,
//! epoch key)`, so the key decides how often an automation may fire:
//!
//! | automation type       | key                 | example      |
//! |-----------------------|---------------------|--------------|
//! | birthday              | celebrated year     | `2025`       |
//! | inactive              | ISO week of sweep   | `2025-W35`   |
//! | missing_fields        | calendar day        | `2025-08-27` |
//! | points_notification   | point-load id       | `load-42`    |
//! | vip_evaluation        | constant            | `vip`        |
//!
//! Rules with a non-zero trigger offset get a `/d{offset}` suffix so a
//! reminder variant never collides with the day-of rule.

use chrono::{Datelike, Duration, NaiveDate};

use crate::types::DbId;

/// VIP promotion happens once per customer.
pub const VIP_EPOCH_KEY: &str = "vip";

const LOAD_PREFIX: &str = "load-";

/// Append the trigger-offset suffix when the offset is non-zero.
pub fn with_offset(key: String, trigger_offset: i32) -> String {
    if trigger_offset == 0 {
        key
    } else {
        format!("{key}/d{trigger_offset}")
    }
}

/// Calendar-year key for birthday effects.
pub fn year_key(year: i32) -> String {
    format!("{year:04}")
}

/// ISO-week key (`YYYY-Www`) using the ISO week-numbering year.
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// Calendar-day key (`YYYY-MM-DD`).
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Key for a points notification tied to a point-load operation.
pub fn points_load_key(load_id: DbId) -> String {
    format!("{LOAD_PREFIX}{load_id}")
}

/// Recover the load id from a points-notification key.
pub fn parse_points_load_key(key: &str) -> Option<DbId> {
    key.strip_prefix(LOAD_PREFIX)?.parse().ok()
}

/// The date a birthday is celebrated on in `year`, ignoring birth year.
///
/// February 29 birthdays are celebrated on February 28 in non-leap years.
pub fn celebrated_on(birthday: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day()).or_else(|| {
        if birthday.month() == 2 && birthday.day() == 29 {
            NaiveDate::from_ymd_opt(year, 2, 28)
        } else {
            None
        }
    })
}

/// If the birthday falls on `today + trigger_offset` days, return the year
/// of the celebrated birthday (the epoch year).
pub fn birthday_epoch_year(birthday: NaiveDate, today: NaiveDate, trigger_offset: i32) -> Option<i32> {
    let target = today.checked_add_signed(Duration::days(i64::from(trigger_offset)))?;
    let celebrated = celebrated_on(birthday, target.year())?;
    (celebrated == target).then_some(target.year())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn birthday_ignores_birth_year() {
        assert_eq!(
            birthday_epoch_year(date(1990, 8, 27), date(2025, 8, 27), 0),
            Some(2025)
        );
        assert_eq!(birthday_epoch_year(date(1990, 8, 27), date(2025, 8, 26), 0), None);
    }

    #[test]
    fn reminder_offset_targets_future_birthday() {
        assert_eq!(
            birthday_epoch_year(date(1990, 9, 3), date(2025, 8, 27), 7),
            Some(2025)
        );
    }

    #[test]
    fn reminder_across_new_year_uses_birthday_year() {
        assert_eq!(
            birthday_epoch_year(date(1985, 1, 3), date(2025, 12, 29), 5),
            Some(2026)
        );
    }

    #[test]
    fn leap_day_birthday_celebrated_on_feb_28() {
        assert_eq!(birthday_epoch_year(date(2000, 2, 29), date(2025, 2, 28), 0), Some(2025));
        assert_eq!(birthday_epoch_year(date(2000, 2, 29), date(2024, 2, 28), 0), None);
        assert_eq!(birthday_epoch_year(date(2000, 2, 29), date(2024, 2, 29), 0), Some(2024));
    }

    #[test]
    fn iso_week_uses_week_numbering_year() {
        assert_eq!(iso_week_key(date(2025, 8, 27)), "2025-W35");
        assert_eq!(iso_week_key(date(2024, 12, 30)), "2025-W01");
    }

    #[test]
    fn offset_suffix_only_when_non_zero() {
        assert_eq!(with_offset(year_key(2025), 0), "2025");
        assert_eq!(with_offset(year_key(2025), 7), "2025/d7");
    }

    #[test]
    fn load_key_parses_back() {
        let key = points_load_key(42);
        assert_eq!(key, "load-42");
        assert_eq!(parse_points_load_key(&key), Some(42));
        assert_eq!(parse_points_load_key("2025"), None);
    }

    #[test]
    fn day_key_is_iso_date() {
        assert_eq!(day_key(date(2025, 8, 7)), "2025-08-07");
    }
}
