use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of half-hour login slots offered, starting at 07:00.
pub const LOGIN_SLOT_COUNT: u32 = 34;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct RosterEntry {
    #[schema(example = "2025-07-21", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[sqlx(rename = "manager")]
    #[schema(example = "Ayub Sait")]
    pub manager_name: String,
    #[sqlx(rename = "kitchen")]
    #[schema(example = "ANR01.BLR22")]
    pub kitchen_name: String,
    #[schema(example = "09:30")]
    pub login_time: String,
    #[schema(example = "")]
    pub remarks: String,
}

/// One day of a weekly roster form. An empty kitchen means the day is skipped.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RosterDay {
    #[serde(default)]
    #[schema(example = "ANR01.BLR22")]
    pub kitchen: String,
    #[serde(default)]
    #[schema(example = "09:30")]
    pub login_time: String,
    #[serde(default)]
    pub remarks: String,
}

/// "HH:MM" login choices: 07:00, 07:30, ... 23:30.
pub fn login_time_slots() -> Vec<String> {
    let Some(start) = NaiveTime::from_hms_opt(7, 0, 0) else {
        return Vec::new();
    };
    (0..LOGIN_SLOT_COUNT)
        .map(|i| (start + Duration::minutes(30 * i as i64)).format("%H:%M").to_string())
        .collect()
}

pub fn is_login_slot(value: &str) -> bool {
    login_time_slots().iter().any(|slot| slot == value)
}

/// The Monday on or after `today`.
pub fn next_monday(today: NaiveDate) -> NaiveDate {
    let days = (7 - today.weekday().num_days_from_monday()) % 7;
    today + Duration::days(days as i64)
}

/// Day `i` of the form maps to `week_start + i`; days without a kitchen are dropped.
pub fn expand_week(manager: &str, week_start: NaiveDate, days: &[RosterDay]) -> Vec<RosterEntry> {
    days.iter()
        .enumerate()
        .filter(|(_, day)| !day.kitchen.trim().is_empty())
        .map(|(i, day)| RosterEntry {
            date: week_start + Duration::days(i as i64),
            manager_name: manager.to_string(),
            kitchen_name: day.kitchen.trim().to_string(),
            login_time: day.login_time.trim().to_string(),
            remarks: day.remarks.trim().to_string(),
        })
        .collect()
}

/// Distinct ISO week numbers present, ascending.
pub fn roster_weeks(entries: &[RosterEntry]) -> Vec<u32> {
    entries
        .iter()
        .map(|e| e.date.iso_week().week())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Roster view: optional manager, ISO week (and optionally ISO year), sorted by date.
pub fn filter_roster(
    entries: &[RosterEntry],
    manager: Option<&str>,
    week: u32,
    year: Option<i32>,
) -> Vec<RosterEntry> {
    let mut out: Vec<RosterEntry> = entries
        .iter()
        .filter(|e| manager.is_none_or(|m| e.manager_name == m))
        .filter(|e| {
            let iso = e.date.iso_week();
            iso.week() == week && year.is_none_or(|y| iso.year() == y)
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| a.date.cmp(&b.date));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day(kitchen: &str, login: &str) -> RosterDay {
        RosterDay {
            kitchen: kitchen.into(),
            login_time: login.into(),
            remarks: String::new(),
        }
    }

    fn entry(date: &str, manager: &str) -> RosterEntry {
        RosterEntry {
            date: d(date),
            manager_name: manager.into(),
            kitchen_name: "ANR01.BLR22".into(),
            login_time: "09:00".into(),
            remarks: String::new(),
        }
    }

    #[test]
    fn slots_cover_seven_to_half_eleven() {
        let slots = login_time_slots();
        assert_eq!(slots.len(), 34);
        assert_eq!(slots.first().map(String::as_str), Some("07:00"));
        assert_eq!(slots.last().map(String::as_str), Some("23:30"));
        assert!(is_login_slot("12:30"));
        assert!(!is_login_slot("12:15"));
        assert!(!is_login_slot("06:30"));
    }

    #[test]
    fn next_monday_is_inclusive() {
        // 2025-07-14 is a Monday.
        assert_eq!(next_monday(d("2025-07-14")), d("2025-07-14"));
        assert_eq!(next_monday(d("2025-07-16")), d("2025-07-21"));
        assert_eq!(next_monday(d("2025-07-20")), d("2025-07-21"));
    }

    #[test]
    fn expand_week_skips_empty_days() {
        let days = vec![
            day("ANR01.BLR22", "09:00"),
            day("", "09:00"),
            day("Week Off", "07:00"),
        ];
        let entries = expand_week("Tauseef", d("2025-07-21"), &days);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, d("2025-07-21"));
        assert_eq!(entries[1].date, d("2025-07-23"));
        assert_eq!(entries[1].kitchen_name, "Week Off");
        assert!(entries.iter().all(|e| e.manager_name == "Tauseef"));
    }

    #[test]
    fn filter_by_week_and_manager() {
        let entries = vec![
            entry("2025-07-23", "Tauseef"),
            entry("2025-07-21", "Tauseef"),
            entry("2025-07-22", "Srividya"),
            entry("2025-07-28", "Tauseef"),
        ];
        assert_eq!(roster_weeks(&entries), vec![30, 31]);

        let week30 = filter_roster(&entries, None, 30, None);
        assert_eq!(week30.len(), 3);
        assert_eq!(week30[0].date, d("2025-07-21"));

        let mine = filter_roster(&entries, Some("Tauseef"), 30, Some(2025));
        assert_eq!(mine.len(), 2);
        assert!(filter_roster(&entries, None, 30, Some(2024)).is_empty());
    }
}
