use std::sync::RwLock;

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use chrono::NaiveDate;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

use crate::model::attendance::{PunchAction, PunchKey};

/// Expected capacity and false-positive rate for one day of punches.
const FILTER_CAPACITY: usize = 10_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

pub static PUNCH_FILTER: Lazy<PunchFilter> = Lazy::new(PunchFilter::new);

struct DayKeys {
    /// Day the filter is complete for; `None` until warm-up finishes.
    day: Option<NaiveDate>,
    keys: CuckooFilter<String>,
}

fn empty_keys() -> CuckooFilter<String> {
    CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)
}

/// Keys of the current day's punches.
///
/// A miss means the punch is definitely new. A hit, or any key for a day the
/// filter is not complete for, must be confirmed against the database. The
/// filter starts over when the first punch of a later day is recorded.
pub struct PunchFilter {
    state: RwLock<DayKeys>,
}

impl PunchFilter {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DayKeys {
                day: None,
                keys: empty_keys(),
            }),
        }
    }

    /// Check if a punch might already be recorded (false positives possible)
    pub fn might_exist(&self, key: &PunchKey) -> bool {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        match state.day {
            Some(day) if day == key.date => state.keys.contains(&key.filter_key()),
            _ => true,
        }
    }

    /// Record a stored punch
    pub fn insert(&self, key: &PunchKey) {
        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        match state.day {
            Some(day) if key.date < day => {}
            Some(day) if key.date > day => {
                state.keys = empty_keys();
                state.day = Some(key.date);
                state.keys.add(&key.filter_key());
            }
            // Before warm-up, keys are kept and the day stays unknown.
            _ => state.keys.add(&key.filter_key()),
        }
    }

    /// Load every punch stored for `day` and mark the filter complete for it.
    /// Ignored if the filter has already moved past `day`.
    pub fn load_day(&self, day: NaiveDate, keys: &[PunchKey]) {
        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.day.is_some_and(|current| current > day) {
            return;
        }
        if state.day.is_some_and(|current| current < day) {
            state.keys = empty_keys();
        }
        for key in keys.iter().filter(|k| k.date == day) {
            state.keys.add(&key.filter_key());
        }
        state.day = Some(day);
    }
}

impl Default for PunchFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Warm up the filter with the punches already stored for `day`
pub async fn warmup_punch_filter(filter: &PunchFilter, pool: &MySqlPool, day: NaiveDate) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (NaiveDate, String, String, String)>(
        r#"
        SELECT date, manager_name, kitchen_name, action
        FROM attendance
        WHERE date = ?
        "#,
    )
    .bind(day)
    .fetch(pool);

    let mut keys = Vec::new();

    while let Some(row) = stream.next().await {
        let (date, manager, kitchen, action) =
            row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        let action: PunchAction = match action.parse() {
            Ok(a) => a,
            Err(_) => {
                log::warn!("Skipping attendance row with unknown action {:?}", action);
                continue;
            }
        };

        keys.push(PunchKey { date, manager, kitchen, action });
    }

    filter.load_day(day, &keys);

    log::info!("Punch filter warmup complete: {} punches on {}", keys.len(), day);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn key(date: &str, manager: &str, action: PunchAction) -> PunchKey {
        PunchKey {
            date: d(date),
            manager: manager.into(),
            kitchen: "ANR01.BLR22".into(),
            action,
        }
    }

    #[test]
    fn everything_goes_to_the_database_before_warmup() {
        let filter = PunchFilter::new();
        assert!(filter.might_exist(&key("2025-07-16", "Tauseef", PunchAction::PunchIn)));
    }

    #[test]
    fn warmed_day_answers_misses() {
        let filter = PunchFilter::new();
        let stored = key("2025-07-16", "Tauseef", PunchAction::PunchIn);
        filter.load_day(d("2025-07-16"), std::slice::from_ref(&stored));

        assert!(filter.might_exist(&stored));
        assert!(!filter.might_exist(&key("2025-07-16", "Tauseef", PunchAction::PunchOut)));
        // Other days are not covered.
        assert!(filter.might_exist(&key("2025-07-15", "Tauseef", PunchAction::PunchOut)));
    }

    #[test]
    fn inserts_during_warmup_survive_it() {
        let filter = PunchFilter::new();
        let early = key("2025-07-16", "Joy Matabar", PunchAction::PunchIn);
        filter.insert(&early);
        filter.load_day(d("2025-07-16"), &[]);
        assert!(filter.might_exist(&early));
    }

    #[test]
    fn next_day_starts_a_fresh_filter() {
        let filter = PunchFilter::new();
        let yesterday = key("2025-07-16", "Tauseef", PunchAction::PunchIn);
        filter.load_day(d("2025-07-16"), std::slice::from_ref(&yesterday));

        let today = key("2025-07-17", "Tauseef", PunchAction::PunchIn);
        filter.insert(&today);

        assert!(filter.might_exist(&today));
        assert!(!filter.might_exist(&key("2025-07-17", "Tauseef", PunchAction::PunchOut)));
        // Yesterday's keys are gone, so its lookups fall back to the database.
        assert!(filter.might_exist(&yesterday));

        // A late insert for the old day does not reset today's keys.
        filter.insert(&key("2025-07-16", "Tauseef", PunchAction::PunchOut));
        assert!(filter.might_exist(&today));
    }

    #[test]
    fn stale_warmup_is_ignored() {
        let filter = PunchFilter::new();
        let today = key("2025-07-17", "Tauseef", PunchAction::PunchIn);
        filter.insert(&today);
        filter.load_day(d("2025-07-17"), &[]);

        filter.load_day(d("2025-07-16"), &[key("2025-07-16", "Tauseef", PunchAction::PunchIn)]);
        assert!(filter.might_exist(&today));
        assert!(!filter.might_exist(&key("2025-07-17", "Tauseef", PunchAction::PunchOut)));
    }
}
