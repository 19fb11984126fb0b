use crate::model::attendance::{AttendanceRecord, PunchKey};

/// True when a record with the same date, manager, kitchen and action exists.
///
/// Strings are compared exactly: no trimming, no case folding.
pub fn is_duplicate_punch(candidate: &PunchKey, records: &[AttendanceRecord]) -> bool {
    records.iter().any(|r| {
        r.date == candidate.date
            && r.manager_name == candidate.manager
            && r.kitchen_name == candidate.kitchen
            && r.action == candidate.action
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::PunchAction;
    use chrono::{NaiveDate, NaiveTime};

    fn record(date: &str, manager: &str, kitchen: &str, action: PunchAction) -> AttendanceRecord {
        AttendanceRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            manager_name: manager.into(),
            kitchen_name: kitchen.into(),
            action,
            latitude: None,
            longitude: None,
            selfie_url: "UploadErr".into(),
            location_url: "Location N/A".into(),
        }
    }

    #[test]
    fn second_identical_punch_is_rejected() {
        let first = record("2025-07-16", "Umesh M", "KOR01.BLR12", PunchAction::PunchIn);
        let mut log = Vec::new();
        assert!(!is_duplicate_punch(&first.key(), &log));
        log.push(first.clone());
        assert!(is_duplicate_punch(&first.key(), &log));
    }

    #[test]
    fn any_differing_field_is_not_a_duplicate() {
        let log = vec![record("2025-07-16", "Umesh M", "KOR01.BLR12", PunchAction::PunchIn)];
        let others = [
            record("2025-07-17", "Umesh M", "KOR01.BLR12", PunchAction::PunchIn),
            record("2025-07-16", "Bablu C", "KOR01.BLR12", PunchAction::PunchIn),
            record("2025-07-16", "Umesh M", "SKM01.CHN03", PunchAction::PunchIn),
            record("2025-07-16", "Umesh M", "KOR01.BLR12", PunchAction::PunchOut),
        ];
        for other in &others {
            assert!(!is_duplicate_punch(&other.key(), &log), "{:?}", other.key());
        }
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let log = vec![record("2025-07-16", "Umesh M", "KOR01.BLR12", PunchAction::PunchIn)];
        let shouty = record("2025-07-16", "UMESH M", "KOR01.BLR12", PunchAction::PunchIn);
        assert!(!is_duplicate_punch(&shouty.key(), &log));
    }
}
