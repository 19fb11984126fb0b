use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum VisitWindow {
    #[default]
    #[serde(rename = "last7")]
    Last7Days,
    #[serde(rename = "last30")]
    Last30Days,
    #[serde(rename = "all")]
    AllTime,
}

impl VisitWindow {
    /// Earliest date inside the window, `None` for all time.
    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            VisitWindow::Last7Days => Some(today - Duration::days(7)),
            VisitWindow::Last30Days => Some(today - Duration::days(30)),
            VisitWindow::AllTime => None,
        }
    }

    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        self.cutoff(today).is_none_or(|cutoff| date >= cutoff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VisitCount {
    #[schema(example = "Rakesh Babu")]
    pub manager_name: String,
    #[schema(example = "WFD01.BLR06")]
    pub kitchen_name: String,
    #[schema(example = 4)]
    pub visits: usize,
}

/// Count punches per (manager, kitchen) inside the window, ordered by manager then kitchen.
pub fn visit_frequency(records: &[AttendanceRecord], window: VisitWindow, today: NaiveDate) -> Vec<VisitCount> {
    let mut groups: BTreeMap<(&str, &str), usize> = BTreeMap::new();

    for record in records.iter().filter(|r| window.contains(r.date, today)) {
        *groups
            .entry((record.manager_name.as_str(), record.kitchen_name.as_str()))
            .or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|((manager, kitchen), visits)| VisitCount {
            manager_name: manager.to_string(),
            kitchen_name: kitchen.to_string(),
            visits,
        })
        .collect()
}
