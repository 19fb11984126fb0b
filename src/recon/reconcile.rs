use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;
use crate::model::roster::RosterEntry;

type VisitKey<'a> = (NaiveDate, &'a str, &'a str);

/// An attendance row with its roster check.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceRow {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    /// True when no roster entry shares date, manager and kitchen.
    pub mismatch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
pub enum Visited {
    Yes,
    No,
}

/// A scheduled visit with whether a punch was recorded for it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterCoverageRow {
    #[schema(example = "2025-07-21", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub manager_name: String,
    pub scheduled_kitchen: String,
    pub login_time: String,
    pub remarks: String,
    pub visited: Visited,
}

/// Flag every attendance row that has no matching roster entry.
pub fn annotate_mismatch(attendance: &[AttendanceRecord], roster: &[RosterEntry]) -> Vec<AttendanceRow> {
    let scheduled: HashSet<VisitKey<'_>> = roster
        .iter()
        .map(|r| (r.date, r.manager_name.as_str(), r.kitchen_name.as_str()))
        .collect();

    attendance
        .iter()
        .map(|a| AttendanceRow {
            mismatch: !scheduled.contains(&(a.date, a.manager_name.as_str(), a.kitchen_name.as_str())),
            record: a.clone(),
        })
        .collect()
}

/// The inverse view: each roster entry marked by whether any punch covers it.
pub fn annotate_visited(roster: &[RosterEntry], attendance: &[AttendanceRecord]) -> Vec<RosterCoverageRow> {
    let punched: HashSet<VisitKey<'_>> = attendance
        .iter()
        .map(|a| (a.date, a.manager_name.as_str(), a.kitchen_name.as_str()))
        .collect();

    roster
        .iter()
        .map(|r| {
            let hit = punched.contains(&(r.date, r.manager_name.as_str(), r.kitchen_name.as_str()));
            RosterCoverageRow {
                date: r.date,
                manager_name: r.manager_name.clone(),
                scheduled_kitchen: r.kitchen_name.clone(),
                login_time: r.login_time.clone(),
                remarks: r.remarks.clone(),
                visited: if hit { Visited::Yes } else { Visited::No },
            }
        })
        .collect()
}

/// Manager filter (`None` or "All" keeps everyone) plus the missed-only toggle,
/// sorted by date then manager.
pub fn filter_coverage(
    rows: Vec<RosterCoverageRow>,
    manager: Option<&str>,
    missed_only: bool,
) -> Vec<RosterCoverageRow> {
    let manager = manager.filter(|m| *m != "All");
    let mut out: Vec<RosterCoverageRow> = rows
        .into_iter()
        .filter(|r| manager.is_none_or(|m| r.manager_name == m))
        .filter(|r| !missed_only || r.visited == Visited::No)
        .collect();
    out.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.manager_name.cmp(&b.manager_name)));
    out
}
