//! Pure reconciliation over attendance and roster rows.
//!
//! Nothing in here touches the database; handlers load the rows and hand
//! them over.

pub mod duplicate;
pub mod reconcile;
pub mod summary;

pub use duplicate::is_duplicate_punch;
pub use reconcile::{AttendanceRow, RosterCoverageRow, Visited, annotate_mismatch, annotate_visited, filter_coverage};
pub use summary::{VisitCount, VisitWindow, visit_frequency};
