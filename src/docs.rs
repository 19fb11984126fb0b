use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::attendance::{AttendanceDayResponse, PunchRequest};
use crate::api::catalog::CatalogResponse;
use crate::api::daily_review::DailyReviewRequest;
use crate::api::dashboard::{CoverageResponse, VisitSummaryResponse};
use crate::api::leave_request::{CreateLeave, LeaveListResponse, LeaveType};
use crate::api::roster::{RosterSubmission, RosterViewResponse};
use crate::auth::handlers::TokenPair;
use crate::model::attendance::{AttendanceRecord, PunchAction};
use crate::model::catalog::Catalog;
use crate::model::leave_request::LeaveRequest;
use crate::model::roster::{RosterDay, RosterEntry};
use crate::models::{LoginReqDto, RegisterReq};
use crate::recon::{AttendanceRow, RosterCoverageRow, VisitCount, VisitWindow, Visited};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kitchen Visit Tracker API",
        version = "1.0.0",
        description = r#"
## Kitchen Visit Tracker

Shift attendance and roster reconciliation for a multi-site kitchen operation.

### Key Features
- **Attendance**
  - Punch in / punch out with a geotagged selfie
  - One punch per manager, kitchen, action and day
- **Roster**
  - Weekly roster submission and per-week view
- **Dashboards**
  - Attendance flagged against the roster (mismatch)
  - Roster coverage (Visited Yes/No) and visit frequency
- **Daily review and leave requests**

### Security
Endpoints under `/api` require a **JWT Bearer** access token.
Dashboards and the leave list are limited to **Supervisor** and **Admin**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::catalog::get_catalog,

        crate::api::attendance::punch,
        crate::api::attendance::list_attendance,

        crate::api::roster::submit_roster,
        crate::api::roster::view_roster,

        crate::api::dashboard::visit_summary,
        crate::api::dashboard::roster_coverage,

        crate::api::daily_review::submit_review,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            TokenPair,
            Catalog,
            CatalogResponse,
            PunchAction,
            PunchRequest,
            AttendanceRecord,
            AttendanceRow,
            AttendanceDayResponse,
            RosterDay,
            RosterEntry,
            RosterSubmission,
            RosterViewResponse,
            VisitWindow,
            VisitCount,
            VisitSummaryResponse,
            Visited,
            RosterCoverageRow,
            CoverageResponse,
            DailyReviewRequest,
            LeaveType,
            CreateLeave,
            LeaveRequest,
            LeaveListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Catalog", description = "Managers, kitchens and form choices"),
        (name = "Attendance", description = "Punches and daily attendance"),
        (name = "Roster", description = "Weekly roster"),
        (name = "Dashboard", description = "Visit summary and roster coverage"),
        (name = "Review", description = "Daily review"),
        (name = "Leave", description = "Leave requests"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/api/attendance",
            "/api/roster",
            "/api/dashboard/visits",
            "/api/dashboard/coverage",
            "/api/review",
            "/api/leave",
            "/api/catalog",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
