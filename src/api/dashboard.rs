use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::ApiError,
    recon::{RosterCoverageRow, VisitCount, VisitWindow, annotate_visited, filter_coverage, visit_frequency},
    utils::db_utils,
};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisitQuery {
    /// last7 (default), last30 or all
    #[serde(default)]
    pub window: VisitWindow,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CoverageQuery {
    /// last7 (default), last30 or all
    #[serde(default)]
    pub window: VisitWindow,
    /// Manager name, or "All"
    pub manager: Option<String>,
    /// Only scheduled visits without a punch
    #[serde(default)]
    pub missed_only: bool,
}

#[derive(Serialize, ToSchema)]
pub struct VisitSummaryResponse {
    pub window: VisitWindow,
    /// Attendance rows inside the window
    pub total: usize,
    pub data: Vec<VisitCount>,
}

#[derive(Serialize, ToSchema)]
pub struct CoverageResponse {
    pub window: VisitWindow,
    pub data: Vec<RosterCoverageRow>,
}

/// Visit counts per manager and kitchen
#[utoipa::path(
    get,
    path = "/api/dashboard/visits",
    params(VisitQuery),
    responses(
        (status = 200, body = VisitSummaryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn visit_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<VisitQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_supervisor_or_admin()?;

    let today = config.local_now().date_naive();
    let records = db_utils::attendance_since(pool.get_ref(), query.window.cutoff(today))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load attendance for visit summary");
            ApiError::Internal
        })?;

    let data = visit_frequency(&records, query.window, today);
    let total = data.iter().map(|c| c.visits).sum();

    Ok(HttpResponse::Ok().json(VisitSummaryResponse {
        window: query.window,
        total,
        data,
    }))
}

/// Scheduled visits marked Visited Yes/No
#[utoipa::path(
    get,
    path = "/api/dashboard/coverage",
    params(CoverageQuery),
    responses(
        (status = 200, body = CoverageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn roster_coverage(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<CoverageQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_supervisor_or_admin()?;

    let today = config.local_now().date_naive();
    let cutoff = query.window.cutoff(today);

    let roster = db_utils::roster_since(pool.get_ref(), cutoff).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load roster for coverage");
        ApiError::Internal
    })?;
    let attendance = db_utils::attendance_since(pool.get_ref(), cutoff).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load attendance for coverage");
        ApiError::Internal
    })?;

    let rows = annotate_visited(&roster, &attendance);

    Ok(HttpResponse::Ok().json(CoverageResponse {
        window: query.window,
        data: filter_coverage(rows, query.manager.as_deref(), query.missed_only),
    }))
}
