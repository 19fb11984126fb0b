use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::ApiError,
    model::{
        catalog::Catalog,
        roster::{RosterDay, RosterEntry, expand_week, filter_roster, is_login_slot, next_monday, roster_weeks},
    },
    utils::{db_utils, roster_cache},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RosterSubmission {
    #[serde(default)]
    #[schema(example = "Ayub Sait")]
    pub manager: String,
    /// Defaults to the next Monday (today when today is a Monday)
    #[schema(example = "2025-07-21", value_type = Option<String>, format = "date")]
    pub week_start: Option<NaiveDate>,
    /// Up to seven days, starting at `week_start`
    pub days: Vec<RosterDay>,
}

impl RosterSubmission {
    /// Validate and expand into roster rows.
    pub fn entries(&self, catalog: &Catalog, today: NaiveDate) -> Result<Vec<RosterEntry>, ApiError> {
        if !catalog.has_manager(&self.manager) {
            return Err(ApiError::bad_request("Please select a manager."));
        }
        if self.days.len() > 7 {
            return Err(ApiError::bad_request("A roster covers at most 7 days"));
        }

        let week_start = self.week_start.unwrap_or_else(|| next_monday(today));
        let entries = expand_week(&self.manager, week_start, &self.days);

        for entry in &entries {
            if !catalog.has_kitchen(&entry.kitchen_name) {
                return Err(ApiError::bad_request(format!("Unknown kitchen: {}", entry.kitchen_name)));
            }
            if !is_login_slot(&entry.login_time) {
                return Err(ApiError::bad_request(format!(
                    "Invalid login time {:?} for {}",
                    entry.login_time, entry.date
                )));
            }
        }

        if entries.is_empty() {
            return Err(ApiError::bad_request("No roster entries to submit"));
        }
        Ok(entries)
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RosterQuery {
    /// Manager name, or "All"
    pub manager: Option<String>,
    /// ISO week number; defaults to the current week
    pub week: Option<u32>,
    /// ISO week-based year; any year when absent
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct RosterViewResponse {
    pub week: u32,
    /// ISO week numbers that have roster entries
    pub weeks: Vec<u32>,
    pub data: Vec<RosterEntry>,
}

/// Submit a weekly roster
#[utoipa::path(
    post,
    path = "/api/roster",
    request_body = RosterSubmission,
    responses(
        (status = 201, description = "Roster submitted", body = Object, example = json!({
            "message": "Roster submitted successfully",
            "entries": 6
        })),
        (status = 400, description = "Invalid manager, kitchen, login time or empty week"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Roster"
)]
pub async fn submit_roster(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<RosterSubmission>,
) -> Result<HttpResponse, ApiError> {
    let today = config.local_now().date_naive();
    let entries = payload.entries(&config.catalog, today)?;

    db_utils::insert_roster(pool.get_ref(), &entries).await.map_err(|e| {
        tracing::error!(error = %e, manager = %payload.manager, "Failed to append roster");
        ApiError::Internal
    })?;

    roster_cache::invalidate(entries.iter().map(|e| e.date)).await;

    tracing::info!(
        manager = %payload.manager,
        entries = entries.len(),
        submitted_by = %auth.username,
        "Roster submitted"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Roster submitted successfully",
        "entries": entries.len()
    })))
}

/// Roster for one ISO week
#[utoipa::path(
    get,
    path = "/api/roster",
    params(RosterQuery),
    responses(
        (status = 200, body = RosterViewResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Roster"
)]
pub async fn view_roster(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<RosterQuery>,
) -> Result<HttpResponse, ApiError> {
    let all = db_utils::roster_since(pool.get_ref(), None).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load roster");
        ApiError::Internal
    })?;

    let week = query
        .week
        .unwrap_or_else(|| config.local_now().date_naive().iso_week().week());
    let manager = query.manager.as_deref().filter(|m| *m != "All");

    Ok(HttpResponse::Ok().json(RosterViewResponse {
        week,
        weeks: roster_weeks(&all),
        data: filter_roster(&all, manager, week, query.year),
    }))
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

    #[test]
    fn defaults_to_next_monday() {
        let submission = RosterSubmission {
            manager: "Selva Kumar".into(),
            week_start: None,
            days: vec![day("VDP01.CHN02", "08:30"), day("", ""), day("Leave", "07:00")],
        };
        // Wednesday -> following Monday
        let entries = submission.entries(&Catalog::default(), d("2025-07-16")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, d("2025-07-21"));
        assert_eq!(entries[1].date, d("2025-07-23"));
    }

    #[test]
    fn rejects_bad_rows() {
        let catalog = Catalog::default();
        let today = d("2025-07-16");
        let mut submission = RosterSubmission {
            manager: "Selva Kumar".into(),
            week_start: Some(d("2025-07-21")),
            days: vec![day("VDP01.CHN02", "08:15")],
        };
        assert!(submission.entries(&catalog, today).is_err());

        submission.days = vec![day("Nowhere", "08:30")];
        assert!(submission.entries(&catalog, today).is_err());

        submission.days = vec![day("", ""); 3];
        assert!(submission.entries(&catalog, today).is_err());

        submission.days = vec![day("VDP01.CHN02", "08:30"); 8];
        assert!(submission.entries(&catalog, today).is_err());

        submission.days = vec![day("VDP01.CHN02", "08:30")];
        submission.manager = String::new();
        assert!(submission.entries(&catalog, today).is_err());
    }
}
