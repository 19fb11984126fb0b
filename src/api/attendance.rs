use std::future::Future;

use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::ApiError,
    model::{
        attendance::{AttendanceRecord, PunchAction, PunchKey, location_link},
        catalog::Catalog,
    },
    recon::{AttendanceRow, annotate_mismatch, is_duplicate_punch},
    upload::{UPLOAD_ERR, UploadClient, decode_payload, selfie_filename},
    utils::{
        db_utils,
        punch_filter::{PUNCH_FILTER, PunchFilter},
        roster_cache,
    },
};

pub const MISSING_FIELDS: &str = "All fields & selfie required!";
pub const DUPLICATE_PUNCH: &str = "Duplicate punch today.";

#[derive(Debug, Deserialize, ToSchema)]
pub struct PunchRequest {
    #[serde(default)]
    #[schema(example = "Ayub Sait")]
    pub manager: String,
    #[serde(default)]
    #[schema(example = "ANR01.BLR22")]
    pub kitchen: String,
    #[schema(example = "Punch In")]
    pub action: Option<PunchAction>,
    #[schema(example = 12.9716)]
    pub latitude: Option<f64>,
    #[schema(example = 77.5946)]
    pub longitude: Option<f64>,
    /// Base64 JPEG, optionally as a `data:` URL
    pub selfie: Option<String>,
}

impl PunchRequest {
    /// Checks required fields against the catalog and returns the action with
    /// the decoded selfie.
    pub fn validate(&self, catalog: &Catalog) -> Result<(PunchAction, Vec<u8>), ApiError> {
        let action = match self.action {
            Some(action) if !self.manager.is_empty() && !self.kitchen.is_empty() => action,
            _ => return Err(ApiError::bad_request(MISSING_FIELDS)),
        };
        if !catalog.has_manager(&self.manager) {
            return Err(ApiError::bad_request(format!("Unknown manager: {}", self.manager)));
        }
        if !catalog.has_kitchen(&self.kitchen) {
            return Err(ApiError::bad_request(format!("Unknown kitchen: {}", self.kitchen)));
        }

        let selfie = decode_payload(self.selfie.as_deref())
            .map_err(|_| ApiError::bad_request("Selfie is not valid base64"))?
            .ok_or_else(|| ApiError::bad_request(MISSING_FIELDS))?;
        Ok((action, selfie))
    }
}

/// Rejects a punch already stored today. A filter miss skips the store.
pub async fn ensure_new_punch<F, Fut>(filter: &PunchFilter, key: &PunchKey, load_existing: F) -> Result<(), ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<AttendanceRecord>, sqlx::Error>>,
{
    if !filter.might_exist(key) {
        return Ok(());
    }

    let existing = load_existing().await.map_err(|e| {
        tracing::error!(error = %e, manager = %key.manager, "Failed to load punches");
        ApiError::Internal
    })?;

    if is_duplicate_punch(key, &existing) {
        tracing::info!(manager = %key.manager, kitchen = %key.kitchen, action = %key.action, "Duplicate punch rejected");
        return Err(ApiError::Conflict(DUPLICATE_PUNCH.into()));
    }
    Ok(())
}

/// Maps a failed append. A unique violation means an identical punch was
/// stored concurrently, possibly by another instance.
fn append_error(filter: &PunchFilter, key: &PunchKey, e: sqlx::Error) -> ApiError {
    if db_utils::is_unique_violation(&e) {
        filter.insert(key);
        return ApiError::Conflict(DUPLICATE_PUNCH.into());
    }
    tracing::error!(error = %e, manager = %key.manager, "Failed to append punch");
    ApiError::Internal
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Defaults to today
    #[param(value_type = Option<String>, format = "date", example = "2025-07-16")]
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceDayResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub data: Vec<AttendanceRow>,
}

/// Record a punch in or out
///
/// The selfie is uploaded before the append, so a duplicate caught only by the
/// unique index leaves its upload behind in storage.
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = PunchRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance recorded. Thank you!"
        })),
        (status = 400, description = "Missing or unknown fields", body = Object, example = json!({
            "message": "All fields & selfie required!"
        })),
        (status = 409, description = "Same punch already recorded today", body = Object, example = json!({
            "message": "Duplicate punch today."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn punch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    uploader: web::Data<UploadClient>,
    payload: web::Json<PunchRequest>,
) -> Result<HttpResponse, ApiError> {
    let (action, selfie) = payload.validate(&config.catalog)?;

    let now = config.local_now();
    let date = now.date_naive();
    let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());

    let key = PunchKey {
        date,
        manager: payload.manager.clone(),
        kitchen: payload.kitchen.clone(),
        action,
    };

    ensure_new_punch(&PUNCH_FILTER, &key, || {
        db_utils::attendance_for_manager_on(pool.get_ref(), date, &key.manager)
    })
    .await?;

    let selfie_url = uploader
        .upload_or(
            &selfie_filename(&key.manager, date, time),
            &selfie,
            "image/jpeg",
            UPLOAD_ERR,
        )
        .await;

    let record = AttendanceRecord {
        date,
        time,
        manager_name: key.manager.clone(),
        kitchen_name: key.kitchen.clone(),
        action: key.action,
        latitude: payload.latitude,
        longitude: payload.longitude,
        selfie_url,
        location_url: location_link(payload.latitude, payload.longitude),
    };

    db_utils::insert_attendance(pool.get_ref(), &record)
        .await
        .map_err(|e| append_error(&PUNCH_FILTER, &key, e))?;

    PUNCH_FILTER.insert(&record.key());
    tracing::info!(
        manager = %record.manager_name,
        kitchen = %record.kitchen_name,
        action = %record.action,
        recorded_by = %auth.username,
        "Punch recorded"
    );
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Attendance recorded. Thank you!",
        "record": record
    })))
}

/// Attendance for one day, each row flagged when it has no roster entry
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, body = AttendanceDayResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_supervisor_or_admin()?;

    let date = query.date.unwrap_or_else(|| config.local_now().date_naive());

    let attendance = db_utils::attendance_on(pool.get_ref(), date).await.map_err(|e| {
        tracing::error!(error = %e, %date, "Failed to load attendance");
        ApiError::Internal
    })?;
    let roster = roster_cache::roster_on(pool.get_ref(), date).await.map_err(|e| {
        tracing::error!(error = %e, %date, "Failed to load roster");
        ApiError::Internal
    })?;

    Ok(HttpResponse::Ok().json(AttendanceDayResponse {
        date,
        data: annotate_mismatch(&attendance, &roster),
    }))
}
