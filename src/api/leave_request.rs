use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::ApiError,
    model::{catalog::Catalog, leave_request::LeaveRequest},
    upload::{NO_DOCUMENT, UploadClient, decode_payload, leave_doc_filename},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum LeaveType {
    #[serde(rename = "Casual Leave")]
    #[strum(serialize = "Casual Leave")]
    Casual,
    #[serde(rename = "Sick Leave")]
    #[strum(serialize = "Sick Leave")]
    Sick,
    #[serde(rename = "Week Off")]
    #[strum(serialize = "Week Off")]
    WeekOff,
    #[serde(rename = "Comp-Off")]
    #[strum(serialize = "Comp-Off")]
    CompOff,
    Other,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeave {
    #[serde(default)]
    #[schema(example = "Sonu Kumar")]
    pub manager: String,
    #[schema(example = "Sick Leave")]
    pub leave_type: LeaveType,
    #[schema(example = "2025-07-17", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2025-07-18", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
    /// Optional base64 document (PDF, JPG or PNG)
    pub document: Option<String>,
}

impl CreateLeave {
    /// Returns the decoded document, if one was attached.
    pub fn validate(&self, catalog: &Catalog) -> Result<Option<Vec<u8>>, ApiError> {
        if !catalog.has_manager(&self.manager) {
            return Err(ApiError::bad_request("Please select a manager."));
        }
        if self.reason.trim().is_empty() {
            return Err(ApiError::bad_request("Reason for leave is required."));
        }
        if self.from_date > self.to_date {
            return Err(ApiError::bad_request("From Date cannot be after To Date."));
        }
        decode_payload(self.document.as_deref())
            .map_err(|_| ApiError::bad_request("Document is not valid base64"))
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by manager name
    pub manager: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page (1-100)
    pub per_page: Option<u32>,
}

/// Page (at least 1), page size (1..=100, default 10) and row offset.
fn page_bounds(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(10).clamp(1, 100);
    let offset = (u64::from(page) - 1) * u64::from(per_page);
    (page, per_page, offset)
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Submit a leave request
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted successfully."
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    uploader: web::Data<UploadClient>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    let document = payload.validate(&config.catalog)?;

    let now = config.local_now();
    let submitted_on = now.date_naive();

    let document_url = match document {
        Some(bytes) => {
            let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());
            uploader
                .upload_or(
                    &leave_doc_filename(&payload.manager, payload.from_date, time),
                    &bytes,
                    "application/octet-stream",
                    NO_DOCUMENT,
                )
                .await
        }
        None => NO_DOCUMENT.to_string(),
    };

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (submitted_on, manager, leave_type, from_date, to_date, reason, document_url)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(submitted_on)
    .bind(&payload.manager)
    .bind(payload.leave_type.as_ref())
    .bind(payload.from_date)
    .bind(payload.to_date)
    .bind(payload.reason.trim())
    .bind(&document_url)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, manager = %payload.manager, "Failed to create leave request");
        ApiError::Internal
    })?;

    tracing::info!(
        manager = %payload.manager,
        leave_type = %payload.leave_type,
        submitted_by = %auth.username,
        "Leave request submitted"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave request submitted successfully.",
        "document_url": document_url
    })))
}

/// List leave requests, newest first
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_supervisor_or_admin()?;

    let (page, per_page, offset) = page_bounds(query.page, query.per_page);
    let manager = query.manager.as_deref().filter(|m| !m.is_empty() && *m != "All");

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leave_requests WHERE (? IS NULL OR manager = ?)")
        .bind(manager)
        .bind(manager)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count leave requests");
            ApiError::Internal
        })?;

    let data = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, submitted_on, manager, leave_type, from_date, to_date, reason, document_url
        FROM leave_requests
        WHERE (? IS NULL OR manager = ?)
        ORDER BY submitted_on DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(manager)
    .bind(manager)
    .bind(u64::from(per_page))
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch leave list");
        ApiError::Internal
    })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::utils::db_utils::test_support::unreachable_pool;

    fn leave(from: &str, to: &str, reason: &str) -> CreateLeave {
        CreateLeave {
            manager: "Joy Matabar".into(),
            leave_type: LeaveType::Casual,
            from_date: NaiveDate::parse_from_str(from, "%Y-%m-%d").unwrap(),
            to_date: NaiveDate::parse_from_str(to, "%Y-%m-%d").unwrap(),
            reason: reason.into(),
            document: None,
        }
    }

    #[test]
    fn leave_type_names() {
        assert_eq!(LeaveType::CompOff.as_ref(), "Comp-Off");
        assert_eq!("Sick Leave".parse::<LeaveType>().unwrap(), LeaveType::Sick);
        let parsed: LeaveType = serde_json::from_str("\"Week Off\"").unwrap();
        assert_eq!(parsed, LeaveType::WeekOff);
    }

    #[test]
    fn validation_rules() {
        let catalog = Catalog::default();
        assert_eq!(leave("2025-07-17", "2025-07-18", "Family function").validate(&catalog).unwrap(), None);
        assert_eq!(
            leave("2025-07-19", "2025-07-18", "Family function").validate(&catalog).unwrap_err().to_string(),
            "From Date cannot be after To Date."
        );
        assert_eq!(
            leave("2025-07-17", "2025-07-17", "   ").validate(&catalog).unwrap_err().to_string(),
            "Reason for leave is required."
        );

        let mut with_doc = leave("2025-07-17", "2025-07-17", "Fever");
        with_doc.document = Some("aGk=".into());
        assert_eq!(with_doc.validate(&catalog).unwrap(), Some(b"hi".to_vec()));
    }

    #[test]
    fn paging_defaults_and_limits() {
        assert_eq!(page_bounds(None, None), (1, 10, 0));
        assert_eq!(page_bounds(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(page_bounds(Some(3), Some(500)), (3, 100, 200));
        assert_eq!(page_bounds(Some(u32::MAX), Some(100)), (u32::MAX, 100, 429_496_729_400));
    }

    #[actix_web::test]
    async fn last_possible_page_reaches_the_store_without_panicking() {
        let supervisor = AuthUser {
            user_id: 1,
            username: "supervisor".into(),
            role: Role::Supervisor,
        };
        let result = leave_list(
            supervisor,
            web::Data::new(unreachable_pool()),
            web::Query(LeaveFilter {
                manager: None,
                page: Some(u32::MAX),
                per_page: Some(100),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Internal)));
    }
}
