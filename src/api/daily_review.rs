use actix_web::{HttpResponse, web};
use chrono::Timelike;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::ApiError,
    model::{catalog::Catalog, review::DailyReview},
    upload::{UPLOAD_ERR, UploadClient, decode_payload, screenshot_filename},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct DailyReviewRequest {
    #[serde(default)]
    #[schema(example = "Naveen Kumar M")]
    pub manager: String,
    #[serde(default)]
    #[schema(example = json!(["ANR01.BLR22", "BTM01.BLR03"]))]
    pub kitchens: Vec<String>,
    /// Base64 image, mandatory
    pub screenshot: Option<String>,
}

impl DailyReviewRequest {
    /// Checks are applied in form order; returns the decoded screenshot.
    pub fn validate(&self, catalog: &Catalog) -> Result<Vec<u8>, ApiError> {
        if !catalog.has_manager(&self.manager) {
            return Err(ApiError::bad_request("Please select a manager."));
        }
        if self.kitchens.is_empty() {
            return Err(ApiError::bad_request("Please select at least one kitchen."));
        }
        if let Some(unknown) = self.kitchens.iter().find(|k| !catalog.has_kitchen(k)) {
            return Err(ApiError::bad_request(format!("Unknown kitchen: {unknown}")));
        }
        decode_payload(self.screenshot.as_deref())
            .map_err(|_| ApiError::bad_request("Screenshot is not valid base64"))?
            .ok_or_else(|| ApiError::bad_request("Screenshot upload is mandatory."))
    }
}

/// Submit the end-of-day review
#[utoipa::path(
    post,
    path = "/api/review",
    request_body = DailyReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = Object, example = json!({
            "message": "Daily review submitted successfully."
        })),
        (status = 400, description = "Missing manager, kitchens or screenshot"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Review"
)]
pub async fn submit_review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    uploader: web::Data<UploadClient>,
    payload: web::Json<DailyReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    let screenshot = payload.validate(&config.catalog)?;

    let now = config.local_now();
    let date = now.date_naive();
    let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());

    let screenshot_url = uploader
        .upload_or(
            &screenshot_filename(&payload.manager, date, time),
            &screenshot,
            "image/jpeg",
            UPLOAD_ERR,
        )
        .await;

    let review = DailyReview {
        date,
        time,
        manager: payload.manager.clone(),
        kitchens: payload.kitchens.join(", "),
        screenshot_url,
    };

    sqlx::query(
        r#"
        INSERT INTO daily_review (date, time, manager, kitchens, screenshot_url)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(review.date)
    .bind(review.time)
    .bind(&review.manager)
    .bind(&review.kitchens)
    .bind(&review.screenshot_url)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, manager = %review.manager, "Failed to append daily review");
        ApiError::Internal
    })?;

    tracing::info!(manager = %review.manager, submitted_by = %auth.username, "Daily review submitted");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Daily review submitted successfully.",
        "review": review
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(manager: &str, kitchens: &[&str], screenshot: Option<&str>) -> DailyReviewRequest {
        DailyReviewRequest {
            manager: manager.into(),
            kitchens: kitchens.iter().map(|k| k.to_string()).collect(),
            screenshot: screenshot.map(str::to_string),
        }
    }

    fn message(err: ApiError) -> String {
        err.to_string()
    }

    #[test]
    fn checks_run_in_form_order() {
        let catalog = Catalog::default();
        assert_eq!(
            message(req("", &[], None).validate(&catalog).unwrap_err()),
            "Please select a manager."
        );
        assert_eq!(
            message(req("Srividya", &[], None).validate(&catalog).unwrap_err()),
            "Please select at least one kitchen."
        );
        assert_eq!(
            message(req("Srividya", &["HSR01.BLR02"], None).validate(&catalog).unwrap_err()),
            "Screenshot upload is mandatory."
        );
        assert!(req("Srividya", &["HSR01.BLR02", "CK-Corp"], Some("aGk=")).validate(&catalog).is_ok());
    }
}
