use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "2025-07-16", value_type = String, format = "date")]
    pub submitted_on: NaiveDate,
    #[schema(example = "Sonu Kumar")]
    pub manager: String,
    #[schema(example = "Sick Leave")]
    pub leave_type: String,
    #[schema(example = "2025-07-17", value_type = String, format = "date")]
    pub from_date: NaiveDate,
    #[schema(example = "2025-07-18", value_type = String, format = "date")]
    pub to_date: NaiveDate,
    pub reason: String,
    #[schema(example = "N/A")]
    pub document_url: String,
}
