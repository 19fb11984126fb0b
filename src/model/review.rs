use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyReview {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub manager: String,
    /// Visited kitchens joined with ", "
    pub kitchens: String,
    pub screenshot_url: String,
}
