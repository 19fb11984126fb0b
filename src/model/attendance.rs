use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Placeholder stored instead of a link when no coordinates were captured.
pub const LOCATION_NA: &str = "Location N/A";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
pub enum PunchAction {
    #[serde(rename = "Punch In")]
    #[strum(serialize = "Punch In")]
    PunchIn,
    #[serde(rename = "Punch Out")]
    #[strum(serialize = "Punch Out")]
    PunchOut,
}

impl TryFrom<String> for PunchAction {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One row of the attendance log. Appended once per punch, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = "2025-07-16", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:41:07", value_type = String)]
    pub time: NaiveTime,
    #[schema(example = "Ayub Sait")]
    pub manager_name: String,
    #[schema(example = "ANR01.BLR22")]
    pub kitchen_name: String,
    #[sqlx(try_from = "String")]
    pub action: PunchAction,
    #[schema(example = 12.9716, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 77.5946, nullable = true)]
    pub longitude: Option<f64>,
    #[schema(example = "https://drive.google.com/file/d/abc/view?usp=sharing")]
    pub selfie_url: String,
    #[schema(example = "https://www.google.com/maps?q=12.9716,77.5946")]
    pub location_url: String,
}

/// The logical identity of a punch: one per manager, kitchen, action and day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PunchKey {
    pub date: NaiveDate,
    pub manager: String,
    pub kitchen: String,
    pub action: PunchAction,
}

impl PunchKey {
    pub fn filter_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.date.format("%Y-%m-%d"),
            self.manager,
            self.kitchen,
            self.action
        )
    }
}

impl AttendanceRecord {
    pub fn key(&self) -> PunchKey {
        PunchKey {
            date: self.date,
            manager: self.manager_name.clone(),
            kitchen: self.kitchen_name.clone(),
            action: self.action,
        }
    }
}

pub fn location_link(latitude: Option<f64>, longitude: Option<f64>) -> String {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => format!("https://www.google.com/maps?q={lat},{lon}"),
        _ => LOCATION_NA.to_string(),
    }
}
