use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset, Utc};

use crate::model::catalog::Catalog;

const DEFAULT_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&supportsAllDrives=true";
const DEFAULT_VIEW_URL_TEMPLATE: &str = "https://drive.google.com/file/d/{id}/view?usp=sharing";

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub url: String,
    /// Bearer token for the storage API; uploads are skipped when unset.
    pub token: Option<String>,
    pub folder_id: Option<String>,
    /// `{id}` is replaced with the stored file's id.
    pub view_url_template: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_level: String,

    /// Offset used to stamp punches (default +05:30).
    pub utc_offset: FixedOffset,
    pub catalog: Catalog,
    pub upload: UploadConfig,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key}: cannot parse {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

/// Comma-separated list; blank items are dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let offset_minutes: i32 = parsed_or("UTC_OFFSET_MINUTES", 330)?;
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| anyhow!("UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let mut catalog = Catalog::default();
        if let Ok(raw) = env::var("MANAGERS") {
            catalog.managers = parse_list(&raw);
        }
        if let Ok(raw) = env::var("KITCHENS") {
            catalog.kitchens = parse_list(&raw);
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed_or("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed_or("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parsed_or("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: parsed_or("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),

            utc_offset,
            catalog,
            upload: UploadConfig {
                url: env::var("UPLOAD_URL").unwrap_or_else(|_| DEFAULT_UPLOAD_URL.to_string()),
                token: env::var("UPLOAD_TOKEN").ok().filter(|t| !t.is_empty()),
                folder_id: env::var("UPLOAD_FOLDER_ID").ok().filter(|f| !f.is_empty()),
                view_url_template: env::var("UPLOAD_VIEW_URL_TEMPLATE")
                    .unwrap_or_else(|_| DEFAULT_VIEW_URL_TEMPLATE.to_string()),
            },
        })
    }

    pub fn local_now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset)
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/visits".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            log_level: "debug".into(),
            utc_offset: FixedOffset::east_opt(330 * 60).unwrap(),
            catalog: Catalog::default(),
            upload: UploadConfig {
                url: DEFAULT_UPLOAD_URL.into(),
                token: None,
                folder_id: None,
                view_url_template: DEFAULT_VIEW_URL_TEMPLATE.into(),
            },
        }
    }
}
