use std::str::FromStr;
use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod recon;
mod routes;
mod upload;
mod utils;

use config::Config;
use db::init_db;
use docs::ApiDoc;
use routes::RateLimits;
use upload::UploadClient;
use utils::punch_filter;

#[get("/")]
async fn index() -> impl Responder {
    "Kitchen Visit Tracker"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::from_str(&config.log_level).unwrap_or(tracing::Level::DEBUG))
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let uploader = UploadClient::new(config.upload.clone()).context("Failed to build upload client")?;
    if config.upload.token.is_none() {
        tracing::warn!("UPLOAD_TOKEN not set, uploads will be stored as placeholders");
    }
    let limits = Arc::new(RateLimits::from_config(&config)?);

    let pool_for_filter_warmup = pool.clone();
    let today = config.local_now().date_naive();

    actix_web::rt::spawn(async move {
        if let Err(e) =
            punch_filter::warmup_punch_filter(&punch_filter::PUNCH_FILTER, &pool_for_filter_warmup, today).await
        {
            tracing::error!(error = ?e, "Failed to warm up punch filter");
        }
    });

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        let config_data = config.clone();
        let limits = limits.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets match
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(uploader.clone()))
            .service(index)
            .configure(move |cfg| routes::configure(cfg, &config_data, &limits))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
