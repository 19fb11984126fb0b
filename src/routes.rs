use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{
    HttpRequest,
    error::{JsonPayloadError, QueryPayloadError},
    middleware::from_fn,
    web,
};
use anyhow::{Result, anyhow};

use crate::{
    api::{attendance, catalog, daily_review, dashboard, leave_request, roster},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::ApiError,
};

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-route rate limits, built once; each worker gets its own limiter state.
pub struct RateLimits {
    login: LimiterConfig,
    register: LimiterConfig,
    refresh: LimiterConfig,
    protected: LimiterConfig,
}

fn build_limiter(requests_per_min: u32) -> Result<LimiterConfig> {
    let burst = requests_per_min.max(1);
    let per_ms = (60_000 / burst as u64).max(1);
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min}/min"))
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            register: build_limiter(config.rate_register_per_min)?,
            refresh: build_limiter(config.rate_refresh_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

/// Malformed bodies and query strings get the same `{"message"}` shape as handler errors.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(err.to_string()).into()
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&limits.login))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&limits.register))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&limits.refresh))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&limits.login))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&limits.protected)) // rate limiting
            .service(web::resource("/catalog").route(web::get().to(catalog::get_catalog)))
            .service(
                // /attendance
                web::resource("/attendance")
                    .route(web::post().to(attendance::punch))
                    .route(web::get().to(attendance::list_attendance)),
            )
            .service(
                // /roster
                web::resource("/roster")
                    .route(web::post().to(roster::submit_roster))
                    .route(web::get().to(roster::view_roster)),
            )
            .service(
                web::scope("/dashboard")
                    .service(web::resource("/visits").route(web::get().to(dashboard::visit_summary)))
                    .service(web::resource("/coverage").route(web::get().to(dashboard::roster_coverage))),
            )
            .service(web::resource("/review").route(web::post().to(daily_review::submit_review)))
            .service(
                // /leave
                web::resource("/leave")
                    .route(web::post().to(leave_request::create_leave))
                    .route(web::get().to(leave_request::leave_list)),
            ),
    );
}
