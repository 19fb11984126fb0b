use actix_web::{HttpResponse, web};
use serde::Serialize;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    model::{attendance::PunchAction, catalog::Catalog, roster::login_time_slots},
};

#[derive(Serialize, ToSchema)]
pub struct CatalogResponse {
    #[serde(flatten)]
    pub catalog: Catalog,
    pub actions: Vec<PunchAction>,
    /// Roster login choices
    pub login_slots: Vec<String>,
}

/// Selections offered on the punch and roster forms
#[utoipa::path(
    get,
    path = "/api/catalog",
    responses(
        (status = 200, body = CatalogResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn get_catalog(_auth: AuthUser, config: web::Data<Config>) -> HttpResponse {
    HttpResponse::Ok().json(CatalogResponse {
        catalog: config.catalog.clone(),
        actions: PunchAction::iter().collect(),
        login_slots: login_time_slots(),
    })
}
