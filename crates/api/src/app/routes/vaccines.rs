use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use saude_core::VaccineId;
use saude_records::{VaccineDetails, VaccineResponse};

use crate::app::extract::{Body, Params};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_vaccines).post(register_vaccine))
        .route(
            "/:uuid",
            get(get_vaccine).put(update_vaccine).delete(delete_vaccine),
        )
}

pub async fn register_vaccine(
    Extension(services): Extension<Arc<AppServices>>,
    Body(body): Body<VaccineDetails>,
) -> axum::response::Response {
    match services.register_vaccine(body) {
        Ok(v) => (
            StatusCode::CREATED,
            Json(dto::item("Vacina cadastrada com sucesso", VaccineResponse::from(&v))),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "vaccine registration rejected");
            errors::service_error_to_response(e)
        }
    }
}

pub async fn update_vaccine(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
    Body(body): Body<VaccineDetails>,
) -> axum::response::Response {
    let id: VaccineId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.update_vaccine(id, body) {
        Ok(v) => (
            StatusCode::OK,
            Json(dto::item("Vacina atualizada com sucesso", VaccineResponse::from(&v))),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_vaccine(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
) -> axum::response::Response {
    let id: VaccineId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.delete_vaccine(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_vaccine(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
) -> axum::response::Response {
    let id: VaccineId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.vaccine(id) {
        Ok(v) => (
            StatusCode::OK,
            Json(dto::item("Vacina encontrada", VaccineResponse::from(&v))),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_vaccines(
    Extension(services): Extension<Arc<AppServices>>,
    Params(params): Params<dto::PageParams>,
) -> axum::response::Response {
    let items = services
        .vaccines()
        .iter()
        .map(VaccineResponse::from)
        .collect::<Vec<_>>();
    let body = dto::page("Vacinas listadas com sucesso", items, &params, services.max_page_size());
    (StatusCode::OK, Json(body)).into_response()
}
