use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use saude_core::{PersonId, VaccinationId};

use crate::app::extract::{Body, Params};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_vaccinations).post(record_vaccination))
        .route("/pessoa/:uuid", get(person_history))
        .route(
            "/:uuid",
            get(get_vaccination)
                .put(amend_vaccination)
                .delete(delete_vaccination),
        )
}

pub async fn record_vaccination(
    Extension(services): Extension<Arc<AppServices>>,
    Body(body): Body<dto::VaccinationRequest>,
) -> axum::response::Response {
    match services.record_vaccination(body.into()) {
        Ok(v) => (
            StatusCode::CREATED,
            Json(dto::item("Vacinação registrada com sucesso", v)),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "vaccination rejected");
            errors::service_error_to_response(e)
        }
    }
}

pub async fn amend_vaccination(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
    Body(body): Body<dto::VaccinationRequest>,
) -> axum::response::Response {
    let id: VaccinationId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.amend_vaccination(id, body.into()) {
        Ok(v) => (
            StatusCode::OK,
            Json(dto::item("Vacinação atualizada com sucesso", v)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_vaccination(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
) -> axum::response::Response {
    let id: VaccinationId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.delete_vaccination(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_vaccination(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
) -> axum::response::Response {
    let id: VaccinationId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.vaccination(id) {
        Ok(v) => (StatusCode::OK, Json(dto::item("Vacinação encontrada", v))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_vaccinations(
    Extension(services): Extension<Arc<AppServices>>,
    Params(params): Params<dto::PageParams>,
) -> axum::response::Response {
    let body = dto::page(
        "Vacinações listadas com sucesso",
        services.vaccinations(),
        &params,
        services.max_page_size(),
    );
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn person_history(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
    Params(params): Params<dto::PageParams>,
) -> axum::response::Response {
    let person_id: PersonId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.history(person_id) {
        Ok(items) => {
            let body = dto::page(
                "Histórico vacinal listado com sucesso",
                items,
                &params,
                services.max_page_size(),
            );
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
