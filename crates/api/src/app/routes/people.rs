use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use saude_core::PersonId;
use saude_records::{PersonDetails, PersonResponse};

use crate::app::extract::{Body, Params};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_active_people).post(register_person))
        .route("/all", get(list_all_people))
        .route("/cpf/:cpf", get(get_person_by_cpf))
        .route(
            "/:uuid",
            get(get_person).put(update_person).delete(deactivate_person),
        )
}

pub async fn register_person(
    Extension(services): Extension<Arc<AppServices>>,
    Body(body): Body<PersonDetails>,
) -> axum::response::Response {
    match services.register_person(body) {
        Ok(p) => (
            StatusCode::CREATED,
            Json(dto::item("Pessoa cadastrada com sucesso", PersonResponse::from(&p))),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "person registration rejected");
            errors::service_error_to_response(e)
        }
    }
}

pub async fn update_person(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
    Body(body): Body<PersonDetails>,
) -> axum::response::Response {
    let id: PersonId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.update_person(id, body) {
        Ok(p) => (
            StatusCode::OK,
            Json(dto::item("Pessoa atualizada com sucesso", PersonResponse::from(&p))),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn deactivate_person(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
) -> axum::response::Response {
    let id: PersonId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.deactivate_person(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_person(
    Extension(services): Extension<Arc<AppServices>>,
    Path(uuid): Path<String>,
) -> axum::response::Response {
    let id: PersonId = match errors::parse_id(&uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.person(id) {
        Ok(p) => (
            StatusCode::OK,
            Json(dto::item("Pessoa encontrada", PersonResponse::from(&p))),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_person_by_cpf(
    Extension(services): Extension<Arc<AppServices>>,
    Path(cpf): Path<String>,
) -> axum::response::Response {
    match services.person_by_cpf(&cpf) {
        Ok(p) => (
            StatusCode::OK,
            Json(dto::item("Pessoa encontrada", PersonResponse::from(&p))),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_active_people(
    Extension(services): Extension<Arc<AppServices>>,
    Params(params): Params<dto::PageParams>,
) -> axum::response::Response {
    list_people(services, params, false)
}

pub async fn list_all_people(
    Extension(services): Extension<Arc<AppServices>>,
    Params(params): Params<dto::PageParams>,
) -> axum::response::Response {
    list_people(services, params, true)
}

fn list_people(
    services: Arc<AppServices>,
    params: dto::PageParams,
    include_inactive: bool,
) -> axum::response::Response {
    let items = services
        .people(include_inactive)
        .iter()
        .map(PersonResponse::from)
        .collect::<Vec<_>>();
    let body = dto::page("Pessoas listadas com sucesso", items, &params, services.max_page_size());
    (StatusCode::OK, Json(body)).into_response()
}
