use axum::Router;

pub mod people;
pub mod system;
pub mod vaccinations;
pub mod vaccines;

/// Router for all `/api/v1` endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/pessoa", people::router())
        .nest("/vacina", vaccines::router())
        .nest("/vacinacoes", vaccinations::router())
}
