use axum::Router;

pub mod materials;
pub mod stock;
pub mod system;

/// Router for all stock endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(stock::router())
        .nest("/materials", materials::router())
}
