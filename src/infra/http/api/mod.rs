pub mod error;
pub mod handlers;
pub mod models;

use axum::{Router, routing::get};

use crate::infra::http::HttpState;

pub fn build_api_router() -> Router<HttpState> {
    Router::new()
        .route("/api/v1/films", get(handlers::list_films))
        .route("/api/v1/films/search", get(handlers::search_films))
        .route("/api/v1/films/{film_id}", get(handlers::film_details))
}
