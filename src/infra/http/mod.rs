pub mod api;
mod middleware;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, middleware as axum_middleware, routing::get};

use crate::application::catalog::CatalogService;
use crate::application::error::ErrorReport;
use crate::application::index::{IndexError, SearchIndex};

pub use middleware::{REQUEST_ID_HEADER, RequestContext};

#[derive(Clone)]
pub struct HttpState {
    pub catalog: CatalogService,
    pub index: Arc<dyn SearchIndex>,
}

pub fn build_router(state: HttpState) -> Router {
    api::build_api_router()
        .route("/_health", get(liveness))
        .route("/_health/index", get(index_health))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::trace_requests))
}

async fn liveness() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn index_health(State(state): State<HttpState>) -> Response {
    index_health_response(state.index.ping().await)
}

fn index_health_response(result: Result<(), IndexError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::index_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
