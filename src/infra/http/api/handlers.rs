use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use crate::application::catalog::Lookup;
use crate::application::pagination::CursorPage;
use crate::application::query::{FilmListRequest, QueryError, QueryParameters};
use crate::infra::http::HttpState;

use super::error::ApiError;
use super::models::{FilmListResponse, FilmLong};

const SOURCE: &str = "infra::http::api::handlers";

pub async fn list_films(
    State(state): State<HttpState>,
    query: Result<Query<FilmListRequest>, QueryRejection>,
) -> Result<Json<FilmListResponse>, ApiError> {
    let params = normalize(query)?;
    list(&state, &params).await
}

/// Like [`list_films`], but a non-empty `query` is mandatory.
pub async fn search_films(
    State(state): State<HttpState>,
    query: Result<Query<FilmListRequest>, QueryRejection>,
) -> Result<Json<FilmListResponse>, ApiError> {
    let params = normalize(query)?;
    if params.title_search().is_none() {
        return Err(ApiError::bad_request(
            "search text is required",
            Some("pass a non-empty `query` parameter".to_string()),
        ));
    }
    list(&state, &params).await
}

pub async fn film_details(
    State(state): State<HttpState>,
    Path(film_id): Path<String>,
) -> Result<Json<FilmLong>, ApiError> {
    // Identifiers that cannot name an indexed film are simply absent.
    let Ok(id) = Uuid::parse_str(film_id.trim()) else {
        return Err(ApiError::not_found("film not found"));
    };

    match state.catalog.film(id).await {
        Lookup::Found(film) => Ok(Json(FilmLong::from(&film))),
        Lookup::NotFound => Err(ApiError::not_found("film not found")),
        Lookup::Rejected(error) => Err(ApiError::rejected(SOURCE, &error)),
        Lookup::BackendUnavailable(error) => Err(ApiError::backend_unavailable(SOURCE, &error)),
    }
}

async fn list(
    state: &HttpState,
    params: &QueryParameters,
) -> Result<Json<FilmListResponse>, ApiError> {
    match state.catalog.films(params).await {
        Lookup::Found(page) => Ok(Json(FilmListResponse::new(&page, params))),
        // `films` answers an empty listing with an empty page; a collection
        // is never absent, so this arm only keeps the match total.
        Lookup::NotFound => Ok(Json(FilmListResponse::new(&CursorPage::empty(), params))),
        Lookup::Rejected(error) => Err(ApiError::rejected(SOURCE, &error)),
        Lookup::BackendUnavailable(error) => Err(ApiError::backend_unavailable(SOURCE, &error)),
    }
}

fn normalize(
    query: Result<Query<FilmListRequest>, QueryRejection>,
) -> Result<QueryParameters, ApiError> {
    let Query(request) = query
        .map_err(|err| ApiError::bad_request("invalid query string", Some(err.body_text())))?;
    QueryParameters::normalize(&request).map_err(query_error_to_api)
}

fn query_error_to_api(error: QueryError) -> ApiError {
    let message = match &error {
        QueryError::Domain(_) => "invalid sort",
        QueryError::InvalidGenre(_) => "invalid genre",
        QueryError::Pagination(_) => "invalid cursor",
        QueryError::BeyondResultWindow { .. } => "page out of range",
    };
    ApiError::bad_request(message, Some(error.to_string()))
}
