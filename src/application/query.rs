//! Normalization of film listing requests.
//!
//! Every request is reduced to a [`QueryParameters`] value before it reaches
//! the cache or the index. Two requests that mean the same thing normalize to
//! equal values, which in turn compose to the same cache key.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{PaginationError, SearchCursor};
use crate::domain::error::DomainError;
use crate::domain::types::SortOrder;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;
/// Deepest offset the index serves for numbered pages (`index.max_result_window`).
pub const MAX_RESULT_WINDOW: u64 = 10_000;

/// Raw listing request as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilmListRequest {
    pub page_number: Option<u32>,
    #[serde(alias = "size")]
    pub page_size: Option<u32>,
    pub sort: Option<String>,
    #[serde(alias = "genre")]
    pub genre_uuid: Option<String>,
    pub query: Option<String>,
    pub cursor: Option<String>,
}

/// Which slice of the ordered result set is requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Page {
    /// 1-based page number, served by offset.
    Number(u32),
    /// Page following the hit a continuation token points at.
    After(SearchCursor),
}

/// Normalized listing query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParameters {
    page: Page,
    page_size: u32,
    sort: SortOrder,
    genre: Option<Uuid>,
    title_search: Option<String>,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error("invalid genre identifier `{0}`")]
    InvalidGenre(String),
    #[error("page {page_number} of size {page_size} lies beyond the result window; use the cursor")]
    BeyondResultWindow { page_number: u32, page_size: u32 },
}

impl QueryParameters {
    pub fn normalize(request: &FilmListRequest) -> Result<Self, QueryError> {
        let page_size = request
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let sort = match request.sort.as_deref() {
            Some(raw) => SortOrder::parse(raw)?,
            None => SortOrder::relevance(),
        };

        let genre = match request.genre_uuid.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(
                Uuid::parse_str(raw).map_err(|_| QueryError::InvalidGenre(raw.to_string()))?,
            ),
            _ => None,
        };

        let title_search = request.query.as_deref().and_then(normalize_search_text);

        let page = match request.cursor.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let cursor = SearchCursor::decode(raw)?;
                cursor.ensure_fits(sort.field)?;
                Page::After(cursor)
            }
            _ => {
                let page_number = request.page_number.unwrap_or(1).max(1);
                let window_end = u64::from(page_number) * u64::from(page_size);
                if window_end > MAX_RESULT_WINDOW {
                    return Err(QueryError::BeyondResultWindow {
                        page_number,
                        page_size,
                    });
                }
                Page::Number(page_number)
            }
        };

        Ok(Self {
            page,
            page_size,
            sort,
            genre,
            title_search,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn genre(&self) -> Option<Uuid> {
        self.genre
    }

    pub fn title_search(&self) -> Option<&str> {
        self.title_search.as_deref()
    }

    /// Hits to skip for numbered pages; cursor pages start after the cursor.
    pub fn offset(&self) -> u64 {
        match &self.page {
            Page::Number(number) => u64::from(number - 1) * u64::from(self.page_size),
            Page::After(_) => 0,
        }
    }

    pub fn cursor(&self) -> Option<&SearchCursor> {
        match &self.page {
            Page::After(cursor) => Some(cursor),
            Page::Number(_) => None,
        }
    }
}

/// Trim, collapse inner whitespace and lowercase; empty text means no search.
fn normalize_search_text(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then(|| collapsed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::types::{SortDirection, SortField};

    fn request() -> FilmListRequest {
        FilmListRequest::default()
    }

    #[test]
    fn defaults_apply_when_request_is_empty() {
        let params = QueryParameters::normalize(&request()).expect("valid");
        assert_eq!(params.page(), &Page::Number(1));
        assert_eq!(params.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.sort(), SortOrder::relevance());
        assert!(params.genre().is_none());
        assert!(params.title_search().is_none());
    }

    #[test]
    fn equivalent_requests_normalize_equal() {
        let genre = Uuid::new_v4();
        let a = FilmListRequest {
            page_number: Some(2),
            page_size: Some(10),
            sort: Some("-imdb_rating".to_string()),
            genre_uuid: Some(genre.to_string()),
            query: Some("  The   MATRIX ".to_string()),
            cursor: None,
        };
        let b = FilmListRequest {
            page_number: Some(2),
            page_size: Some(10),
            sort: Some("IMDB_RATING:desc".to_string()),
            genre_uuid: Some(genre.to_string().to_uppercase()),
            query: Some("the matrix".to_string()),
            cursor: Some("   ".to_string()),
        };

        let left = QueryParameters::normalize(&a).expect("valid");
        let right = QueryParameters::normalize(&b).expect("valid");
        assert_eq!(left, right);
        assert_eq!(left.title_search(), Some("the matrix"));
        assert_eq!(
            left.sort(),
            SortOrder::new(SortField::ImdbRating, SortDirection::Desc)
        );
    }

    #[test]
    fn cursor_replaces_page_number() {
        let cursor = SearchCursor::from_sort_values(vec![json!(7.1), json!("id")]);
        let first = FilmListRequest {
            page_number: Some(3),
            cursor: Some(cursor.as_str().to_string()),
            ..request()
        };
        let second = FilmListRequest {
            page_number: Some(9),
            cursor: Some(cursor.as_str().to_string()),
            ..request()
        };

        let left = QueryParameters::normalize(&first).expect("valid");
        let right = QueryParameters::normalize(&second).expect("valid");
        assert_eq!(left, right);
        assert_eq!(left.cursor(), Some(&cursor));
        assert_eq!(left.offset(), 0);
    }

    #[test]
    fn page_size_is_clamped() {
        let large = FilmListRequest {
            page_size: Some(5_000),
            ..request()
        };
        let zero = FilmListRequest {
            page_size: Some(0),
            ..request()
        };
        assert_eq!(
            QueryParameters::normalize(&large).unwrap().page_size(),
            MAX_PAGE_SIZE
        );
        assert_eq!(QueryParameters::normalize(&zero).unwrap().page_size(), 1);
    }

    #[test]
    fn offset_follows_page_number() {
        let params = QueryParameters::normalize(&FilmListRequest {
            page_number: Some(3),
            page_size: Some(10),
            ..request()
        })
        .expect("valid");
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn empty_search_and_genre_are_absent() {
        let params = QueryParameters::normalize(&FilmListRequest {
            query: Some("   ".to_string()),
            genre_uuid: Some(String::new()),
            ..request()
        })
        .expect("valid");
        assert!(params.title_search().is_none());
        assert!(params.genre().is_none());
    }

    #[test]
    fn rejects_invalid_inputs() {
        let bad_genre = FilmListRequest {
            genre_uuid: Some("action".to_string()),
            ..request()
        };
        assert!(matches!(
            QueryParameters::normalize(&bad_genre),
            Err(QueryError::InvalidGenre(_))
        ));

        let bad_sort = FilmListRequest {
            sort: Some("budget".to_string()),
            ..request()
        };
        assert!(matches!(
            QueryParameters::normalize(&bad_sort),
            Err(QueryError::Domain(_))
        ));

        let bad_cursor = FilmListRequest {
            cursor: Some("%%%".to_string()),
            ..request()
        };
        assert!(matches!(
            QueryParameters::normalize(&bad_cursor),
            Err(QueryError::Pagination(_))
        ));

        let title_cursor = SearchCursor::from_sort_values(vec![json!("alien"), json!("id")]);
        let mismatched = FilmListRequest {
            sort: Some("-imdb_rating".to_string()),
            cursor: Some(title_cursor.as_str().to_string()),
            ..request()
        };
        assert!(matches!(
            QueryParameters::normalize(&mismatched),
            Err(QueryError::Pagination(_))
        ));

        let too_deep = FilmListRequest {
            page_number: Some(500),
            page_size: Some(100),
            ..request()
        };
        assert!(matches!(
            QueryParameters::normalize(&too_deep),
            Err(QueryError::BeyondResultWindow { .. })
        ));
    }
}
