//! Cursor pagination helpers.
//!
//! Continuation tokens are opaque to clients: the URL-safe base64 of the JSON
//! array of sort values of the last hit of a page (the `search_after` values).

use std::hash::{Hash, Hasher};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::types::SortField;

/// Decoded continuation token.
///
/// Equality and hashing follow the token text so that a token is always
/// round-tripped verbatim.
#[derive(Debug, Clone)]
pub struct SearchCursor {
    encoded: String,
    values: Vec<Value>,
}

impl SearchCursor {
    /// Build a cursor from the sort values of the last hit on a page.
    pub fn from_sort_values(values: Vec<Value>) -> Self {
        let serialized = Value::Array(values.clone()).to_string();
        Self {
            encoded: URL_SAFE_NO_PAD.encode(serialized),
            values,
        }
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let values: Vec<Value> = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        if values.is_empty() {
            return Err(PaginationError::InvalidCursor(
                "cursor carries no sort values".to_string(),
            ));
        }
        Ok(Self {
            encoded: cursor.to_string(),
            values,
        })
    }

    /// A cursor only continues a listing sorted the way it was issued: the
    /// primary sort value followed by the `id` tie-breaker.
    pub fn ensure_fits(&self, field: SortField) -> Result<(), PaginationError> {
        let [primary, id] = self.values.as_slice() else {
            return Err(PaginationError::InvalidCursor(format!(
                "expected 2 sort values, found {}",
                self.values.len()
            )));
        };
        let primary_fits = match field {
            SortField::Relevance | SortField::ImdbRating => primary.is_number(),
            SortField::Title => primary.is_string(),
        };
        if !primary_fits {
            return Err(PaginationError::InvalidCursor(format!(
                "cursor was not issued for a `{}` sort",
                field.as_str()
            )));
        }
        if !id.is_string() {
            return Err(PaginationError::InvalidCursor(
                "cursor tie-breaker must be an id".to_string(),
            ));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl PartialEq for SearchCursor {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for SearchCursor {}

impl Hash for SearchCursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

/// Cursor-aware page result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }
}

/// Identifier-only projection of a page, as kept in the query-result cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorResult {
    pub ids: Vec<Uuid>,
    pub next_cursor: Option<String>,
}

impl CursorResult {
    pub fn project<T>(page: &CursorPage<T>, id_of: impl Fn(&T) -> Uuid) -> Self {
        Self {
            ids: page.items.iter().map(id_of).collect(),
            next_cursor: page.next_cursor.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn cursor_is_round_tripped_verbatim() {
        let cursor = SearchCursor::from_sort_values(vec![json!(8.5), json!("a-film-id")]);
        let decoded = SearchCursor::decode(cursor.as_str()).expect("decoded cursor");

        assert_eq!(decoded.as_str(), cursor.as_str());
        assert_eq!(decoded.values(), &[json!(8.5), json!("a-film-id")]);
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn rejects_garbage_cursor() {
        assert!(SearchCursor::decode("not base64 !!").is_err());

        let not_an_array = URL_SAFE_NO_PAD.encode(br#"{"after": 1}"#);
        assert!(SearchCursor::decode(&not_an_array).is_err());

        let empty = URL_SAFE_NO_PAD.encode(b"[]");
        assert!(SearchCursor::decode(&empty).is_err());
    }

    #[test]
    fn cursor_must_match_the_sort_it_continues() {
        let rated = SearchCursor::from_sort_values(vec![json!(8.1), json!("id")]);
        assert!(rated.ensure_fits(SortField::ImdbRating).is_ok());
        assert!(rated.ensure_fits(SortField::Relevance).is_ok());
        assert!(rated.ensure_fits(SortField::Title).is_err());

        let titled = SearchCursor::from_sort_values(vec![json!("solaris"), json!("id")]);
        assert!(titled.ensure_fits(SortField::Title).is_ok());
        assert!(titled.ensure_fits(SortField::ImdbRating).is_err());

        let short = SearchCursor::from_sort_values(vec![json!(8.1)]);
        let long = SearchCursor::from_sort_values(vec![json!(8.1), json!("id"), json!(3)]);
        let numeric_id = SearchCursor::from_sort_values(vec![json!(8.1), json!(42)]);
        for cursor in [short, long, numeric_id] {
            assert!(matches!(
                cursor.ensure_fits(SortField::ImdbRating),
                Err(PaginationError::InvalidCursor(_))
            ));
        }
    }

    #[test]
    fn projection_keeps_order_and_cursor() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let page = CursorPage::new(vec![first, second], Some("next".to_string()));

        let projected = CursorResult::project(&page, |id| *id);
        assert_eq!(projected.ids, vec![first, second]);
        assert_eq!(projected.next_cursor.as_deref(), Some("next"));
    }
}
