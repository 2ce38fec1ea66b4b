//! Cache key composition.
//!
//! Keys are plain strings of `:`-separated segments:
//!
//! ```text
//! {prefix}v1:entity:film:{uuid}
//! {prefix}v1:query:films:size=10:sort=imdb_rating.desc:genre={uuid}:q=the%20matrix:page=1
//! ```
//!
//! Free-text fields are percent-encoded, so `:` and `=` only ever appear as
//! delimiters. Absent optional fields render empty; normalized present values
//! are never empty. Numbered pages render as digits and cursor pages as
//! `after.{encoded cursor}`. Together this makes the mapping injective: two
//! keys are equal only when the inputs are semantically equal.

use uuid::Uuid;

use crate::application::query::{Page, QueryParameters};

/// Version of the cached payload shapes. Bump whenever `FilmRecord` or
/// `CursorResult` change in a way older readers cannot decode.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Anything that can be turned into a cache key.
pub trait CacheSubject {
    fn write_key(&self, out: &mut String);
}

impl CacheSubject for Uuid {
    fn write_key(&self, out: &mut String) {
        out.push_str("entity:film:");
        out.push_str(&self.hyphenated().to_string());
    }
}

impl CacheSubject for QueryParameters {
    fn write_key(&self, out: &mut String) {
        out.push_str("query:films");

        out.push_str(":size=");
        out.push_str(&self.page_size().to_string());

        out.push_str(":sort=");
        out.push_str(&self.sort().to_string());

        out.push_str(":genre=");
        if let Some(genre) = self.genre() {
            out.push_str(&genre.hyphenated().to_string());
        }

        out.push_str(":q=");
        if let Some(text) = self.title_search() {
            out.push_str(&urlencoding::encode(text));
        }

        out.push_str(":page=");
        match self.page() {
            Page::Number(number) => out.push_str(&number.to_string()),
            Page::After(cursor) => {
                out.push_str("after.");
                out.push_str(&urlencoding::encode(cursor.as_str()));
            }
        }
    }
}

/// Composes namespaced, version-tagged keys.
#[derive(Debug, Clone)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn compose<S: CacheSubject + ?Sized>(&self, subject: &S) -> String {
        let mut key = String::with_capacity(self.prefix.len() + 96);
        key.push_str(&self.prefix);
        key.push('v');
        key.push_str(&CACHE_SCHEMA_VERSION.to_string());
        key.push(':');
        subject.write_key(&mut key);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::query::FilmListRequest;

    fn params(request: FilmListRequest) -> QueryParameters {
        QueryParameters::normalize(&request).expect("valid request")
    }

    #[test]
    fn entity_key_layout() {
        let keys = CacheKeys::new("cinema:");
        let id = Uuid::parse_str("72ac03e4-cd5d-40af-b190-f1cb2f19f5a2").expect("uuid");
        assert_eq!(
            keys.compose(&id),
            "cinema:v1:entity:film:72ac03e4-cd5d-40af-b190-f1cb2f19f5a2"
        );
    }

    #[test]
    fn query_key_layout() {
        let keys = CacheKeys::new("cinema:");
        let key = keys.compose(&params(FilmListRequest {
            page_number: Some(1),
            page_size: Some(10),
            sort: Some("imdb_rating:desc".to_string()),
            genre_uuid: Some("61e08d13-e169-4a77-b286-458e66f1fb27".to_string()),
            query: Some("The Matrix".to_string()),
            cursor: None,
        }));
        assert_eq!(
            key,
            "cinema:v1:query:films:size=10:sort=imdb_rating.desc\
             :genre=61e08d13-e169-4a77-b286-458e66f1fb27:q=the%20matrix:page=1"
        );
    }

    #[test]
    fn separators_inside_search_text_are_escaped() {
        let keys = CacheKeys::new("");
        let sneaky = keys.compose(&params(FilmListRequest {
            query: Some("x:page=2".to_string()),
            ..Default::default()
        }));
        assert!(sneaky.ends_with(":q=x%3Apage%3D2:page=1"));
    }

    #[test]
    fn entity_and_query_keys_never_overlap() {
        let keys = CacheKeys::new("p:");
        let entity = keys.compose(&Uuid::nil());
        let query = keys.compose(&params(FilmListRequest::default()));
        assert!(entity.starts_with("p:v1:entity:"));
        assert!(query.starts_with("p:v1:query:"));
    }
}
