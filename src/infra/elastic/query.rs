//! Search request bodies for the film index.

use serde_json::{Map, Value, json};

use crate::application::query::QueryParameters;
use crate::domain::types::SortField;

/// Keyword sub-field used for exact title ordering.
const TITLE_SORT_FIELD: &str = "title.raw";

pub fn search_body(params: &QueryParameters) -> Value {
    let mut body = Map::new();
    body.insert("query".to_string(), query_clause(params));
    body.insert("sort".to_string(), sort_clause(params));
    body.insert("size".to_string(), json!(params.page_size()));
    body.insert("track_total_hits".to_string(), json!(false));

    match params.cursor() {
        Some(cursor) => {
            body.insert(
                "search_after".to_string(),
                Value::Array(cursor.values().to_vec()),
            );
        }
        None => {
            body.insert("from".to_string(), json!(params.offset()));
        }
    }

    Value::Object(body)
}

fn query_clause(params: &QueryParameters) -> Value {
    let mut must = Vec::new();

    if let Some(text) = params.title_search() {
        must.push(json!({
            "match": {
                "title": {
                    "query": text,
                    "fuzziness": "AUTO",
                }
            }
        }));
    }

    if let Some(genre) = params.genre() {
        must.push(json!({
            "nested": {
                "path": "genre",
                "query": {
                    "term": { "genre.id": genre.hyphenated().to_string() }
                }
            }
        }));
    }

    if must.is_empty() {
        json!({ "match_all": {} })
    } else {
        json!({ "bool": { "must": must } })
    }
}

/// Chosen order plus an `id` tie-breaker, so every hit has a unique sort tuple
/// and `search_after` never skips or repeats a film.
fn sort_clause(params: &QueryParameters) -> Value {
    let sort = params.sort();
    let field = match sort.field {
        SortField::Relevance => "_score",
        SortField::ImdbRating => "imdb_rating",
        SortField::Title => TITLE_SORT_FIELD,
    };
    json!([
        { field: { "order": sort.direction.as_str() } },
        { "id": { "order": "asc" } },
    ])
}
