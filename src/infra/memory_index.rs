//! In-process film index.
//!
//! Mirrors the Elasticsearch adapter's query semantics closely enough for
//! tests and local development: fuzzy title matching with `AUTO` edit
//! distances, nested genre filter, sort with an `id` tie-breaker, offset and
//! `search_after` pagination.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::{Value, json};
use strsim::osa_distance;
use uuid::Uuid;

use crate::application::index::{IndexError, SearchIndex};
use crate::application::pagination::{CursorPage, SearchCursor};
use crate::application::query::{Page, QueryParameters};
use crate::cache::lock::{read_or_recover, write_or_recover};
use crate::domain::entities::FilmRecord;
use crate::domain::types::{SortDirection, SortField};

const SOURCE: &str = "infra::memory_index";
const EXACT_TOKEN_SCORE: f64 = 1.0;
const FUZZY_TOKEN_SCORE: f64 = 0.5;

#[derive(Debug, Default)]
pub struct MemoryIndex {
    films: RwLock<HashMap<Uuid, FilmRecord>>,
    closed: AtomicBool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_films(films: impl IntoIterator<Item = FilmRecord>) -> Self {
        let index = Self::new();
        for film in films {
            index.insert(film);
        }
        index
    }

    pub fn insert(&self, film: FilmRecord) {
        self.write().insert(film.id, film);
    }

    pub fn remove(&self, id: Uuid) -> Option<FilmRecord> {
        self.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, FilmRecord>> {
        read_or_recover(&self.films, SOURCE, "read")
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, FilmRecord>> {
        write_or_recover(&self.films, SOURCE, "write")
    }

    fn ensure_open(&self) -> Result<(), IndexError> {
        if self.closed.load(AtomicOrdering::Acquire) {
            return Err(IndexError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FilmRecord>, IndexError> {
        self.ensure_open()?;
        Ok(self.read().get(&id).cloned())
    }

    async fn search(&self, params: &QueryParameters) -> Result<CursorPage<FilmRecord>, IndexError> {
        self.ensure_open()?;
        let sort = params.sort();

        let mut hits: Vec<Hit> = self
            .read()
            .values()
            .filter(|film| params.genre().is_none_or(|genre| film.has_genre(genre)))
            .filter_map(|film| {
                let score = match params.title_search() {
                    Some(text) => title_score(text, &film.title)?,
                    None => EXACT_TOKEN_SCORE,
                };
                Some(Hit {
                    key: SortKey::of(film, score, sort.field),
                    film: film.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| a.key.compare(&b.key, sort.direction));

        let start = match params.page() {
            Page::Number(_) => usize::try_from(params.offset()).unwrap_or(usize::MAX),
            Page::After(cursor) => {
                let after = SortKey::from_cursor(cursor, sort.field)?;
                hits.partition_point(|hit| {
                    hit.key.compare(&after, sort.direction) != Ordering::Greater
                })
            }
        };
        let page_size = usize::try_from(params.page_size()).unwrap_or(usize::MAX);

        let page: Vec<Hit> = hits.into_iter().skip(start).take(page_size).collect();
        let next_cursor = match page.last() {
            Some(last) if page.len() == page_size => Some(
                SearchCursor::from_sort_values(last.key.sort_values())
                    .as_str()
                    .to_string(),
            ),
            _ => None,
        };

        Ok(CursorPage::new(
            page.into_iter().map(|hit| hit.film).collect(),
            next_cursor,
        ))
    }

    async fn ping(&self) -> Result<(), IndexError> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<(), IndexError> {
        self.closed.store(true, AtomicOrdering::Release);
        Ok(())
    }
}

struct Hit {
    key: SortKey,
    film: FilmRecord,
}

#[derive(Debug, Clone, PartialEq)]
enum Primary {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone)]
struct SortKey {
    primary: Primary,
    id: String,
}

impl SortKey {
    fn of(film: &FilmRecord, score: f64, field: SortField) -> Self {
        let primary = match field {
            SortField::Relevance => Primary::Number(score),
            SortField::ImdbRating => Primary::Number(film.imdb_rating),
            SortField::Title => Primary::Text(film.title.clone()),
        };
        Self {
            primary,
            id: film.id.hyphenated().to_string(),
        }
    }

    fn from_cursor(cursor: &SearchCursor, field: SortField) -> Result<Self, IndexError> {
        let [primary, id] = cursor.values() else {
            return Err(IndexError::rejected("cursor must carry two sort values"));
        };
        let primary = match field {
            SortField::Relevance | SortField::ImdbRating => primary
                .as_f64()
                .map(Primary::Number)
                .ok_or_else(|| IndexError::rejected("numeric sort value expected"))?,
            SortField::Title => primary
                .as_str()
                .map(|text| Primary::Text(text.to_string()))
                .ok_or_else(|| IndexError::rejected("text sort value expected"))?,
        };
        let id = id
            .as_str()
            .ok_or_else(|| IndexError::rejected("id sort value expected"))?
            .to_string();
        Ok(Self { primary, id })
    }

    fn sort_values(&self) -> Vec<Value> {
        let primary = match &self.primary {
            Primary::Number(value) => json!(value),
            Primary::Text(value) => json!(value),
        };
        vec![primary, json!(self.id)]
    }

    fn compare(&self, other: &Self, direction: SortDirection) -> Ordering {
        let primary = match (&self.primary, &other.primary) {
            (Primary::Number(a), Primary::Number(b)) => a.total_cmp(b),
            (Primary::Text(a), Primary::Text(b)) => a.cmp(b),
            (Primary::Number(_), Primary::Text(_)) => Ordering::Less,
            (Primary::Text(_), Primary::Number(_)) => Ordering::Greater,
        };
        let primary = match direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| self.id.cmp(&other.id))
    }
}

/// Edit distance Elasticsearch allows for a term under `fuzziness: AUTO`.
fn auto_fuzziness(term: &str) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// Score a title against the search text, `None` when no term matches.
fn title_score(search: &str, title: &str) -> Option<f64> {
    let title_tokens: Vec<String> = tokens(title).collect();
    let mut score = 0.0;
    let mut matched = false;

    for term in tokens(search) {
        let allowed = auto_fuzziness(&term);
        let best = title_tokens
            .iter()
            .map(|candidate| osa_distance(&term, candidate))
            .filter(|distance| *distance <= allowed)
            .min();
        match best {
            Some(0) => {
                score += EXACT_TOKEN_SCORE;
                matched = true;
            }
            Some(_) => {
                score += FUZZY_TOKEN_SCORE;
                matched = true;
            }
            None => {}
        }
    }

    matched.then_some(score)
}
