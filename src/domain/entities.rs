//! Catalog records as stored in the search index.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A film document from the `movies` index.
///
/// Records are immutable from the point of view of this service: they are
/// created and removed by the external ingestion pipeline only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub imdb_rating: f64,
    #[serde(default)]
    pub genre: Vec<GenreInline>,
    #[serde(default)]
    pub actors: Option<Vec<PersonInline>>,
    #[serde(default)]
    pub writers: Option<Vec<PersonInline>>,
    #[serde(default)]
    pub directors: Option<Vec<PersonInline>>,
}

impl FilmRecord {
    pub fn has_genre(&self, genre: Uuid) -> bool {
        self.genre.iter().any(|inline| inline.id == genre)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreInline {
    pub id: Uuid,
    pub name: String,
}

/// Person reference embedded in a film document.
///
/// Index documents carry the display name under `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInline {
    pub id: Uuid,
    #[serde(rename = "name", alias = "full_name")]
    pub full_name: String,
}
