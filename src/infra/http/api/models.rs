use serde::Serialize;
use uuid::Uuid;

use crate::application::pagination::CursorPage;
use crate::application::query::{Page, QueryParameters};
use crate::domain::entities::{FilmRecord, GenreInline, PersonInline};

#[derive(Debug, Serialize)]
pub struct GenreOut {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub uuid: Uuid,
    pub name: String,
}

impl From<&GenreInline> for GenreOut {
    fn from(genre: &GenreInline) -> Self {
        Self {
            kind: "GenreInline",
            uuid: genre.id,
            name: genre.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PersonOut {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub uuid: Uuid,
    pub full_name: String,
}

impl PersonOut {
    fn list(people: &Option<Vec<PersonInline>>, kind: &'static str) -> Option<Vec<Self>> {
        people.as_ref().map(|people| {
            people
                .iter()
                .map(|person| Self {
                    kind,
                    uuid: person.id,
                    full_name: person.full_name.clone(),
                })
                .collect()
        })
    }
}

/// Full film card.
#[derive(Debug, Serialize)]
pub struct FilmLong {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub uuid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub imdb_rating: f64,
    pub genre: Vec<GenreOut>,
    pub actors: Option<Vec<PersonOut>>,
    pub writers: Option<Vec<PersonOut>>,
    pub directors: Option<Vec<PersonOut>>,
}

impl From<&FilmRecord> for FilmLong {
    fn from(film: &FilmRecord) -> Self {
        Self {
            kind: "FilmLong",
            uuid: film.id,
            title: film.title.clone(),
            description: film.description.clone(),
            imdb_rating: film.imdb_rating,
            genre: film.genre.iter().map(GenreOut::from).collect(),
            actors: PersonOut::list(&film.actors, "ActorInline"),
            writers: PersonOut::list(&film.writers, "WriterInline"),
            directors: PersonOut::list(&film.directors, "DirectorInline"),
        }
    }
}

/// Listing entry.
#[derive(Debug, Serialize)]
pub struct FilmShort {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub uuid: Uuid,
    pub title: String,
    pub imdb_rating: f64,
}

impl From<&FilmRecord> for FilmShort {
    fn from(film: &FilmRecord) -> Self {
        Self {
            kind: "FilmShort",
            uuid: film.id,
            title: film.title.clone(),
            imdb_rating: film.imdb_rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FilmListResponse {
    pub items: Vec<FilmShort>,
    pub pagination: PaginationOut,
}

impl FilmListResponse {
    pub fn new(page: &CursorPage<FilmRecord>, params: &QueryParameters) -> Self {
        let page_number = match params.page() {
            Page::Number(number) => Some(*number),
            Page::After(_) => None,
        };
        Self {
            items: page.items.iter().map(FilmShort::from).collect(),
            pagination: PaginationOut {
                page_number,
                page_size: params.page_size(),
                next_cursor: page.next_cursor.clone(),
            },
        }
    }
}
