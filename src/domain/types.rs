//! Shared domain enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Film fields the catalog can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Index relevance score; the default order when no sort is requested.
    Relevance,
    ImdbRating,
    Title,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Relevance => "relevance",
            SortField::ImdbRating => "imdb_rating",
            SortField::Title => "title",
        }
    }

    fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "imdb_rating" => Ok(SortField::ImdbRating),
            "title" => Ok(SortField::Title),
            "relevance" | "_score" => Ok(SortField::Relevance),
            other => Err(DomainError::validation(format!(
                "unsupported sort field `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Requested ordering of a film listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::relevance()
    }
}

impl SortOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn relevance() -> Self {
        Self::new(SortField::Relevance, SortDirection::Desc)
    }

    /// Parse `field`, `-field` or `field:asc|desc`, case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Ok(Self::relevance());
        }

        if let Some((field, direction)) = normalized.split_once(':') {
            let direction = match direction.trim() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => {
                    return Err(DomainError::validation(format!(
                        "unsupported sort direction `{other}`"
                    )));
                }
            };
            return Ok(Self::new(SortField::parse(field.trim())?, direction));
        }

        if let Some(field) = normalized.strip_prefix('-') {
            return Ok(Self::new(SortField::parse(field)?, SortDirection::Desc));
        }

        let field = SortField::parse(&normalized)?;
        let direction = match field {
            SortField::Relevance => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        Ok(Self::new(field, direction))
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.field.as_str(), self.direction.as_str())
    }
}
