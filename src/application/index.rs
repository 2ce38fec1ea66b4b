//! Search index port.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::CursorPage;
use crate::application::query::QueryParameters;
use crate::domain::entities::FilmRecord;

/// Failure talking to the search index. No variant means "absent".
/// `Rejected` blames the request; every other variant means the source of
/// truth could not answer.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("search index rejected the query: {message}")]
    Rejected { message: String },
    #[error("search index unavailable: {message}")]
    Unavailable { message: String },
    #[error("search index timed out")]
    Timeout,
    #[error("search index returned an unreadable response: {message}")]
    Malformed { message: String },
    #[error("search index client is closed")]
    Closed,
}

impl IndexError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Read access to the film index. Implementations must be safe for
/// concurrent use; this layer adds no locking of its own.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FilmRecord>, IndexError>;

    /// Run a filtered, sorted, paginated query. The page carries the
    /// continuation token for the following page, if any.
    async fn search(&self, params: &QueryParameters) -> Result<CursorPage<FilmRecord>, IndexError>;

    async fn ping(&self) -> Result<(), IndexError>;

    async fn close(&self) -> Result<(), IndexError>;
}
