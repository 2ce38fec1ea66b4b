use thiserror::Error;

use crate::application::index::IndexError;
use crate::cache::StoreError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("search index startup failed: {0}")]
    Index(#[from] IndexError),
    #[error("cache store startup failed: {0}")]
    CacheStore(#[from] StoreError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
