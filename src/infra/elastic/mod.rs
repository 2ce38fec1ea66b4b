//! Elasticsearch adapter for the film index.

mod query;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::index::{IndexError, SearchIndex};
use crate::application::pagination::{CursorPage, SearchCursor};
use crate::application::query::QueryParameters;
use crate::config::ElasticSettings;
use crate::domain::entities::FilmRecord;

pub use query::search_body;

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<FilmRecord>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: FilmRecord,
    #[serde(default)]
    sort: Vec<Value>,
}

/// Read-only client for one Elasticsearch index.
#[derive(Debug)]
pub struct ElasticIndex {
    client: RwLock<Option<Client>>,
    base: Url,
    index: String,
}

impl ElasticIndex {
    pub fn new(settings: &ElasticSettings) -> Result<Self, IndexError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("cinema-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport_error)?;

        let mut base = settings.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: RwLock::new(Some(client)),
            base,
            index: settings.index.clone(),
        })
    }

    async fn client(&self) -> Result<Client, IndexError> {
        self.client
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(IndexError::Closed)
    }

    fn url(&self, path: &str) -> Result<Url, IndexError> {
        self.base
            .join(path)
            .map_err(|err| IndexError::unavailable(format!("invalid index url: {err}")))
    }
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FilmRecord>, IndexError> {
        let client = self.client().await?;
        let url = self.url(&format!("{}/_doc/{}", self.index, id.hyphenated()))?;

        let response = client.get(url).send().await.map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(target = "cinema::infra::elastic", %id, "film not in index");
            return Ok(None);
        }
        let response = ensure_success(response)?;

        let body: GetResponse = response
            .json()
            .await
            .map_err(|err| IndexError::malformed(err.to_string()))?;
        Ok(body.source.filter(|_| body.found))
    }

    async fn search(&self, params: &QueryParameters) -> Result<CursorPage<FilmRecord>, IndexError> {
        let client = self.client().await?;
        let url = self.url(&format!("{}/_search", self.index))?;
        let body = search_body(params);

        let response = client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(search_failure(status));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|err| IndexError::malformed(err.to_string()))?;
        let hits = parsed.hits.hits;

        let page_size = usize::try_from(params.page_size()).unwrap_or(usize::MAX);
        let next_cursor = match hits.last() {
            Some(last) if hits.len() == page_size => {
                if last.sort.is_empty() {
                    return Err(IndexError::malformed("search hit carries no sort values"));
                }
                Some(
                    SearchCursor::from_sort_values(last.sort.clone())
                        .as_str()
                        .to_string(),
                )
            }
            _ => None,
        };

        let items = hits.into_iter().map(|hit| hit.source).collect();
        Ok(CursorPage::new(items, next_cursor))
    }

    async fn ping(&self) -> Result<(), IndexError> {
        let client = self.client().await?;
        let url = self.url(&self.index)?;
        let response = client.head(url).send().await.map_err(transport_error)?;
        ensure_success(response)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), IndexError> {
        if self.client.write().await.take().is_some() {
            info!(target = "cinema::infra::elastic", "search index client closed");
        }
        Ok(())
    }
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(IndexError::unavailable(format!(
            "index responded with status {status}"
        )))
    }
}

/// Elasticsearch answers a query it cannot run (bad `search_after`, unknown
/// sort field) with a 4xx. A missing index, a timeout or throttling still
/// mean the index cannot serve.
fn search_failure(status: StatusCode) -> IndexError {
    let refused = status.is_client_error()
        && !matches!(
            status,
            StatusCode::NOT_FOUND | StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
        );
    if refused {
        IndexError::rejected(format!("index refused the search with status {status}"))
    } else {
        IndexError::unavailable(format!("index responded with status {status}"))
    }
}

fn transport_error(error: reqwest::Error) -> IndexError {
    if error.is_timeout() {
        IndexError::Timeout
    } else {
        IndexError::unavailable(error.to_string())
    }
}
