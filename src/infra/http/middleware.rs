use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Per-request identity, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    /// Reuse a caller-supplied id when it is a sane header value, else mint one.
    fn for_request(request: &Request<Body>) -> Self {
        let request_id = request
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.len() <= 128)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self { request_id }
    }
}

/// Tag the request with an id, run it inside a span and log the outcome.
///
/// Error responses are logged with the [`ErrorReport`] the handler attached;
/// the report itself never leaves the process.
pub async fn trace_requests(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::for_request(&request);
    request.extensions_mut().insert(ctx.clone());

    let span = info_span!(
        "request",
        request_id = %ctx.request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let query = request.uri().query().unwrap_or("").to_string();
    let started = Instant::now();

    let mut response = next.run(request).instrument(span.clone()).await;
    let elapsed_ms = started.elapsed().as_millis();
    let report = response.extensions_mut().remove::<ErrorReport>();

    span.in_scope(|| log_outcome(response.status(), &query, elapsed_ms, report));

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

fn log_outcome(status: StatusCode, query: &str, elapsed_ms: u128, report: Option<ErrorReport>) {
    if !(status.is_client_error() || status.is_server_error()) {
        debug!(
            target = "cinema::http::response",
            status = status.as_u16(),
            elapsed_ms,
            "request served"
        );
        return;
    }

    let (source, chain) = match report {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = chain.first().map(String::as_str).unwrap_or("no diagnostic available");

    if status.is_server_error() {
        error!(
            target = "cinema::http::response",
            status = status.as_u16(),
            query,
            elapsed_ms,
            source,
            detail,
            chain = ?chain,
            "request failed"
        );
    } else {
        warn!(
            target = "cinema::http::response",
            status = status.as_u16(),
            query,
            elapsed_ms,
            source,
            detail,
            "client request error"
        );
    }
}
