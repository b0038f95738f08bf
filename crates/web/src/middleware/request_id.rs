//! Correlation IDs.
//!
//! A well-formed `x-request-id` from the reverse proxy is kept so a request
//! can be traced across hops. Anything else is replaced with a fresh UUID v4.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// The correlation ID for the current request, available as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Adopt the upstream header when it is usable, otherwise mint one.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|raw| is_acceptable(raw))
            .map_or_else(
                || Self(Uuid::new_v4().to_string()),
                |raw| Self(raw.to_string()),
            )
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Non-empty, bounded, and visible ASCII only, so it is safe in log lines.
fn is_acceptable(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw.bytes().all(|b| b.is_ascii_graphic())
}

/// Tag the span, the Sentry scope, and the response with the request's ID.
pub async fn propagate_request_id(mut request: Request, next: Next) -> Response {
    let id = RequestId::from_headers(request.headers());

    Span::current().record("request_id", id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", id.as_str()));

    let header = HeaderValue::from_str(id.as_str()).ok();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Some(header) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    response
}
