//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Extract the dispatch-relevant parts of a request (method, path, query)
//! - Percent-decode the path once, before it reaches the route table
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept, not replaced
//! - Paths that do not decode to UTF-8 are refused at the edge

use axum::http::{HeaderMap, HeaderName, Method, Request, Uri};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::routing::dispatcher::RequestContext;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Makes a fresh UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// Request ID carried in the headers, if any.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

/// Error type for request extraction.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("path `{0}` does not decode to UTF-8")]
    InvalidPath(String),
}

/// Percent-decode a request path.
pub fn decode_path(raw: &str) -> Result<String, RequestError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|path| path.into_owned())
        .map_err(|_| RequestError::InvalidPath(raw.to_string()))
}

/// Build the dispatcher's view of a request.
pub fn request_context(
    method: Method,
    uri: &Uri,
    query: HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<RequestContext, RequestError> {
    let path = decode_path(uri.path())?;
    let context = RequestContext::new(method, &path).with_query(query);
    Ok(match request_id(headers) {
        Some(id) => context.with_request_id(id),
        None => context,
    })
}
