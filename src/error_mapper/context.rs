//! Diagnostic context attached to error responses.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::routing::dispatcher::{DispatchState, RequestContext, TrialRecord};
use crate::routing::error::DispatchError;

/// Everything known about a failed request, for logs and debug pages.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    pub code: u8,
    pub message: String,
    pub url: String,
    pub page_parts: Vec<String>,
    pub content_type: String,
    pub get: BTreeMap<String, String>,
    pub method: String,
    pub tried: Vec<TrialRecord>,
    pub canvas: Option<String>,
    pub template: Option<String>,
    pub request_id: Option<String>,
}

impl ErrorContext {
    pub fn new(error: &DispatchError, state: &DispatchState, request: &RequestContext) -> Self {
        let get: BTreeMap<String, String> = request
            .query
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut url = format!("/{}", request.path);
        if !get.is_empty() {
            let query: Vec<String> = get.iter().map(|(k, v)| format!("{k}={v}")).collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }

        Self {
            code: error.code().as_u8(),
            message: error.to_string(),
            url,
            page_parts: request
                .path
                .split('/')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            content_type: state.content_type.clone(),
            get,
            method: request.method.to_string(),
            tried: state.tried_attempts.clone(),
            canvas: state.canvas_name.clone(),
            template: state.template_name.clone(),
            request_id: request.request_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::dispatcher::DispatchDefaults;
    use axum::http::Method;
    use std::collections::HashMap;

    #[test]
    fn test_context_captures_request() {
        let mut query = HashMap::new();
        query.insert("b".to_string(), "2".to_string());
        query.insert("a".to_string(), "1".to_string());
        let request = RequestContext::new(Method::POST, "/shop/cart").with_query(query);
        let state = DispatchState::new(&DispatchDefaults::default());
        let error = DispatchError::RouteNotFound {
            path: request.path.clone(),
        };

        let ctx = ErrorContext::new(&error, &state, &request);
        assert_eq!(ctx.code, 1);
        assert_eq!(ctx.url, "/shop/cart?a=1&b=2");
        assert_eq!(ctx.page_parts, vec!["shop", "cart"]);
        assert_eq!(ctx.method, "POST");
        assert!(ctx.tried.is_empty());
    }
}
