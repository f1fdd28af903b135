//! Template and canvas contracts.
//!
//! A template produces the inner content for a route; a canvas produces the
//! page shell that wraps it. Both report a verdict alongside their output,
//! and anything other than an accept is a contract violation.

use axum::http::Method;
use std::collections::HashMap;
use std::fmt;

/// Status code a rejecting template uses to ask for authentication.
pub const FORBIDDEN_CODE: i64 = 403;

/// Non-accept value returned by a template or canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentinel {
    /// The current visitor may not see this page.
    Forbidden,
    /// A numeric reject code.
    Code(i64),
    /// Any other returned value, kept for diagnostics.
    Message(String),
    /// Nothing was returned.
    Missing,
}

impl Sentinel {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Sentinel::Forbidden | Sentinel::Code(FORBIDDEN_CODE))
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentinel::Forbidden => write!(f, "forbidden"),
            Sentinel::Code(code) => write!(f, "code {code}"),
            Sentinel::Message(msg) => write!(f, "`{msg}`"),
            Sentinel::Missing => write!(f, "nothing"),
        }
    }
}

impl serde::Serialize for Sentinel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Sentinel::Code(code) => serializer.serialize_i64(*code),
            Sentinel::Missing => serializer.serialize_none(),
            Sentinel::Message(msg) => serializer.serialize_str(msg),
            Sentinel::Forbidden => serializer.serialize_str("forbidden"),
        }
    }
}

/// Template verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(Sentinel),
}

/// Canvas verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasVerdict {
    Accept,
    /// Structured exception: ends the request without retrying.
    Raise { message: String, code: i64 },
    Reject(Sentinel),
}

/// Read-only view of the request handed to templates and canvases.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub params: &'a HashMap<String, String>,
    pub query: &'a HashMap<String, String>,
}

impl<'a> RenderContext<'a> {
    /// Look up a value by name; captured route params shadow query params.
    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.params
            .get(name)
            .or_else(|| self.query.get(name))
            .map(String::as_str)
    }
}

/// Inner content generator for a route.
pub trait Template: Send + Sync {
    fn render(&self, ctx: &RenderContext<'_>, out: &mut String) -> Verdict;
}

/// Outer page shell.
pub trait Canvas: Send + Sync {
    fn open(&self, ctx: &RenderContext<'_>, out: &mut String) -> CanvasVerdict;
}

impl<F> Template for F
where
    F: Fn(&RenderContext<'_>, &mut String) -> Verdict + Send + Sync,
{
    fn render(&self, ctx: &RenderContext<'_>, out: &mut String) -> Verdict {
        self(ctx, out)
    }
}

impl<F> Canvas for F
where
    F: Fn(&RenderContext<'_>, &mut String) -> CanvasVerdict + Send + Sync,
{
    fn open(&self, ctx: &RenderContext<'_>, out: &mut String) -> CanvasVerdict {
        self(ctx, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_sentinels() {
        assert!(Sentinel::Forbidden.is_forbidden());
        assert!(Sentinel::Code(403).is_forbidden());
        assert!(!Sentinel::Code(404).is_forbidden());
        assert!(!Sentinel::Message("403".into()).is_forbidden());
    }

    #[test]
    fn test_params_shadow_query() {
        let mut params = HashMap::new();
        params.insert("id".to_string(), "7".to_string());
        let mut query = HashMap::new();
        query.insert("id".to_string(), "9".to_string());
        query.insert("page".to_string(), "2".to_string());

        let ctx = RenderContext {
            method: &Method::GET,
            path: "post/7",
            params: &params,
            query: &query,
        };
        assert_eq!(ctx.param("id"), Some("7"));
        assert_eq!(ctx.param("page"), Some("2"));
        assert_eq!(ctx.param("nope"), None);
    }

    #[test]
    fn test_sentinel_serializes_for_diagnostics() {
        assert_eq!(serde_json::to_string(&Sentinel::Code(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Sentinel::Missing).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&Sentinel::Forbidden).unwrap(),
            "\"forbidden\""
        );
    }
}
