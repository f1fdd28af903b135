//! Dispatch failures.
//!
//! # Taxonomy
//! - Not found: route, canvas or template missing
//! - Contract violation: a canvas or template returned something other than accept
//! - Configuration: no canvas selected before rendering
//! - Unknown: anything else (I/O while reading a resource)
//!
//! Only [`DispatchError::TemplateReturnInvalid`] is retried by the dispatcher;
//! every other variant ends the request.

use std::fmt;

use crate::render::Sentinel;

/// Numeric codes surfaced in error pages and diagnostics.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    RouteNotFound = 1,
    MethodNotFound = 2,
    CanvasNotFound = 3,
    TemplateNotFound = 4,
    CanvasReturnInvalid = 5,
    TemplateReturnInvalid = 6,
    RoutesExhausted = 7,
    CanvasNotSet = 8,
    Unknown = 9,
}

impl ErrorCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// A failure while resolving or rendering a request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no route matches `{path}`")]
    RouteNotFound { path: String },

    #[error("route `{route}` has no binding accepting {method}")]
    MethodNotFound { route: String, method: String },

    #[error("canvas `{0}` not found")]
    CanvasNotFound(String),

    #[error("template `{0}` not found")]
    TemplateNotFound(String),

    #[error("canvas `{name}` returned {returned}")]
    CanvasReturnInvalid { name: String, returned: Sentinel },

    #[error("canvas `{name}` raised `{message}` ({code})")]
    CanvasRaised {
        name: String,
        message: String,
        code: i64,
    },

    #[error("template `{name}` returned {returned}")]
    TemplateReturnInvalid { name: String, returned: Sentinel },

    #[error("every route matching `{path}` was exhausted after {attempts} attempts")]
    RoutesExhausted { path: String, attempts: usize },

    #[error("no canvas was selected for this request")]
    CanvasNotSet,

    #[error("failed to read `{resource}`: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    /// The numeric code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            DispatchError::RouteNotFound { .. } => ErrorCode::RouteNotFound,
            DispatchError::MethodNotFound { .. } => ErrorCode::MethodNotFound,
            DispatchError::CanvasNotFound(_) => ErrorCode::CanvasNotFound,
            DispatchError::TemplateNotFound(_) => ErrorCode::TemplateNotFound,
            DispatchError::CanvasReturnInvalid { .. } => ErrorCode::CanvasReturnInvalid,
            DispatchError::TemplateReturnInvalid { .. } => ErrorCode::TemplateReturnInvalid,
            DispatchError::RoutesExhausted { .. } => ErrorCode::RoutesExhausted,
            DispatchError::CanvasNotSet => ErrorCode::CanvasNotSet,
            DispatchError::CanvasRaised { .. } | DispatchError::Io { .. } => ErrorCode::Unknown,
        }
    }

    /// Whether the dispatcher may discard the attempt and try another binding.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::TemplateReturnInvalid { .. })
    }

    /// Whether the failure maps to 404 (subject to the static asset fallback).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DispatchError::RouteNotFound { .. } | DispatchError::RoutesExhausted { .. }
        )
    }
}
