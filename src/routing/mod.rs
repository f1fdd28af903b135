//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route binding (at startup):
//!     (scope, template, handler, conditions, methods)
//!     → table.rs (scope check, one route per template, bindings stacked)
//!     → pattern.rs (template compiled to an anchored regex)
//!
//! Incoming request (method, path):
//!     → dispatcher.rs (first matching route, newest live binding)
//!     → methods.rs (method mask check, fall back to older bindings)
//!     → handler runs, render pipeline produces the body
//!     → rejected? record trial, retire binding, match again
//!     → Dispatched or error.rs::DispatchError
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: first registered pattern that matches wins
//! - Backtracking state lives with the request, never in the table

pub mod dispatcher;
pub mod error;
pub mod methods;
pub mod pattern;
pub mod table;

pub use dispatcher::{
    DispatchDefaults, DispatchState, Dispatched, Dispatcher, RequestContext, Selection, TrialRecord,
};
pub use error::{DispatchError, ErrorCode};
pub use methods::MethodMask;
pub use pattern::{CompiledPattern, PatternError};
pub use table::{handler, Binding, Handler, Route, RouteTable, ANY_SCOPE};
