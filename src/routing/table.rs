//! Route table.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Keep a stack of bindings per route pattern
//! - Filter bindings by site scope at bind time
//!
//! # Design Decisions
//! - Registration order decides precedence, not specificity
//! - Re-binding a pattern pushes onto its stack and keeps its position
//! - Immutable once built; per-request retry state lives in the dispatcher

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::routing::dispatcher::Selection;
use crate::routing::methods::MethodMask;
use crate::routing::pattern::{CompiledPattern, PatternError};

/// Scope key that activates a binding for every site.
pub const ANY_SCOPE: &str = "*";

/// Callback run when a binding is selected.
pub type Handler = Arc<dyn Fn(&mut Selection<'_>) + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Selection<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A handler together with the methods it accepts.
#[derive(Clone)]
pub struct Binding {
    handler: Option<Handler>,
    methods: MethodMask,
}

impl Binding {
    pub fn new(handler: Option<Handler>, methods: MethodMask) -> Self {
        Self { handler, methods }
    }

    pub fn methods(&self) -> MethodMask {
        self.methods
    }

    /// Run the handler, if any, against the selection.
    pub fn invoke(&self, selection: &mut Selection<'_>) {
        if let Some(handler) = &self.handler {
            handler(selection);
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("methods", &self.methods)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// A compiled pattern and its binding stack (last element is the top).
#[derive(Debug, Clone)]
pub struct Route {
    pattern: CompiledPattern,
    bindings: Vec<Binding>,
}

impl Route {
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

/// Ordered collection of routes for one site configuration.
#[derive(Debug, Clone)]
pub struct RouteTable {
    base_path_key: String,
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    /// Create an empty table for the site selected by `base_path_key`.
    pub fn new(base_path_key: impl Into<String>) -> Self {
        Self {
            base_path_key: base_path_key.into(),
            routes: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn base_path_key(&self) -> &str {
        &self.base_path_key
    }

    /// Register a binding for `template`.
    ///
    /// Returns `Ok(false)` when `scope` does not select this table's base path
    /// key; the binding is dropped in that case. Conditions are only used the
    /// first time a template is seen.
    pub fn bind(
        &mut self,
        scope: &str,
        template: &str,
        handler: Option<Handler>,
        conditions: &HashMap<String, String>,
        methods: MethodMask,
    ) -> Result<bool, PatternError> {
        if !scope_selects(scope, &self.base_path_key) {
            tracing::debug!(scope, template, base_path_key = %self.base_path_key, "Binding skipped for inactive scope");
            return Ok(false);
        }

        let key = normalize(template);
        let binding = Binding::new(handler, methods);

        match self.index.get(key) {
            Some(&position) => self.routes[position].bindings.push(binding),
            None => {
                let pattern = CompiledPattern::compile(key, conditions)?;
                tracing::trace!(template = key, regex = pattern.as_regex(), "Route compiled");
                self.index.insert(key.to_string(), self.routes.len());
                self.routes.push(Route {
                    pattern,
                    bindings: vec![binding],
                });
            }
        }

        tracing::debug!(template = key, methods = %methods, "Route bound");
        Ok(true)
    }

    /// Bind a GET handler active for every site.
    pub fn get<F>(&mut self, template: &str, f: F) -> Result<bool, PatternError>
    where
        F: Fn(&mut Selection<'_>) + Send + Sync + 'static,
    {
        self.bind(ANY_SCOPE, template, Some(handler(f)), &HashMap::new(), MethodMask::GET)
    }

    /// Bind a POST handler active for every site.
    pub fn post<F>(&mut self, template: &str, f: F) -> Result<bool, PatternError>
    where
        F: Fn(&mut Selection<'_>) + Send + Sync + 'static,
    {
        self.bind(ANY_SCOPE, template, Some(handler(f)), &HashMap::new(), MethodMask::POST)
    }

    /// Bind a handler accepting `methods`, active for every site.
    pub fn route<F>(&mut self, template: &str, methods: MethodMask, f: F) -> Result<bool, PatternError>
    where
        F: Fn(&mut Selection<'_>) + Send + Sync + 'static,
    {
        self.bind(ANY_SCOPE, template, Some(handler(f)), &HashMap::new(), methods)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Total number of bindings across all routes.
    pub fn binding_count(&self) -> usize {
        self.routes.iter().map(|r| r.bindings.len()).sum()
    }
}

/// Whether a scope key (`*`, a single key, or `a|b|c`) selects `base_path_key`.
pub fn scope_selects(scope: &str, base_path_key: &str) -> bool {
    scope
        .split('|')
        .map(str::trim)
        .any(|key| key == ANY_SCOPE || key == base_path_key)
}

/// Strip the leading slash shared by templates and request paths.
pub fn normalize(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_selection() {
        assert!(scope_selects("*", "main"));
        assert!(scope_selects("main", "main"));
        assert!(scope_selects("admin|main", "main"));
        assert!(scope_selects("admin | main", "main"));
        assert!(!scope_selects("admin", "main"));
        assert!(!scope_selects("", "main"));
    }

    #[test]
    fn test_rebinding_pushes_onto_stack() {
        let mut table = RouteTable::new("main");
        table.post("/x", |_| {}).unwrap();
        table.get("x", |_| {}).unwrap();
        table.get("/y", |_| {}).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.binding_count(), 3);

        let x = &table.routes()[0];
        assert_eq!(x.pattern().template(), "x");
        let methods: Vec<_> = x.bindings().iter().map(Binding::methods).collect();
        assert_eq!(methods, vec![MethodMask::POST, MethodMask::GET]);
    }

    #[test]
    fn test_inactive_scope_is_dropped() {
        let mut table = RouteTable::new("main");
        let bound = table
            .bind("admin", "dashboard", None, &HashMap::new(), MethodMask::GET)
            .unwrap();
        assert!(!bound);
        assert!(table.is_empty());
    }

    #[test]
    fn test_bad_template_is_an_error() {
        let mut table = RouteTable::new("main");
        assert!(table.get("broken(", |_| {}).is_err());
        assert!(table.is_empty());
    }
}
