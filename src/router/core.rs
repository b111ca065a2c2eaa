//! Router core - route table, registration and matching.

use crate::context::Context;
use crate::dispatcher::HandlerResult;
use crate::validator::BodyValidator;
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path parameters before heap allocation.
/// Most REST paths have ≤4 named segments (e.g. `/quests/:id/steps/:step`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the dispatch hot path.
///
/// Param names are `Arc<str>` because they come from the static route table
/// and cloning them is an O(1) refcount bump; values are per-request data
/// captured from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Boxed handler stored in the route table.
///
/// Handlers receive the per-request [`Context`] and return a
/// [`crate::Reply`] or a [`crate::HandlerError`].
pub type HandlerFn<S> = Arc<dyn Fn(&mut Context<S>) -> HandlerResult + Send + Sync>;

/// A registered route entry: method, path pattern, compiled matcher and
/// the handler to invoke.
pub struct Route<S> {
    pub method: Method,
    /// The pattern as registered, e.g. `/quests/:id`.
    pub path_pattern: String,
    pub(crate) pattern: Regex,
    pub(crate) param_names: Vec<Arc<str>>,
    pub(crate) handler: HandlerFn<S>,
}

impl<S> std::fmt::Debug for Route<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path_pattern", &self.path_pattern)
            .finish()
    }
}

/// Result of successfully matching a request path to a route.
pub struct RouteMatch<S> {
    /// The matched route (`Arc` to avoid cloning the handler).
    pub route: Arc<Route<S>>,
    /// Named path-segment captures, in pattern order.
    pub path_params: ParamVec,
}

impl<S> RouteMatch<S> {
    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics when the same name appears at
    /// multiple path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

struct SchemaEntry {
    method: Method,
    path_pattern: String,
    validator: Arc<dyn BodyValidator>,
}

/// Router owning the ordered route table and the schema table.
///
/// Routes are registered once at startup and the router is read-only during
/// dispatch, so it is safe to share behind an `Arc` across concurrently
/// handled requests.
///
/// The type parameter `S` is the shared backend state handed to handlers
/// through [`Context::state`] - opaque to this layer.
pub struct Router<S = ()> {
    routes: Vec<Arc<Route<S>>>,
    schemas: Vec<SchemaEntry>,
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Router<S> {
    #[must_use]
    pub fn new() -> Self {
        Router {
            routes: Vec::new(),
            schemas: Vec::new(),
        }
    }

    /// Register a route for an arbitrary method.
    ///
    /// Registration is append-only: registering the same `(method, path)`
    /// pair again adds a shadowed entry that never matches. Registration
    /// order defines priority.
    pub fn route<H>(&mut self, method: Method, path: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context<S>) -> HandlerResult + Send + Sync + 'static,
    {
        let (pattern, param_names) = path_to_regex(path);
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.path_pattern == path)
        {
            warn!(
                method = %method,
                path = %path,
                "duplicate route registration - first registered entry keeps priority"
            );
        }
        info!(
            method = %method,
            path = %path,
            total_routes = self.routes.len() + 1,
            "route registered"
        );
        self.routes.push(Arc::new(Route {
            method,
            path_pattern: path.to_string(),
            pattern,
            param_names,
            handler: Arc::new(handler),
        }));
        self
    }

    pub fn get<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn put<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::PUT, path, handler)
    }

    pub fn patch<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::PATCH, path, handler)
    }

    pub fn delete<H>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::DELETE, path, handler)
    }

    /// Attach a body validation schema to a `(method, path)` pair.
    ///
    /// The first registered schema for a pair wins; registering another one
    /// for the same pair is a no-op.
    pub fn schema(
        &mut self,
        method: Method,
        path: &str,
        validator: Arc<dyn BodyValidator>,
    ) -> &mut Self {
        if self
            .schemas
            .iter()
            .any(|s| s.method == method && s.path_pattern == path)
        {
            warn!(
                method = %method,
                path = %path,
                "schema already registered for this route - keeping the first"
            );
            return self;
        }
        self.schemas.push(SchemaEntry {
            method,
            path_pattern: path.to_string(),
            validator,
        });
        self
    }

    /// The validator registered for a route's `(method, path pattern)`,
    /// if any.
    #[must_use]
    pub fn validator_for(&self, method: &Method, path_pattern: &str) -> Option<&Arc<dyn BodyValidator>> {
        self.schemas
            .iter()
            .find(|s| s.method == *method && s.path_pattern == path_pattern)
            .map(|s| &s.validator)
    }

    /// Whether any registered route uses this method.
    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        self.routes.iter().any(|r| r.method == *method)
    }

    /// Distinct registered methods, sorted alphabetically. Used to build
    /// the `Allowed` header of 405 responses.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if !methods.contains(&route.method) {
                methods.push(route.method.clone());
            }
        }
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Match an incoming request to a route.
    ///
    /// An exact string match between the request path and a registered
    /// literal path takes priority over any pattern match; otherwise the
    /// first registered route whose compiled pattern matches is selected.
    ///
    /// Returns `None` when no route matches (a 404 for the dispatcher).
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<S>> {
        debug!(method = %method, path = %path, "route match attempt");

        if let Some(route) = self
            .routes
            .iter()
            .find(|r| r.method == *method && r.path_pattern == path)
        {
            info!(
                method = %method,
                path = %path,
                route_pattern = %route.path_pattern,
                "route matched (exact)"
            );
            return Some(RouteMatch {
                route: Arc::clone(route),
                path_params: ParamVec::new(),
            });
        }

        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            if let Some(caps) = route.pattern.captures(path) {
                let mut path_params = ParamVec::new();
                for (i, name) in route.param_names.iter().enumerate() {
                    if let Some(m) = caps.get(i + 1) {
                        path_params.push((Arc::clone(name), m.as_str().to_string()));
                    }
                }
                info!(
                    method = %method,
                    path = %path,
                    route_pattern = %route.path_pattern,
                    path_params = ?path_params,
                    "route matched"
                );
                return Some(RouteMatch {
                    route: Arc::clone(route),
                    path_params,
                });
            }
        }

        warn!(method = %method, path = %path, "no route matched");
        None
    }

    /// Number of registered route entries (shadowed duplicates included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Print all registered routes to stdout. Useful for debugging.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for route in &self.routes {
            println!("[route] {} {}", route.method, route.path_pattern);
        }
    }
}

/// Convert a `:name` path pattern to a regex and the ordered list of
/// parameter names.
///
/// `/quests/:id` becomes `^/quests/([^/]+)$` with params `["id"]`. Literal
/// segments are regex-escaped.
pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<Arc<str>>) {
    if path == "/" {
        return (
            Regex::new(r"^/$").expect("failed to compile path regex"),
            Vec::new(),
        );
    }

    let mut pattern = String::with_capacity(path.len() + 5);
    pattern.push('^');
    let mut param_names: Vec<Arc<str>> = Vec::new();

    for segment in path.split('/') {
        if let Some(name) = segment.strip_prefix(':') {
            pattern.push_str("/([^/]+)");
            param_names.push(Arc::from(name));
        } else if !segment.is_empty() {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }

    pattern.push('$');
    let regex = Regex::new(&pattern).expect("failed to compile path regex");

    (regex, param_names)
}
