//! Dispatcher core - the per-request dispatch hot path.

use crate::context::Context;
use crate::error::HandlerError;
use crate::ids::RequestId;
use crate::router::Router;
use http::Method;
use serde_json::{json, Value};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Maximum inline response headers before heap allocation.
/// Most responses carry well under 16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Header names are `Arc<str>` because the common ones (Content-Type,
/// Location, ...) repeat across responses and cloning them is an O(1)
/// refcount bump; values are per-response data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Transport-independent view of an incoming request, as consumed by
/// [`Dispatcher::dispatch`]. Built by the server layer from the raw HTTP
/// request; tests construct it directly.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub method: Method,
    /// Request path with the query string stripped.
    pub path: String,
    /// Parsed query string parameters.
    pub query_params: HashMap<String, String>,
    /// Incoming headers, keys lowercased.
    pub headers: HashMap<String, String>,
    /// Raw request body text, if any. JSON parsing happens during
    /// dispatch so malformed bodies can be rejected with a 400.
    pub body: Option<String>,
}

impl DispatchRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        DispatchRequest {
            method,
            path: path.into(),
            query_params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Attach a JSON body (sets the content type accordingly).
    #[must_use]
    pub fn with_json_body(mut self, body: impl Into<String>) -> Self {
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
        self.body = Some(body.into());
        self
    }

    /// Add an incoming header (name lowercased).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }
}

/// Final response produced by dispatch, ready for the transport layer.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderVec,
    /// Response body. `Value::String` is written as-is (plain text unless
    /// a Content-Type header says otherwise); other values are serialized
    /// as JSON; `Value::Null` means an empty body.
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with the Content-Type header set.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("Content-Type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Plain-text response with the Content-Type header set.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("Content-Type"), "text/plain".to_string()));
        Self {
            status,
            headers,
            body: Value::String(body.into()),
        }
    }

    /// Error response of the standard `{status, message}` JSON shape.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "status": status, "message": message }))
    }

    /// Generic 500 with no detail leakage: body carries only the status.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::json(500, json!({ "status": 500 }))
    }

    /// Get a header by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive on the name).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Value returned by a handler on success.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Serialized as JSON with `application/json` unless the handler
    /// already set a Content-Type header on the context.
    Json(Value),
    /// Written as `text/plain` unless a Content-Type was already set.
    Text(String),
    /// Redirect; relative locations are resolved against the forwarded
    /// proto/host/port/prefix headers of the request.
    Redirect { location: String, status: u16 },
    /// Explicit pre-built response - bypasses all default serialization
    /// and status logic.
    Raw(HandlerResponse),
}

impl Reply {
    #[must_use]
    pub fn json(body: Value) -> Self {
        Reply::Json(body)
    }

    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Reply::Text(body.into())
    }
}

impl From<Value> for Reply {
    fn from(v: Value) -> Self {
        Reply::Json(v)
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::Text(s)
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

impl From<HandlerResponse> for Reply {
    fn from(resp: HandlerResponse) -> Self {
        Reply::Raw(resp)
    }
}

/// Result type returned by handlers.
pub type HandlerResult = Result<Reply, HandlerError>;

/// Dispatcher owning the immutable route table and the shared backend
/// state handle.
///
/// Cheap to clone (both fields are `Arc`s); one instance per server worker
/// is fine since dispatch takes `&self` and mutates nothing shared.
pub struct Dispatcher<S = ()> {
    router: Arc<Router<S>>,
    state: Arc<S>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: Send + Sync + 'static> Dispatcher<S> {
    #[must_use]
    pub fn new(router: Router<S>, state: S) -> Self {
        Dispatcher {
            router: Arc::new(router),
            state: Arc::new(state),
        }
    }

    /// Build from already-shared parts (e.g. when the state handle is
    /// constructed once per process and reused).
    #[must_use]
    pub fn from_shared(router: Arc<Router<S>>, state: Arc<S>) -> Self {
        Dispatcher { router, state }
    }

    #[must_use]
    pub fn router(&self) -> &Router<S> {
        &self.router
    }

    /// Dispatch one request: the algorithm of the module docs, start to
    /// finish. Always produces a response; routing and validation failures
    /// are resolved here and never reach handler code.
    #[must_use]
    pub fn dispatch(&self, req: DispatchRequest) -> HandlerResponse {
        let request_id =
            RequestId::from_header_or_new(req.headers.get("x-request-id").map(String::as_str));
        let start = Instant::now();
        debug!(
            request_id = %request_id,
            method = %req.method,
            path = %req.path,
            "dispatch start"
        );

        let mut response = self.dispatch_inner(&request_id, req);
        response.set_header("X-Request-Id", request_id.to_string());

        info!(
            request_id = %request_id,
            status = response.status,
            latency_ms = start.elapsed().as_millis() as u64,
            "request completed"
        );
        response
    }

    fn dispatch_inner(&self, request_id: &RequestId, req: DispatchRequest) -> HandlerResponse {
        if !self.router.allows(&req.method) {
            let allowed = self
                .router
                .allowed_methods()
                .iter()
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            warn!(
                request_id = %request_id,
                method = %req.method,
                allowed = %allowed,
                "method not allowed"
            );
            let mut resp =
                HandlerResponse::text(405, format!("Method {} not allowed", req.method));
            resp.set_header("Allowed", allowed);
            return resp;
        }

        let Some(route_match) = self.router.match_route(&req.method, &req.path) else {
            return HandlerResponse::text(404, "Not Found");
        };
        let route = Arc::clone(&route_match.route);

        // Non-GET JSON bodies are parsed up front so schema validation and
        // malformed-body rejection both happen before the handler runs.
        let mut parsed_body: Option<Value> = None;
        if req.method != Method::GET && declares_json(&req.headers) {
            if let Some(raw) = req.body.as_deref().filter(|s| !s.trim().is_empty()) {
                match serde_json::from_str::<Value>(raw) {
                    Ok(value) => parsed_body = Some(value),
                    Err(err) => {
                        warn!(
                            request_id = %request_id,
                            error = %err,
                            "malformed JSON body"
                        );
                        return HandlerResponse::error(400, "Invalid JSON body");
                    }
                }
            }
        }

        if let (Some(validator), Some(body)) = (
            self.router.validator_for(&route.method, &route.path_pattern),
            &parsed_body,
        ) {
            if let Err(tree) = validator.validate(body) {
                warn!(
                    request_id = %request_id,
                    method = %req.method,
                    path = %req.path,
                    "request body failed schema validation"
                );
                return HandlerResponse::json(
                    400,
                    json!({
                        "status": 400,
                        "message": "Validation error",
                        "error": tree.into_value(),
                    }),
                );
            }
        }

        let mut ctx = Context::new(
            *request_id,
            req.method.clone(),
            req.path.clone(),
            route_match.path_params,
            req.query_params,
            req.headers,
            parsed_body.unwrap_or(Value::Null),
            Arc::clone(&self.state),
        );

        info!(
            request_id = %request_id,
            method = %req.method,
            path = %req.path,
            route_pattern = %route.path_pattern,
            "invoking handler"
        );

        let handler = Arc::clone(&route.handler);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(&mut ctx)));

        match result {
            Err(panic) => {
                error!(
                    request_id = %request_id,
                    route_pattern = %route.path_pattern,
                    panic_message = %format!("{panic:?}"),
                    "handler panicked"
                );
                HandlerResponse::internal_error()
            }
            Ok(Err(HandlerError::Http(err))) => {
                info!(
                    request_id = %request_id,
                    status = err.status(),
                    message = %err.message(),
                    "handler returned typed error"
                );
                HandlerResponse::json(
                    err.status(),
                    json!({ "message": err.message(), "status": err.status() }),
                )
            }
            Ok(Err(HandlerError::Internal(err))) => {
                error!(
                    request_id = %request_id,
                    route_pattern = %route.path_pattern,
                    error = %err,
                    "handler failed"
                );
                HandlerResponse::internal_error()
            }
            Ok(Ok(reply)) => finalize_reply(reply, ctx),
        }
    }
}

/// Turn a successful handler reply into the final response, honoring the
/// context's status override and accumulated headers.
fn finalize_reply<S>(reply: Reply, ctx: Context<S>) -> HandlerResponse {
    match reply {
        // Explicit responses bypass all defaults.
        Reply::Raw(resp) => resp,
        Reply::Redirect { location, status } => {
            let location = resolve_location(&location, &ctx.headers);
            let mut resp = HandlerResponse::new(status, ctx.response_headers, Value::Null);
            resp.set_header("Location", location);
            resp
        }
        Reply::Json(body) => {
            let status = ctx.status_override.unwrap_or(default_status(&ctx.method));
            let mut resp = HandlerResponse::new(status, ctx.response_headers, body);
            if resp.get_header("content-type").is_none() {
                resp.set_header("Content-Type", "application/json".to_string());
            }
            if status == 204 {
                resp.body = Value::Null;
            }
            resp
        }
        Reply::Text(body) => {
            let status = ctx.status_override.unwrap_or(default_status(&ctx.method));
            let mut resp =
                HandlerResponse::new(status, ctx.response_headers, Value::String(body));
            if resp.get_header("content-type").is_none() {
                resp.set_header("Content-Type", "text/plain".to_string());
            }
            if status == 204 {
                resp.body = Value::Null;
            }
            resp
        }
    }
}

/// Default success status by method.
fn default_status(method: &Method) -> u16 {
    match *method {
        Method::POST => 201,
        Method::DELETE => 204,
        _ => 200,
    }
}

fn declares_json(headers: &HashMap<String, String>) -> bool {
    headers
        .get("content-type")
        .map(|ct| ct.split(';').next().unwrap_or("").trim() == "application/json")
        .unwrap_or(false)
}

/// Resolve a redirect location. Relative locations (leading `/`) are
/// rebuilt as absolute URLs from the reverse proxy's forwarded headers;
/// absolute locations pass through unchanged.
///
/// The forwarded headers are required to be present and correct; their
/// absence produces a malformed URL rather than an error, matching the
/// hosting contract.
fn resolve_location(location: &str, headers: &HashMap<String, String>) -> String {
    match location.strip_prefix('/') {
        Some(rest) => {
            let proto = forwarded(headers, "x-forwarded-proto");
            let host = forwarded(headers, "x-forwarded-host");
            let port = forwarded(headers, "x-forwarded-port");
            let prefix = forwarded(headers, "x-forwarded-prefix");
            format!("{proto}://{host}:{port}{prefix}{rest}")
        }
        None => location.to_string(),
    }
}

fn forwarded<'a>(headers: &'a HashMap<String, String>, name: &str) -> &'a str {
    headers.get(name).map(String::as_str).unwrap_or_default()
}
