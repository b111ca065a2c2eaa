//! Per-request context handed to handlers.
//!
//! A [`Context`] is built fresh by the dispatcher for every matched request
//! and discarded once the response is produced - nothing in it outlives the
//! request. It bundles the parsed inputs (body, query, path params,
//! headers), the mutable output controls (outgoing headers and status
//! override), the redirect constructor, the error-response helpers, and the
//! opaque shared backend state.

use crate::dispatcher::{HandlerResponse, HeaderVec, Reply};
use crate::ids::RequestId;
use crate::router::ParamVec;
use http::Method;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// The per-request bundle passed to a handler.
///
/// `S` is the shared backend state attached at dispatcher construction
/// (e.g. a database client handle). It is opaque to this layer and assumed
/// to be thread-safe.
pub struct Context<S = ()> {
    /// Correlation id for this request.
    pub request_id: RequestId,
    /// HTTP method of the incoming request.
    pub method: Method,
    /// Request path (query string stripped).
    pub path: String,
    /// Named path-segment captures from the matched pattern.
    pub path_params: ParamVec,
    /// Flat string map parsed from the URL query string.
    pub query_params: HashMap<String, String>,
    /// Incoming headers, keys lowercased.
    pub headers: HashMap<String, String>,
    /// Parsed JSON body (validated if a schema is registered for the
    /// route), or `Value::Null` when absent.
    pub body: Value,
    state: Arc<S>,
    pub(crate) response_headers: HeaderVec,
    pub(crate) status_override: Option<u16>,
}

impl<S> Context<S> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        request_id: RequestId,
        method: Method,
        path: String,
        path_params: ParamVec,
        query_params: HashMap<String, String>,
        headers: HashMap<String, String>,
        body: Value,
        state: Arc<S>,
    ) -> Self {
        Context {
            request_id,
            method,
            path,
            path_params,
            query_params,
            headers,
            body,
            state,
            response_headers: HeaderVec::new(),
            status_override: None,
        }
    }

    /// The shared backend state, opaque to the routing layer.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics when the same name is captured at
    /// several path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Get an incoming header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Add or replace an outgoing response header. The last write before
    /// the response is constructed wins.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.response_headers
            .retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.response_headers.push((Arc::from(name), value.into()));
    }

    /// Override the response status code. Without an override the status
    /// defaults by method (GET/PUT/PATCH 200, POST 201, DELETE 204).
    pub fn status(&mut self, code: u16) {
        self.status_override = Some(code);
    }

    /// Produce a redirect reply with the default 301 status.
    ///
    /// Locations starting with `/` are resolved by the dispatcher against
    /// the `x-forwarded-proto`/`-host`/`-port`/`-prefix` request headers;
    /// absolute locations are used as-is.
    #[must_use]
    pub fn redirect(&self, location: impl Into<String>) -> Reply {
        Reply::Redirect {
            location: location.into(),
            status: 301,
        }
    }

    /// Produce a redirect reply with an explicit status code.
    #[must_use]
    pub fn redirect_with_status(&self, location: impl Into<String>, status: u16) -> Reply {
        Reply::Redirect {
            location: location.into(),
            status,
        }
    }

    /// Ready-to-send 400 response. `None` uses the default message.
    #[must_use]
    pub fn bad_request(&self, message: Option<&str>) -> Reply {
        error_reply(400, message.unwrap_or("Bad request"))
    }

    /// Ready-to-send 401 response. `None` uses the default message.
    #[must_use]
    pub fn unauthorized(&self, message: Option<&str>) -> Reply {
        error_reply(401, message.unwrap_or("Unauthorized"))
    }

    /// Ready-to-send 403 response. `None` uses the default message.
    #[must_use]
    pub fn forbidden(&self, message: Option<&str>) -> Reply {
        error_reply(403, message.unwrap_or("Forbidden"))
    }

    /// Ready-to-send 404 response. `None` uses the default message.
    #[must_use]
    pub fn not_found(&self, message: Option<&str>) -> Reply {
        error_reply(404, message.unwrap_or("Not found"))
    }

    /// Ready-to-send error response with an arbitrary status. Fields of an
    /// `additions` object are merged into the `{status, message}` body.
    #[must_use]
    pub fn custom(&self, status: u16, message: &str, additions: Value) -> Reply {
        let mut body = Map::new();
        body.insert("status".to_string(), json!(status));
        body.insert("message".to_string(), json!(message));
        if let Value::Object(extra) = additions {
            for (k, v) in extra {
                body.insert(k, v);
            }
        }
        Reply::Raw(HandlerResponse::json(status, Value::Object(body)))
    }
}

impl Context<()> {
    #[cfg(test)]
    pub(crate) fn for_tests(method: Method, path: &str) -> Self {
        Context::new(
            RequestId::new(),
            method,
            path.to_string(),
            ParamVec::new(),
            HashMap::new(),
            HashMap::new(),
            Value::Null,
            Arc::new(()),
        )
    }
}

fn error_reply(status: u16, message: &str) -> Reply {
    Reply::Raw(HandlerResponse::json(
        status,
        json!({ "status": status, "message": message }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut ctx = Context::for_tests(Method::GET, "/");
        ctx.headers
            .insert("content-type".to_string(), "application/json".to_string());
        assert_eq!(ctx.get_header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn set_header_last_write_wins() {
        let mut ctx = Context::for_tests(Method::GET, "/");
        ctx.set_header("X-Thing", "a");
        ctx.set_header("x-thing", "b");
        assert_eq!(ctx.response_headers.len(), 1);
        assert_eq!(ctx.response_headers[0].1, "b");
    }

    #[test]
    fn error_helpers_carry_nominal_codes() {
        let ctx = Context::for_tests(Method::GET, "/");
        for (reply, status, message) in [
            (ctx.bad_request(None), 400, "Bad request"),
            (ctx.unauthorized(None), 401, "Unauthorized"),
            (ctx.forbidden(None), 403, "Forbidden"),
            (ctx.not_found(None), 404, "Not found"),
        ] {
            match reply {
                Reply::Raw(resp) => {
                    assert_eq!(resp.status, status);
                    assert_eq!(resp.body["status"], json!(status));
                    assert_eq!(resp.body["message"], json!(message));
                    assert_eq!(resp.get_header("content-type"), Some("application/json"));
                }
                other => panic!("expected raw reply, got {other:?}"),
            }
        }
    }

    #[test]
    fn custom_merges_additions() {
        let ctx = Context::for_tests(Method::GET, "/");
        match ctx.custom(429, "slow down", json!({ "retry_after": 30 })) {
            Reply::Raw(resp) => {
                assert_eq!(resp.status, 429);
                assert_eq!(resp.body["retry_after"], json!(30));
                assert_eq!(resp.body["message"], json!("slow down"));
            }
            other => panic!("expected raw reply, got {other:?}"),
        }
    }

    #[test]
    fn redirect_defaults_to_301() {
        let ctx = Context::for_tests(Method::GET, "/");
        match ctx.redirect("/next") {
            Reply::Redirect { location, status } => {
                assert_eq!(location, "/next");
                assert_eq!(status, 301);
            }
            other => panic!("expected redirect, got {other:?}"),
        }
    }
}
