//! # edgekit
//!
//! **edgekit** is a small method/path request router and dispatcher for
//! coroutine-based edge services, built on the `may` runtime and
//! `may_minihttp`.
//!
//! ## Overview
//!
//! Routes are registered once at startup with builder calls (`get`, `post`,
//! `put`, `patch`, `delete`); path patterns may contain `:name` segments
//! whose captured values become handler-visible params. A single dispatcher
//! entry point matches each incoming request, runs optional JSON Schema
//! body validation, invokes the handler with a per-request [`Context`], and
//! normalizes the handler's reply into an HTTP response.
//!
//! ## Architecture
//!
//! - **[`router`]** - ordered route table, `:name` pattern compilation,
//!   exact-before-pattern matching, per-route validation schemas
//! - **[`dispatcher`]** - per-request dispatch: 405/404 routing failures,
//!   body parse + validation, handler invocation with panic recovery,
//!   reply normalization and typed-error mapping
//! - **[`context`]** - the per-request bundle handed to handlers: parsed
//!   inputs, outgoing headers, status override, redirect and error helpers
//! - **[`error`]** - typed HTTP error taxonomy (401/403/404/429/custom);
//!   anything untyped collapses to a detail-free 500
//! - **[`validator`]** - pluggable body validation behind the
//!   [`BodyValidator`] trait, with a JSON Schema implementation
//! - **[`server`]** - `may_minihttp` transport glue and server lifecycle
//! - **[`ids`]** - ULID request ids for log correlation
//! - **[`runtime_config`]** - environment-driven coroutine configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgekit::{Context, Dispatcher, Reply, Router};
//! use edgekit::server::{AppService, HttpServer};
//! use serde_json::json;
//!
//! let mut router: Router = Router::new();
//! router.get("/quests/:id", |ctx: &mut Context| {
//!     let id = ctx.get_path_param("id").unwrap_or("").to_string();
//!     Ok(Reply::json(json!({ "id": id })))
//! });
//!
//! let dispatcher = Dispatcher::new(router, ());
//! let server = HttpServer(AppService::new(dispatcher));
//! let handle = server.start("0.0.0.0:8080").expect("bind failed");
//! handle.join().expect("server crashed");
//! ```
//!
//! ## Request Flow
//!
//! 1. Method registered by no route → 405 with an `Allowed` header
//! 2. No path match → 404 plain-text `Not Found`
//! 3. Context built; default status by method (GET/PUT/PATCH 200, POST
//!    201, DELETE 204), overridable via [`Context::status`]
//! 4. Non-GET JSON bodies parsed; schema validation failures return a
//!    structured 400 before the handler runs
//! 5. Handler reply normalized: JSON, plain text, explicit response, or
//!    redirect (relative locations resolved against
//!    `x-forwarded-proto`/`-host`/`-port`/`-prefix`)
//! 6. Typed errors render with their carried status; everything else is a
//!    bare `{"status": 500}`
//!
//! ## Runtime Considerations
//!
//! edgekit uses the `may` coroutine runtime, not tokio. Route tables are
//! immutable after startup and every request gets a fresh [`Context`], so
//! the dispatcher is safe under the server's concurrent coroutines without
//! any locking.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod validator;

pub use context::Context;
pub use dispatcher::{DispatchRequest, Dispatcher, HandlerResponse, HandlerResult, Reply};
pub use error::{HandlerError, HttpError};
pub use router::{RouteMatch, Router};
pub use validator::{BodyValidator, ErrorTree, SchemaValidator};
