//! # Router Module
//!
//! Ordered route table with builder-style registration and path matching.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Registering `(method, path pattern, handler)` entries via `get`,
//!   `post`, `put`, `patch` and `delete` builder calls
//! - Compiling `:name` path patterns into regexes at registration time
//! - Matching incoming `(method, path)` pairs to the first registered route,
//!   with exact literal paths taking priority over parameterized patterns
//! - Holding the per-route body validation schemas (first registration wins)
//!
//! ## Matching semantics
//!
//! The route list is append-only and matching walks it in registration
//! order. Registering the same `(method, path)` twice is allowed; the
//! second entry is shadowed and never matches. An exact string match
//! between the request path and a registered literal path always beats a
//! pattern match, regardless of registration order.
//!
//! ## Example
//!
//! ```rust
//! use edgekit::router::Router;
//! use edgekit::Reply;
//! use http::Method;
//!
//! let mut router: Router = Router::new();
//! router.get("/quests/:id", |ctx| {
//!     let id = ctx.get_path_param("id").unwrap_or("").to_string();
//!     Ok(Reply::text(id))
//! });
//!
//! let m = router.match_route(&Method::GET, "/quests/42").unwrap();
//! assert_eq!(m.get_path_param("id"), Some("42"));
//! ```

mod core;

pub use self::core::{HandlerFn, ParamVec, Route, RouteMatch, Router, MAX_INLINE_PARAMS};
