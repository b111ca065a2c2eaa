//! # Dispatcher Module
//!
//! The single per-request entry point: match, validate, invoke, normalize.
//!
//! ## Request Flow
//!
//! 1. Method registered by no route → 405 with an `Allowed` header
//! 2. Route table walk (exact match first, then patterns in registration
//!    order) → 404 `Not Found` when nothing matches
//! 3. [`crate::Context`] construction: query map, path params, default
//!    status by method, shared backend state
//! 4. Non-GET JSON bodies parsed; a registered schema is applied before the
//!    handler runs, and a failure produces a structured 400 without ever
//!    invoking the handler
//! 5. Handler invocation (with panic recovery)
//! 6. Reply normalization: JSON / plain text / pre-built response /
//!    redirect, honoring the context's status override and headers
//!
//! ## Error Mapping
//!
//! A returned [`crate::HttpError`] is rendered with its carried status and
//! `{"message", "status"}` body. Any other failure - including a handler
//! panic - collapses to a 500 whose body carries only `{"status": 500}`;
//! internal details are logged, never sent to the client.
//!
//! ## Concurrency
//!
//! Dispatch is a straight-line sequence per request. The dispatcher holds
//! only the immutable route table and the shared state handle, so one
//! instance can serve concurrently processed requests without locking.

mod core;

pub use self::core::{
    DispatchRequest, Dispatcher, HandlerResponse, HandlerResult, HeaderVec, Reply,
    MAX_INLINE_HEADERS,
};
