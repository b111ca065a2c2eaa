//! HTTP transport glue on `may_minihttp`.
//!
//! `request` turns a raw request into a [`crate::DispatchRequest`],
//! `service` runs it through the dispatcher, and `response` writes the
//! resulting [`crate::HandlerResponse`] back to the wire. `http_server`
//! wraps the coroutine server with a handle suitable for tests.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_query_params, parse_request};
pub use response::write_response;
pub use service::AppService;
