use super::request::parse_request;
use super::response::write_response;
use crate::dispatcher::Dispatcher;
use may_minihttp::{HttpService, Request, Response};
use std::io;

/// `HttpService` adapter: parse the raw request, run it through the
/// dispatcher, write the result.
///
/// All routing, validation and error semantics live in the dispatcher;
/// this type only moves bytes.
pub struct AppService<S = ()> {
    dispatcher: Dispatcher<S>,
}

impl<S> AppService<S> {
    #[must_use]
    pub fn new(dispatcher: Dispatcher<S>) -> Self {
        Self { dispatcher }
    }
}

impl<S> Clone for AppService<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> HttpService for AppService<S> {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = parse_request(req);
        let response = self.dispatcher.dispatch(request);
        write_response(res, response);
        Ok(())
    }
}
