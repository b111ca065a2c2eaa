//! End-to-end test over a live `may_minihttp` server: raw HTTP in, wire
//! bytes out.

use edgekit::server::{AppService, HttpServer};
use edgekit::{Context, Dispatcher, Reply, Router};
use serde_json::json;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

mod tracing_util;
use tracing_util::TestTracing;

fn start_app(addr: &str) -> edgekit::server::ServerHandle {
    may::config().set_stack_size(0x8000);

    let mut router: Router = Router::new();
    router.get("/items/:id", |ctx: &mut Context| {
        Ok(Reply::json(json!({ "id": ctx.get_path_param("id") })))
    });
    router.get("/motd", |_| Ok(Reply::text("keep going")));

    let service = AppService::new(Dispatcher::new(router, ()));
    let handle = HttpServer(service).start(addr).expect("bind failed");
    handle.wait_ready().expect("server never became ready");
    handle
}

fn send_request(addr: &str, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect failed");
    stream
        .set_read_timeout(Some(Duration::from_millis(500)))
        .expect("set timeout");
    stream.write_all(request.as_bytes()).expect("write failed");

    // The server keeps the connection alive; read until the socket would
    // block and work with whatever arrived.
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    // Body may trail the header terminator; give it one more read.
    if let Ok(n) = stream.read(&mut chunk) {
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).to_string()
}

#[test]
fn serves_json_and_text_over_the_wire() {
    let _t = TestTracing::init();
    let addr = "127.0.0.1:18641";
    let handle = start_app(addr);

    let resp = send_request(
        addr,
        "GET /items/42 HTTP/1.1\r\nHost: localhost\r\n\r\n",
    );
    assert!(resp.starts_with("HTTP/1.1 200"), "got: {resp}");
    assert!(resp.contains("\"id\":\"42\""), "got: {resp}");

    let resp = send_request(addr, "GET /motd HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(resp.starts_with("HTTP/1.1 200"), "got: {resp}");
    assert!(resp.contains("keep going"), "got: {resp}");

    let resp = send_request(addr, "GET /nope HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(resp.starts_with("HTTP/1.1 404"), "got: {resp}");

    handle.stop();
}
