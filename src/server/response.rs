use crate::dispatcher::HandlerResponse;
use may_minihttp::Response;
use serde_json::Value;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Write a dispatched [`HandlerResponse`] to the wire.
///
/// Headers were already decided during dispatch; `Value::String` bodies are
/// written as-is, everything else is serialized as JSON. Statuses that
/// forbid a body (204/304) and `Value::Null` write none.
pub fn write_response(res: &mut Response, hr: HandlerResponse) {
    res.status_code(hr.status as usize, status_reason(hr.status));

    for (name, value) in hr.headers.iter() {
        // may_minihttp wants 'static header lines
        let header = format!("{name}: {value}").into_boxed_str();
        res.header(Box::leak(header));
    }

    if hr.status == 204 || hr.status == 304 {
        return;
    }
    match hr.body {
        Value::Null => {}
        Value::String(s) => res.body_vec(s.into_bytes()),
        other => res.body_vec(serde_json::to_vec(&other).unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(405), "Method Not Allowed");
        assert_eq!(status_reason(429), "Too Many Requests");
    }
}
