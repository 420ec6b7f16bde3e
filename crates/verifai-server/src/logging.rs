use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use rand::Rng;
use std::time::{Duration, Instant};

/// 每个请求的追踪 ID，写入 extensions 并回显在 `X-Trace-Id` 头中。
#[derive(Clone)]
pub struct TraceId(pub String);

impl TraceId {
    /// 8 random bytes rendered as 16 lowercase hex chars.
    fn random() -> Self {
        let raw: u64 = rand::thread_rng().gen();
        Self(format!("{raw:016x}"))
    }
}

impl std::ops::Deref for TraceId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

const SNIPPET_LIMIT: usize = 200;
const CAPTURE_LIMIT: usize = 1024 * 1024;

/// What the middleware may copy out of a request or response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Snippet,
    Withheld(&'static str),
}

fn request_capture(method: &Method, headers: &HeaderMap) -> Capture {
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return Capture::Withheld("no body");
    }
    // Uploads are whole document images.
    if header_value(headers, header::CONTENT_TYPE).starts_with("multipart/") {
        return Capture::Withheld("document upload");
    }
    Capture::Snippet
}

fn response_capture(path: &str, headers: &HeaderMap) -> Capture {
    if !header_value(headers, header::CONTENT_TYPE).contains("application/json") {
        return Capture::Withheld("not json");
    }
    // Verification payloads embed the base64 image.
    if path.starts_with("/v1/verifications") {
        return Capture::Withheld("document payload");
    }
    Capture::Snippet
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Leading text of a body, cut on a char boundary.
fn snippet(bytes: &[u8]) -> String {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return "<non-utf8 body>".to_string();
    };
    if text.len() <= SNIPPET_LIMIT {
        return text.to_string();
    }
    let end = text
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= SNIPPET_LIMIT)
        .last()
        .unwrap_or(0);
    format!("{}...", &text[..end])
}

fn human_elapsed(elapsed: Duration) -> String {
    match elapsed.as_micros() {
        us @ 0..=999 => format!("{us}µs"),
        us @ 1_000..=999_999 => format!("{}ms", us / 1_000),
        _ => format!("{:.1}s", elapsed.as_secs_f64()),
    }
}

async fn drain(body: Body, limit: usize) -> Bytes {
    axum::body::to_bytes(body, limit).await.unwrap_or_default()
}

/// Access log for the API.
///
/// Swagger assets pass straight through. Document uploads and verification
/// payloads are logged without their bodies.
pub async fn request_logging(mut req: Request, next: Next) -> Response {
    let trace = TraceId::random();
    req.extensions_mut().insert(trace.clone());

    let path = req.uri().path().to_string();
    if path.starts_with("/docs") {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let agent = match header_value(req.headers(), header::USER_AGENT) {
        "" => "-".to_string(),
        ua => ua.to_string(),
    };

    let (req, request_body) = match request_capture(&method, req.headers()) {
        Capture::Snippet => {
            let (parts, body) = req.into_parts();
            let bytes = drain(body, CAPTURE_LIMIT).await;
            let text = if bytes.is_empty() {
                String::new()
            } else {
                snippet(&bytes)
            };
            (Request::from_parts(parts, Body::from(bytes)), text)
        }
        Capture::Withheld(reason) => (req, format!("<{reason}>")),
    };

    tracing::info!(
        trace_id = %trace.0,
        method = %method,
        path = %target,
        body = %request_body,
        ua = %agent,
        "--> request"
    );

    let started = Instant::now();
    let response = next.run(req).await;
    let elapsed = human_elapsed(started.elapsed());

    let (mut parts, body) = response.into_parts();
    let bytes = drain(body, usize::MAX).await;
    let response_body = match response_capture(&path, &parts.headers) {
        Capture::Snippet if !bytes.is_empty() => snippet(&bytes),
        Capture::Snippet => String::new(),
        Capture::Withheld(reason) => format!("<{reason}>"),
    };

    let status = parts.status;
    match status.as_u16() {
        500.. => tracing::error!(
            trace_id = %trace.0,
            status = status.as_u16(),
            elapsed = %elapsed,
            body = %response_body,
            "<-- response"
        ),
        400..=499 => tracing::warn!(
            trace_id = %trace.0,
            status = status.as_u16(),
            elapsed = %elapsed,
            body = %response_body,
            "<-- response"
        ),
        _ => tracing::info!(
            trace_id = %trace.0,
            status = status.as_u16(),
            elapsed = %elapsed,
            body = %response_body,
            "<-- response"
        ),
    }

    if let Ok(value) = HeaderValue::from_str(&trace.0) {
        parts.headers.insert("X-Trace-Id", value);
    }
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_id_is_sixteen_hex_chars() {
        let id = TraceId::random();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn snippet_cuts_on_char_boundary() {
        assert_eq!(snippet(b"short"), "short");
        let long = format!("{}é", "a".repeat(SNIPPET_LIMIT - 1));
        assert_eq!(snippet(long.as_bytes()), format!("{}...", "a".repeat(SNIPPET_LIMIT - 1)));
        assert_eq!(snippet(&[0xff, 0xfe]), "<non-utf8 body>");
    }

    #[test]
    fn elapsed_formats_by_magnitude() {
        assert_eq!(human_elapsed(Duration::from_micros(999)), "999µs");
        assert_eq!(human_elapsed(Duration::from_micros(2_500)), "2ms");
        assert_eq!(human_elapsed(Duration::from_millis(1_500)), "1.5s");
    }

    #[test]
    fn uploads_and_document_payloads_are_withheld() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=x"),
        );
        assert_eq!(
            request_capture(&Method::POST, &headers),
            Capture::Withheld("document upload")
        );
        assert_eq!(
            request_capture(&Method::GET, &headers),
            Capture::Withheld("no body")
        );

        let mut json = HeaderMap::new();
        json.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(
            response_capture("/v1/verifications/abc", &json),
            Capture::Withheld("document payload")
        );
        assert_eq!(response_capture("/v1/settings", &json), Capture::Snippet);
    }
}
