use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::completion::CompletionService;
use crate::templates;

const MAX_HEADER_BYTES: usize = 64 * 1024;
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub const NO_MESSAGE: &str = "no message received";

/// Forwards chat messages to a completion service behind a fixed system prompt.
///
/// Holds no per-request state; every request is answered independently.
pub struct Relay {
    completion: Arc<dyn CompletionService>,
    system_prompt: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: Option<String>,
}

/// A fully formed response, ready to be written to the socket.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: value.to_string(),
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len(),
            self.body
        )
        .into_bytes()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "",
    }
}

impl Relay {
    pub fn new(completion: Arc<dyn CompletionService>, system_prompt: impl Into<String>) -> Self {
        Self {
            completion,
            system_prompt: system_prompt.into(),
        }
    }

    /// Routes one parsed request.
    pub async fn handle(&self, method: &str, target: &str, body: &[u8]) -> HttpResponse {
        let path = target.split('?').next().unwrap_or(target);
        match (method, path) {
            ("GET", "/") => HttpResponse {
                status: 200,
                content_type: "text/html; charset=utf-8",
                body: templates::index_html().to_string(),
            },
            ("POST", "/chat") => self.chat(body).await,
            (_, "/") | (_, "/chat") => HttpResponse::text(405, "method not allowed"),
            _ => HttpResponse::text(404, "not found"),
        }
    }

    async fn chat(&self, body: &[u8]) -> HttpResponse {
        let message = serde_json::from_slice::<ChatRequest>(body)
            .ok()
            .and_then(|req| req.message)
            .filter(|m| !m.is_empty());
        let Some(message) = message else {
            return HttpResponse::json(400, json!({ "error": NO_MESSAGE }));
        };

        match self.completion.complete(&self.system_prompt, &message).await {
            Ok(reply) => HttpResponse::json(200, json!({ "reply": reply })),
            Err(e) => {
                tracing::error!("chat completion failed: {e}");
                HttpResponse::json(500, json!({ "error": e }))
            }
        }
    }
}

/// Accepts connections until the listener fails, one task per connection.
pub async fn serve(listener: TcpListener, relay: Arc<Relay>) -> std::io::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "chat relay listening");
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("accept failed: {e}");
                continue;
            }
        };

        let relay = relay.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, &relay).await {
                tracing::debug!(%peer, "connection error: {e}");
            }
        });
    }
}

struct Request {
    method: String,
    target: String,
    body: Vec<u8>,
}

enum ReadOutcome {
    Request(Request),
    TooLarge,
    Malformed,
    Closed,
}

/// Handle a single TCP connection with minimal HTTP/1.1 parsing.
async fn handle_connection(mut stream: TcpStream, relay: &Relay) -> std::io::Result<()> {
    let response = match read_request(&mut stream).await? {
        ReadOutcome::Request(req) => {
            tracing::debug!(method = %req.method, target = %req.target, "request");
            relay.handle(&req.method, &req.target, &req.body).await
        }
        ReadOutcome::TooLarge => HttpResponse::text(413, "request too large"),
        ReadOutcome::Malformed => HttpResponse::text(400, "malformed request body"),
        ReadOutcome::Closed => return Ok(()),
    };
    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<ReadOutcome> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos;
        }
        if buf.len() > MAX_HEADER_BYTES {
            return Ok(ReadOutcome::TooLarge);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(ReadOutcome::Closed);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("").to_string();
    let target = request_line.next().unwrap_or("/").to_string();

    let mut content_length = 0;
    let mut chunked = false;
    for (name, value) in lines.filter_map(|line| line.split_once(':')) {
        let name = name.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.trim().parse::<usize>().unwrap_or(0);
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.to_ascii_lowercase().contains("chunked");
        }
    }

    let mut body = buf.split_off(head_end + 4);
    if chunked {
        loop {
            match decode_chunked(&body) {
                Chunked::Complete(decoded) => {
                    body = decoded;
                    break;
                }
                Chunked::TooLarge => return Ok(ReadOutcome::TooLarge),
                Chunked::Malformed => return Ok(ReadOutcome::Malformed),
                Chunked::Incomplete => {}
            }
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(ReadOutcome::Malformed);
            }
            body.extend_from_slice(&chunk[..n]);
        }
    } else {
        if content_length > MAX_BODY_BYTES {
            return Ok(ReadOutcome::TooLarge);
        }
        while body.len() < content_length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(content_length);
    }

    Ok(ReadOutcome::Request(Request {
        method,
        target,
        body,
    }))
}

#[derive(Debug, PartialEq)]
enum Chunked {
    Complete(Vec<u8>),
    Incomplete,
    TooLarge,
    Malformed,
}

/// Decodes a `Transfer-Encoding: chunked` body received so far. Trailers are ignored.
fn decode_chunked(raw: &[u8]) -> Chunked {
    let mut out = Vec::new();
    let mut pos = 0;
    loop {
        let Some(line_len) = find_subslice(&raw[pos..], b"\r\n") else {
            return Chunked::Incomplete;
        };
        let size_line = String::from_utf8_lossy(&raw[pos..pos + line_len]);
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let Ok(size) = usize::from_str_radix(size_hex, 16) else {
            return Chunked::Malformed;
        };
        pos += line_len + 2;

        if size == 0 {
            let rest = &raw[pos..];
            let done = rest.starts_with(b"\r\n") || find_subslice(rest, b"\r\n\r\n").is_some();
            return if done {
                Chunked::Complete(out)
            } else {
                Chunked::Incomplete
            };
        }
        if size > MAX_BODY_BYTES - out.len() {
            return Chunked::TooLarge;
        }
        if raw.len() < pos + size + 2 {
            return Chunked::Incomplete;
        }
        if &raw[pos + size..pos + size + 2] != b"\r\n" {
            return Chunked::Malformed;
        }
        out.extend_from_slice(&raw[pos..pos + size]);
        pos += size + 2;
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::tests::StubCompletion;

    fn relay_with(stub: StubCompletion) -> (Relay, Arc<StubCompletion>) {
        let stub = Arc::new(stub);
        (Relay::new(stub.clone(), "you are helpful"), stub)
    }

    fn body_json(response: &HttpResponse) -> serde_json::Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[tokio::test]
    async fn test_chat_returns_reply() {
        let (relay, stub) = relay_with(StubCompletion::replying("hello"));
        let response = relay.handle("POST", "/chat", br#"{"message":"hi"}"#).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "application/json");
        assert_eq!(body_json(&response), json!({ "reply": "hello" }));
        assert_eq!(
            *stub.calls.lock().unwrap(),
            vec![("you are helpful".to_string(), "hi".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_or_missing_message_is_rejected() {
        let (relay, stub) = relay_with(StubCompletion::replying("unused"));
        for body in [
            &br#"{"message":""}"#[..],
            br#"{}"#,
            br#"{"message":null}"#,
            br#"{"message":5}"#,
            b"not json",
            b"",
        ] {
            let response = relay.handle("POST", "/chat", body).await;
            assert_eq!(response.status, 400);
            assert_eq!(body_json(&response), json!({ "error": NO_MESSAGE }));
        }
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_server_error() {
        let (relay, _) = relay_with(StubCompletion::failing("connection refused"));
        let response = relay.handle("POST", "/chat", br#"{"message":"hi"}"#).await;

        assert_eq!(response.status, 500);
        let body = body_json(&response);
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_index_and_unknown_routes() {
        let (relay, _) = relay_with(StubCompletion::replying("unused"));

        let index = relay.handle("GET", "/?lang=en", b"").await;
        assert_eq!(index.status, 200);
        assert!(index.content_type.starts_with("text/html"));
        assert_eq!(index.body, templates::index_html());

        assert_eq!(relay.handle("GET", "/chat", b"").await.status, 405);
        assert_eq!(relay.handle("GET", "/static/app.js", b"").await.status, 404);
    }

    #[tokio::test]
    async fn test_serves_chat_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (relay, _) = relay_with(StubCompletion::replying("hello"));
        let server = tokio::spawn(serve(listener, Arc::new(relay)));

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let ok = client
            .post(format!("http://{addr}/chat"))
            .json(&json!({ "message": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status().as_u16(), 200);
        assert_eq!(ok.json::<serde_json::Value>().await.unwrap(), json!({ "reply": "hello" }));

        let bad = client
            .post(format!("http://{addr}/chat"))
            .json(&json!({ "message": "" }))
            .send()
            .await
            .unwrap();
        assert_eq!(bad.status().as_u16(), 400);
        assert_eq!(
            bad.json::<serde_json::Value>().await.unwrap(),
            json!({ "error": "no message received" })
        );

        server.abort();
    }

    #[test]
    fn test_decode_chunked_body() {
        assert_eq!(
            decode_chunked(b"4\r\n{\"me\r\n9;ext=1\r\nssage\":1}\r\n0\r\n\r\n"),
            Chunked::Complete(br#"{"message":1}"#.to_vec())
        );
        assert_eq!(decode_chunked(b"4\r\nab"), Chunked::Incomplete);
        assert_eq!(decode_chunked(b"2\r\nab\r\n0\r\n"), Chunked::Incomplete);
        assert_eq!(decode_chunked(b"zz\r\nab\r\n"), Chunked::Malformed);
        assert_eq!(decode_chunked(b"2\r\nabcd\r\n"), Chunked::Malformed);
    }

    #[tokio::test]
    async fn test_chunked_chat_request_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (relay, stub) = relay_with(StubCompletion::replying("hello"));
        let server = tokio::spawn(serve(listener, Arc::new(relay)));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = "POST /chat HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n8\r\n{\"messag\r\n8\r\ne\":\"hi\"}\r\n0\r\n\r\n";
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"), "response: {raw}");
        let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
        assert_eq!(serde_json::from_str::<serde_json::Value>(body).unwrap(), json!({ "reply": "hello" }));
        assert_eq!(stub.calls.lock().unwrap()[0].1, "hi");

        server.abort();
    }

    #[test]
    fn test_response_serialization() {
        let bytes = HttpResponse::json(400, json!({ "error": "x" })).to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.contains("Content-Length: 13\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"error\":\"x\"}"));
    }
}
