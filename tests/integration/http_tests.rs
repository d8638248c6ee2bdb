//! Host HTTP adapter against a loopback server.
//!
//! Each test binds an ephemeral port and serves exactly one canned response
//! from a background thread, capturing the raw request it received.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use smartmeter::adapters::http::HttpAdapter;
use smartmeter::app::ports::{HttpRequest, HttpTransport, RESPONSE_BODY_CAPACITY};
use smartmeter::error::TransportError;

/// Serve `response` once, then keep the socket open for `hold` before
/// closing it.  The returned receiver yields the request bytes.
fn serve(response: String, hold: Duration) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 512];
        // Read the head, then exactly Content-Length body bytes.
        loop {
            let n = stream.read(&mut buf).unwrap();
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .map_or(0, |(_, v)| v.trim().parse::<usize>().unwrap());
                if raw.len() >= head_end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
        let _ = tx.send(String::from_utf8(raw).unwrap());
        thread::sleep(hold);
    });

    (base, rx)
}

fn serve_once(response: &str) -> (String, mpsc::Receiver<String>) {
    serve(response.to_owned(), Duration::ZERO)
}

#[test]
fn post_sends_json_and_reads_status() {
    let (base, rx) = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
    let url = format!("{base}/api/relay/state");
    let body = br#"{"relay1":true,"relay2":false}"#;

    let mut http = HttpAdapter::new();
    let response = http
        .execute(&HttpRequest::post_json(&url, body, 2_000))
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body.as_slice(), b"ok");
    assert!(!response.truncated);
    assert_eq!(http.requests(), 1);

    let request = rx.recv().unwrap();
    assert!(request.starts_with("POST /api/relay/state HTTP/1.1\r\n"));
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("content-type: application/json\r\n"));
    assert!(lower.contains("connection: close\r\n"));
    assert!(request.ends_with(r#"{"relay1":true,"relay2":false}"#));
}

#[test]
fn get_reads_chunked_body() {
    let (base, rx) = serve_once(
        "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
         1e\r\n{\"relay1\":false,\"relay2\":true}\r\n0\r\n\r\n",
    );
    let url = format!("{base}/api/relay/state");

    let mut http = HttpAdapter::new();
    let response = http.execute(&HttpRequest::get(&url, 2_000)).unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body.as_slice(),
        br#"{"relay1":false,"relay2":true}"#
    );
    assert!(!response.truncated);
    assert!(rx.recv().unwrap().starts_with("GET /api/relay/state HTTP/1.1\r\n"));
}

#[test]
fn content_length_body_completes_while_server_keeps_socket_open() {
    let (base, _rx) = serve(
        "HTTP/1.1 200 OK\r\nContent-Length: 30\r\n\r\n{\"relay1\":true,\"relay2\":false}"
            .to_owned(),
        Duration::from_secs(3),
    );
    let url = format!("{base}/api/relay/state");

    let started = Instant::now();
    let response = HttpAdapter::new()
        .execute(&HttpRequest::get(&url, 1_500))
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body.as_slice(),
        br#"{"relay1":true,"relay2":false}"#
    );
    assert!(!response.truncated);
    assert!(started.elapsed() < Duration::from_millis(1_500));
}

#[test]
fn oversized_body_is_flagged_truncated() {
    let payload = "x".repeat(RESPONSE_BODY_CAPACITY + 64);
    let (base, _rx) = serve(
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{payload}",
            payload.len()
        ),
        Duration::ZERO,
    );

    let response = HttpAdapter::new()
        .execute(&HttpRequest::get(&format!("{base}/api/relay/state"), 2_000))
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body.len(), RESPONSE_BODY_CAPACITY);
    assert!(response.truncated);
}

#[test]
fn error_status_is_returned_as_response() {
    let (base, _rx) = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
    let url = format!("{base}/api/data");

    let response = HttpAdapter::new()
        .execute(&HttpRequest::post_json(&url, b"{}", 2_000))
        .unwrap();

    assert_eq!(response.status, 404);
    assert!(response.body.is_empty());
}

#[test]
fn silent_server_times_out() {
    // Accepts and reads the request but never answers.
    let (base, _rx) = serve(String::new(), Duration::from_secs(3));
    let url = format!("{base}/api/relay/state");

    let err = HttpAdapter::new()
        .execute(&HttpRequest::get(&url, 300))
        .unwrap_err();

    assert_eq!(err, TransportError::Timeout);
}

#[test]
fn closed_port_is_a_connect_failure() {
    // Bind then drop to get a port nobody is listening on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = format!("http://127.0.0.1:{port}/api/data");

    let err = HttpAdapter::new()
        .execute(&HttpRequest::get(&url, 500))
        .unwrap_err();

    assert_eq!(err, TransportError::Connect);
}

#[test]
fn https_is_rejected_on_host() {
    let err = HttpAdapter::new()
        .execute(&HttpRequest::get("https://meter.example.com/api/data", 500))
        .unwrap_err();
    assert_eq!(err, TransportError::UnsupportedScheme);
}
