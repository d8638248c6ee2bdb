//! HTTP client adapter.
//!
//! Implements [`HttpTransport`] with one connection per request: the
//! connection is opened, used for a single exchange, and dropped before
//! `execute` returns.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` wrapped in the
//!   `embedded_svc` blocking client, certificate bundle attached for `https`.
//! - **all other targets**: the `reqwest` blocking client with
//!   `Connection: close` and no idle pool, for running against a local server
//!   on the host.  `https` is rejected with [`TransportError::UnsupportedScheme`].

use log::warn;

use crate::app::ports::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, RESPONSE_BODY_CAPACITY};
use crate::error::TransportError;

pub struct HttpAdapter {
    requests: u32,
    /// Built on first use; `reqwest` construction is fallible.
    #[cfg(not(target_os = "espidf"))]
    client: Option<reqwest::blocking::Client>,
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpAdapter {
    pub fn new() -> Self {
        Self {
            requests: 0,
            #[cfg(not(target_os = "espidf"))]
            client: None,
        }
    }

    /// Requests attempted since construction.
    pub fn requests(&self) -> u32 {
        self.requests
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_execute(&mut self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        use core::time::Duration;

        use embedded_svc::http::client::Client;
        use embedded_svc::http::{Method, Status};
        use embedded_svc::io::{Read, Write};
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let conf = Configuration {
            timeout: Some(Duration::from_millis(u64::from(request.timeout_ms))),
            crt_bundle_attach: Some(esp_idf_sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&conf).map_err(|e| {
            warn!("HTTP: connection init failed: {:?}", e);
            TransportError::Connect
        })?;
        let mut client = Client::wrap(connection);

        let content_length = request.body.len().to_string();
        let mut headers: heapless::Vec<(&str, &str), 2> = heapless::Vec::new();
        if let Some(content_type) = request.content_type {
            let _ = headers.push(("Content-Type", content_type));
        }
        let method = match request.method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Post => {
                let _ = headers.push(("Content-Length", content_length.as_str()));
                Method::Post
            }
        };

        let mut req = client.request(method, request.url, &headers).map_err(|e| {
            warn!("HTTP: request to {} failed: {:?}", request.url, e);
            TransportError::Connect
        })?;
        if !request.body.is_empty() {
            req.write_all(request.body).map_err(|_| TransportError::Io)?;
            req.flush().map_err(|_| TransportError::Io)?;
        }
        let mut response = req.submit().map_err(|e| {
            warn!("HTTP: no response from {}: {:?}", request.url, e);
            TransportError::Io
        })?;

        let status = response.status();
        let (body, truncated) = read_body(|buf| response.read(buf));
        Ok(HttpResponse {
            status,
            body,
            truncated,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_execute(&mut self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        use std::io::Read;
        use std::time::Duration;

        use reqwest::header::{CONNECTION, CONTENT_TYPE};

        if request.url.starts_with("https://") {
            return Err(TransportError::UnsupportedScheme);
        }
        if !request.url.starts_with("http://") {
            return Err(TransportError::InvalidUrl);
        }
        let url = reqwest::Url::parse(request.url).map_err(|_| TransportError::InvalidUrl)?;

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut builder = self
            .host_client()?
            .request(method, url)
            .timeout(Duration::from_millis(u64::from(request.timeout_ms.max(1))))
            .header(CONNECTION, "close");
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if request.method == HttpMethod::Post {
            builder = builder.body(request.body.to_vec());
        }

        let mut response = builder.send().map_err(|e| classify(&e))?;
        let status = response.status().as_u16();
        let (body, truncated) = read_body(|buf| response.read(buf));
        Ok(HttpResponse {
            status,
            body,
            truncated,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn host_client(&mut self) -> Result<reqwest::blocking::Client, TransportError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .http1_title_case_headers()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| {
                warn!("HTTP: client init failed: {}", e);
                TransportError::Io
            })?;
        self.client = Some(client.clone());
        Ok(client)
    }
}

impl HttpTransport for HttpAdapter {
    fn execute(&mut self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        self.requests = self.requests.wrapping_add(1);
        let result = self.platform_execute(request);
        if let Err(e) = &result {
            warn!("HTTP: {:?} {} failed: {}", request.method, request.url, e);
        }
        result
    }
}

/// Drain a response body into the fixed buffer.  Overflow or a read error
/// after the status line marks the body truncated; the exchange still counts
/// as answered.
fn read_body<E>(
    mut read: impl FnMut(&mut [u8]) -> Result<usize, E>,
) -> (heapless::Vec<u8, RESPONSE_BODY_CAPACITY>, bool) {
    let mut body = heapless::Vec::new();
    let mut chunk = [0u8; 128];
    loop {
        let n = match read(&mut chunk) {
            Ok(0) => return (body, false),
            Ok(n) => n,
            Err(_) => return (body, true),
        };
        let take = n.min(RESPONSE_BODY_CAPACITY - body.len());
        let _ = body.extend_from_slice(&chunk[..take]);
        if take < n {
            return (body, true);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn classify(e: &reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect
    } else if e.is_builder() {
        TransportError::InvalidUrl
    } else if e.is_decode() {
        TransportError::MalformedResponse
    } else {
        TransportError::Io
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
