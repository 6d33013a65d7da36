//! Remote byte fetching: the "GET bytes at URL" capability.
//!
//! Backends only see the [`Fetcher`] trait. [`HttpFetcher`] is the real
//! network client; [`StaticFetcher`] serves canned responses from memory for
//! tests and offline embedding.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;

use crate::backend::BoxFuture;
use crate::config::FetchConfig;
use crate::error::{Result, StoreError};

/// Fetches the full body of a remote resource.
///
/// Implementations must fail with [`StoreError::FetchFailed`] unless the
/// response status is exactly 200.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// `reqwest`-backed fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let failed = |status: Option<u16>, reason: String| StoreError::FetchFailed {
                url: url.to_string(),
                status,
                reason,
            };

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| failed(None, e.to_string()))?;

            let status = response.status();
            if status != StatusCode::OK {
                return Err(failed(Some(status.as_u16()), format!("HTTP {}", status)));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| failed(Some(status.as_u16()), e.to_string()))?;
            log::debug!("fetched {} bytes from {}", body.len(), url);
            Ok(body.to_vec())
        })
    }
}

struct CannedResponse {
    status: u16,
    body: Vec<u8>,
    latency: Duration,
}

/// In-memory fetcher with canned responses.
///
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, CannedResponse>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200.
    pub fn with_body(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.respond(url, 200, body.into(), Duration::ZERO)
    }

    /// Serve an empty body with the given status.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.respond(url, status, Vec::new(), Duration::ZERO)
    }

    /// Serve `body` with status 200 after waiting `latency`.
    pub fn with_delayed_body(self, url: &str, body: impl Into<Vec<u8>>, latency: Duration) -> Self {
        self.respond(url, 200, body.into(), latency)
    }

    fn respond(mut self, url: &str, status: u16, body: Vec<u8>, latency: Duration) -> Self {
        self.responses.insert(
            url.to_string(),
            CannedResponse {
                status,
                body,
                latency,
            },
        );
        self
    }
}

impl Fetcher for StaticFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let (status, body, latency) = match self.responses.get(url) {
                Some(r) => (r.status, r.body.clone(), r.latency),
                None => (404, Vec::new(), Duration::ZERO),
            };
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if status != 200 {
                return Err(StoreError::FetchFailed {
                    url: url.to_string(),
                    status: Some(status),
                    reason: format!("HTTP {}", status),
                });
            }
            Ok(body)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const BINARY_BODY: &[u8] = b"\x00\x01binary\xff";

    /// Minimal HTTP/1.1 server with canned routes. Returns its base URL.
    async fn serve_canned() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(answer(socket));
            }
        });
        format!("http://{}", addr)
    }

    async fn answer(mut socket: TcpStream) {
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&chunk[..n]),
            }
        }
        let request = String::from_utf8_lossy(&request);
        let path = request.split_whitespace().nth(1).unwrap_or("/");
        let (status, body): (&str, &[u8]) = match path {
            "/files/ok.bin" => ("200 OK", BINARY_BODY),
            "/files/empty.bin" => ("204 No Content", b""),
            // No Location header, so the client cannot follow it.
            "/files/moved.bin" => ("301 Moved Permanently", b""),
            _ => ("404 Not Found", b"missing"),
        };
        let head = if status.starts_with("204") {
            format!("HTTP/1.1 {}\r\nConnection: close\r\n\r\n", status)
        } else {
            format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            )
        };
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(body).await;
        let _ = socket.shutdown().await;
    }

    fn http_fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetchConfig {
            timeout_secs: 5,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_http_200_returns_body() {
        let base = serve_canned().await;
        let body = http_fetcher()
            .fetch(&format!("{}/files/ok.bin", base))
            .await
            .unwrap();
        assert_eq!(body, BINARY_BODY);
    }

    #[tokio::test]
    async fn test_http_non_200_fails_with_status() {
        let base = serve_canned().await;
        let fetcher = http_fetcher();
        for (path, code) in [
            ("/files/empty.bin", 204),
            ("/files/moved.bin", 301),
            ("/files/gone.bin", 404),
        ] {
            let url = format!("{}{}", base, path);
            let err = fetcher.fetch(&url).await.unwrap_err();
            match err {
                StoreError::FetchFailed {
                    url: failed,
                    status,
                    ..
                } => {
                    assert_eq!(status, Some(code), "{path}");
                    assert_eq!(failed, url);
                }
                other => panic!("{path}: unexpected error {other}"),
            }
        }
    }

    #[tokio::test]
    async fn test_static_body() {
        let fetcher = StaticFetcher::new().with_body("https://h/a.bin", b"abc".to_vec());
        assert_eq!(fetcher.fetch("https://h/a.bin").await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_static_non_200_fails() {
        let fetcher = StaticFetcher::new().with_status("https://h/a.bin", 204);
        let err = fetcher.fetch("https://h/a.bin").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::FetchFailed {
                status: Some(204),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_static_unknown_is_404() {
        let fetcher = StaticFetcher::new();
        let err = fetcher.fetch("https://h/missing").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::FetchFailed {
                status: Some(404),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_http_fetcher_connection_refused() {
        // Port 9 (discard) is closed on test machines; the request fails fast.
        let err = http_fetcher()
            .fetch("http://127.0.0.1:9/x.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::FetchFailed { status: None, .. }));
    }
}
