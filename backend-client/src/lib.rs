//! Asynchronous client for the panel backend's cast endpoints.
//!
//! The backend is the source of truth for device identity: a scan returns
//! the receivers it currently sees, keyed by friendly name, and a cast
//! request asks it to relay a "load URL" command to one of them.

use log::debug;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

pub use reqwest::StatusCode;

/// A receiver found by one backend scan.
///
/// Valid for one discovery cycle; the next scan replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverDevice {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("scan request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("scan returned {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cast request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("cast returned {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, serde::Serialize)]
struct CastRequest<'a> {
    device: &'a str,
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    devices: Vec<ScanEntry>,
}

#[derive(Debug, Deserialize)]
struct ScanEntry {
    friendly_name: String,
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Ask the backend which receivers are currently visible.
    ///
    /// Order is the backend's; no deduplication. Zero devices is a valid
    /// result, not an error.
    pub async fn scan(&self) -> Result<Vec<ReceiverDevice>, DiscoveryError> {
        let url = format!("{}/cast/scan", self.base_url);
        let res = self.http.get(url).send().await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DiscoveryError::UnexpectedStatus { status, body });
        }

        let response = res.json::<ScanResponse>().await?;

        debug!("Scan found {} device(s)", response.devices.len());

        Ok(response
            .devices
            .into_iter()
            .map(|entry| ReceiverDevice {
                id: entry.friendly_name.clone(),
                display_name: entry.friendly_name,
            })
            .collect())
    }

    /// Ask the backend to relay a cast of `url` to the named device.
    ///
    /// The ack body is ignored; no local state is retained.
    pub async fn cast(&self, device_id: &str, url: &str) -> Result<(), BackendError> {
        let endpoint = format!("{}/cast", self.base_url);
        let res = self
            .http
            .post(endpoint)
            .json(&CastRequest {
                device: device_id,
                url,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(BackendError::UnexpectedStatus { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    /// Returns true once `data` holds the request head plus any body
    /// promised by its Content-Length header.
    fn request_is_complete(data: &[u8]) -> bool {
        let Some(head_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&data[..head_end]);
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        data.len() >= head_end + 4 + content_length
    }

    /// Serve one canned HTTP response and capture the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, oneshot::Receiver<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (request_tx, request_rx) = oneshot::channel();

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len(),
        );

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut data = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&buf[..n]);
                if request_is_complete(&data) {
                    break;
                }
            }
            let _ = request_tx.send(String::from_utf8_lossy(&data).into_owned());
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{addr}"), request_rx)
    }

    #[tokio::test]
    async fn test_scan_maps_friendly_names() {
        let (base, _request) = serve_once(
            "200 OK",
            r#"{"devices":[{"friendly_name":"Living Room"},{"friendly_name":"Kitchen","model":"X-1000"}]}"#,
        )
        .await;

        let devices = BackendClient::new(base).scan().await.unwrap();
        assert_eq!(
            devices,
            vec![
                ReceiverDevice {
                    id: "Living Room".to_owned(),
                    display_name: "Living Room".to_owned(),
                },
                ReceiverDevice {
                    id: "Kitchen".to_owned(),
                    display_name: "Kitchen".to_owned(),
                },
            ],
        );
    }

    #[tokio::test]
    async fn test_scan_with_no_devices_is_not_an_error() {
        let (base, _request) = serve_once("200 OK", r#"{"devices":[]}"#).await;

        let devices = BackendClient::new(base).scan().await.unwrap();
        assert!(devices.is_empty());
    }

    #[tokio::test]
    async fn test_scan_surfaces_backend_failure() {
        let (base, _request) = serve_once("500 Internal Server Error", "scan blew up").await;

        match BackendClient::new(base).scan().await {
            Err(DiscoveryError::UnexpectedStatus { status, body }) => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "scan blew up");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cast_posts_device_and_url() {
        let (base, request) = serve_once("200 OK", "").await;

        BackendClient::new(base)
            .cast("Living Room", "http://panel.local/preview/42")
            .await
            .unwrap();

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /cast HTTP/1.1"));
        let json = raw.split("\r\n\r\n").nth(1).unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(json).unwrap(),
            serde_json::json!({
                "device": "Living Room",
                "url": "http://panel.local/preview/42",
            }),
        );
    }
}
