//! HTTP plumbing shared by exchange adapters.
//!
//! Every failure is mapped onto one of the two Trading API kinds using the
//! exchange's [`NetworkConfig`]: transport problems and configured
//! non-fatal codes/messages become `Network`, everything else `Api`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::{TradingApiError, TradingApiResult};
use crate::config::NetworkConfig;

/// Map an HTTP error response to a Trading API error.
pub fn classify_status(network: &NetworkConfig, status: StatusCode, body: &str) -> TradingApiError {
    let message = format!("HTTP {} - {}", status, body);
    if network.is_non_fatal(Some(status.as_u16()), body) {
        TradingApiError::Network(message)
    } else {
        TradingApiError::Api(message)
    }
}

/// Map a transport-level failure. Timeouts and connection failures are
/// always transient; other failures only when the message matches.
pub fn classify_transport(network: &NetworkConfig, err: &reqwest::Error) -> TradingApiError {
    let message = err.to_string();
    if err.is_timeout() || err.is_connect() || network.is_non_fatal(None, &message) {
        TradingApiError::Network(message)
    } else {
        TradingApiError::Api(message)
    }
}

/// HTTP client for one exchange, built from its network settings.
pub struct ExchangeHttpClient {
    client: Client,
    network: NetworkConfig,
    base_url: String,
}

impl ExchangeHttpClient {
    pub fn new(base_url: impl Into<String>, network: NetworkConfig) -> TradingApiResult<Self> {
        let timeout = Duration::from_secs(network.connection_timeout);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| TradingApiError::api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            network,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> TradingApiResult<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_transport(&self.network, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(&self.network, status, &body);
            warn!(status = %status, error = %err, "Exchange request failed");
            return Err(err);
        }

        let text = response
            .text()
            .await
            .map_err(|e| classify_transport(&self.network, &e))?;
        serde_json::from_str(&text).map_err(|e| {
            TradingApiError::api(format!("Failed to parse exchange response: {} - {}", e, text))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde::Deserialize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one request and answer it with `status_line` and a JSON
    /// `body`. Returns the base URL and the raw request text.
    pub(crate) async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "{}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&received).to_string()
        });

        (base_url, handle)
    }

    #[derive(Debug, Deserialize)]
    struct Last {
        last: String,
    }

    fn network() -> NetworkConfig {
        NetworkConfig {
            connection_timeout: 5,
            non_fatal_error_codes: vec![502, 503, 504, 520, 522, 525],
            non_fatal_error_messages: vec![
                "Connection refused".to_string(),
                "Remote host closed connection during handshake".to_string(),
            ],
        }
    }

    #[test]
    fn test_configured_status_is_network() {
        let err = classify_status(&network(), StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.is_network());
        assert!(err.detail().contains("502"));
    }

    #[test]
    fn test_configured_message_is_network() {
        let err = classify_status(
            &network(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "Connection refused by peer",
        );
        assert!(err.is_network());
    }

    #[test]
    fn test_other_status_is_api() {
        let err = classify_status(&network(), StatusCode::BAD_REQUEST, "Invalid nonce");
        assert_eq!(
            err,
            TradingApiError::Api("HTTP 400 Bad Request - Invalid nonce".to_string())
        );
    }

    #[test]
    fn test_default_network_is_always_api() {
        let err = classify_status(&NetworkConfig::default(), StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(!err.is_network());
    }

    #[test]
    fn test_client_builds_without_network_section() {
        let client = ExchangeHttpClient::new("https://example.invalid/", NetworkConfig::default());
        assert!(client.is_ok());
        assert_eq!(
            client.unwrap().url("/api/v2/balance"),
            "https://example.invalid/api/v2/balance"
        );
    }

    #[tokio::test]
    async fn test_get_json_decodes_body() {
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", r#"{"last":"1234.5"}"#).await;
        let client = ExchangeHttpClient::new(base_url, network()).unwrap();

        let ticker: Last = client.get_json("/ticker/btcusd").await.unwrap();
        assert_eq!(ticker.last, "1234.5");
        assert!(server.await.unwrap().starts_with("GET /ticker/btcusd"));
    }

    #[tokio::test]
    async fn test_get_json_configured_status_is_network() {
        let (base_url, server) =
            serve_once("HTTP/1.1 503 Service Unavailable", r#"{"error":"maintenance"}"#).await;
        let client = ExchangeHttpClient::new(base_url, network()).unwrap();

        let err = client.get_json::<Last>("/ticker/btcusd").await.unwrap_err();
        assert!(err.is_network());
        assert!(err.detail().contains("503"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_json_rejected_request_is_api() {
        let (base_url, server) =
            serve_once("HTTP/1.1 400 Bad Request", r#"{"error":"Invalid nonce"}"#).await;
        let client = ExchangeHttpClient::new(base_url, network()).unwrap();

        let err = client.get_json::<Last>("/ticker/btcusd").await.unwrap_err();
        assert!(matches!(err, TradingApiError::Api(ref msg) if msg.contains("Invalid nonce")));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_json_undecodable_body_is_api() {
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", "not json").await;
        let client = ExchangeHttpClient::new(base_url, network()).unwrap();

        let err = client.get_json::<Last>("/ticker/btcusd").await.unwrap_err();
        assert!(!err.is_network());
        server.await.unwrap();
    }
}
