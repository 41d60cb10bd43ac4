use crate::config::StorageConfig;
use crate::domain::ports::{Transport, TransportResponse};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

const DEFAULT_USER_AGENT: &str = concat!("rest-storage/", env!("CARGO_PKG_VERSION"));

/// The production transport: one pooled `reqwest::Client` per adapter.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wraps an already configured client, e.g. one with custom TLS roots.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_post_json_returns_raw_status_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/exists")
                    .header("content-type", "application/json")
                    .header_exists("user-agent")
                    .body(r#"{"key":"a","token":"t"}"#);
                then.status(200).body(r#"{"exists":true}"#);
            })
            .await;

        let config = StorageConfig::new(server.base_url(), "t")
            .with_request_timeout(Duration::from_secs(5));
        let transport = ReqwestTransport::new(&config).unwrap();

        let response = transport
            .post_json(
                &server.url("/exists"),
                br#"{"key":"a","token":"t"}"#.to_vec(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"exists":true}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_is_reported_not_raised() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/lock");
                then.status(412);
            })
            .await;

        let transport = ReqwestTransport::from_client(Client::new());
        let response = transport
            .post_json(&server.url("/lock"), b"{}".to_vec())
            .await
            .unwrap();

        assert_eq!(response.status, 412);
        assert!(response.body.is_empty());
    }
}
