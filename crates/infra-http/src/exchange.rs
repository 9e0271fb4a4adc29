// reqwest-backed RawExchange

use crate::config::HttpConfig;
use async_trait::async_trait;
use aurorax_core::application::ClassifyingTransport;
use aurorax_core::error::{AuroraXError, Result};
use aurorax_core::port::{BodyEncoding, HttpMethod, HttpTransport, RawExchange, RawRequest, RawResponse};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, Method};
use std::sync::Arc;
use tracing::debug;

/// One HTTP round trip over a shared reqwest client
///
/// Does not interpret status codes; that is the classifying transport's job.
#[derive(Debug, Clone)]
pub struct ReqwestExchange {
    client: Client,
}

impl ReqwestExchange {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AuroraXError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}

fn map_error(err: reqwest::Error) -> AuroraXError {
    if err.is_timeout() {
        AuroraXError::Timeout
    } else {
        AuroraXError::Transport(err.to_string())
    }
}

fn header_string(headers: &reqwest::header::HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl RawExchange for ReqwestExchange {
    async fn send(&self, request: &RawRequest) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(to_method(request.method), request.url.as_str());

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = match request.encoding {
                BodyEncoding::Serialized => builder.body(serde_json::to_string(body)?),
                BodyEncoding::Json => builder.json(body),
            };
        }

        debug!(method = %request.method, url = %request.url, "Sending request");
        let response = builder.send().await.map_err(map_error)?;

        let status = response.status().as_u16();
        let content_type = header_string(response.headers(), CONTENT_TYPE);
        let location = header_string(response.headers(), LOCATION);
        let body = response.text().await.map_err(map_error)?;

        debug!(status, content_type = ?content_type, "Received response");
        Ok(RawResponse {
            status,
            content_type,
            location,
            body,
        })
    }
}

/// Full transport stack for a configuration: reqwest exchange + classification
pub fn build_transport(config: &HttpConfig) -> Result<Arc<dyn HttpTransport>> {
    let exchange = Arc::new(ReqwestExchange::new(config)?);
    Ok(Arc::new(ClassifyingTransport::new(exchange, config.transport_settings())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_method(HttpMethod::Get), Method::GET);
        assert_eq!(to_method(HttpMethod::Post), Method::POST);
        assert_eq!(to_method(HttpMethod::Delete), Method::DELETE);
    }

    #[test]
    fn test_build_transport_from_default_config() {
        assert_ok!(build_transport(&HttpConfig::default()));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let exchange = assert_ok!(ReqwestExchange::new(&HttpConfig::default()));
        let request = RawRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:1/unreachable".to_string(),
            params: vec![],
            headers: vec![],
            body: None,
            encoding: BodyEncoding::Serialized,
        };

        let err = assert_err!(exchange.send(&request).await);
        assert!(matches!(err, AuroraXError::Transport(_)));
    }
}
