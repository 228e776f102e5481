use crate::{
    config::IdeogramConfig,
    error::{ImageMakerError, Result},
    ideogram::traits::ImageProvider,
    models::{image::WrappedImageRequest, GenerateResponse, GenerationRequest, GeneratorKind},
};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// HTTP client for the Ideogram generate endpoint.
///
/// The underlying session is opened on first use and reopened after `close`.
/// Opening happens under a lock, so concurrent first calls share one session.
pub struct IdeogramClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    session: Mutex<Option<Client>>,
    sessions_opened: AtomicUsize,
}

impl IdeogramClient {
    pub fn new(config: &IdeogramConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ImageMakerError::ConfigError("Ideogram API key is required".into()))?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
            session: Mutex::new(None),
            sessions_opened: AtomicUsize::new(0),
        })
    }

    fn build_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(&self.api_key)
            .map_err(|e| ImageMakerError::ConfigError(format!("Invalid API key header: {}", e)))?;
        headers.insert(header::HeaderName::from_static("api-key"), key);
        Ok(headers)
    }

    async fn session(&self) -> Result<Client> {
        let mut guard = self.session.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .default_headers(self.build_headers()?)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ImageMakerError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        log::debug!("Opened Ideogram session to {}", self.base_url);
        *guard = Some(client.clone());
        Ok(client)
    }

    /// Number of sessions opened over this client's lifetime.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub async fn is_open(&self) -> bool {
        self.session.lock().await.is_some()
    }
}

#[async_trait]
impl ImageProvider for IdeogramClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerateResponse> {
        let session = self.session().await?;
        let body = serde_json::to_string(&WrappedImageRequest {
            image_request: request,
        })?;

        log::debug!("Ideogram request payload: {}", body);

        let response = session
            .post(format!("{}/generate", self.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ImageMakerError::RequestError(format!("Ideogram request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            log::warn!("Ideogram returned HTTP {}: {}", status.as_u16(), error_text);
            return Err(ImageMakerError::ProviderStatus {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ImageMakerError::RequestError(format!("Failed to read response: {}", e)))?;

        serde_json::from_str::<GenerateResponse>(&text)
            .map_err(|e| ImageMakerError::ProviderResponse(format!("Unexpected response shape: {}", e)))
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Ideogram
    }

    async fn close(&self) {
        if self.session.lock().await.take().is_some() {
            log::debug!("Closed Ideogram session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdeogramDetails;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> IdeogramClient {
        let config = IdeogramConfig::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());
        IdeogramClient::new(&config).unwrap()
    }

    fn one_image_body() -> serde_json::Value {
        json!({
            "created": "2024-08-01T12:00:00Z",
            "data": [{
                "url": "http://x/img.png",
                "prompt": "a red fox",
                "resolution": "1024x1024",
                "is_image_safe": true,
                "seed": 1
            }]
        })
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = IdeogramClient::new(&IdeogramConfig::new()).err().unwrap();
        assert!(matches!(err, ImageMakerError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_generate_sends_wrapped_request_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header_matcher("api-key", "test-key"))
            .and(header_matcher("content-type", "application/json"))
            .and(body_json(json!({"image_request": {"prompt": "a red fox"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(one_image_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = GenerationRequest::new("a red fox", &IdeogramDetails::default()).unwrap();
        let response = client.generate(&request).await.unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].url, "http://x/img.png");
    }

    #[tokio::test]
    async fn test_non_200_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = GenerationRequest::new("a red fox", &IdeogramDetails::default()).unwrap();
        match client.generate(&request).await {
            Err(ImageMakerError::ProviderStatus { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected ProviderStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "nope"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = GenerationRequest::new("a red fox", &IdeogramDetails::default()).unwrap();
        let err = client.generate(&request).await.unwrap_err();
        assert!(matches!(err, ImageMakerError::ProviderResponse(_)));
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_open_one_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(one_image_body()))
            .mount(&server)
            .await;

        let client = Arc::new(client_for(&server));
        let request = GenerationRequest::new("a red fox", &IdeogramDetails::default()).unwrap();

        let calls = (0..8).map(|_| {
            let client = Arc::clone(&client);
            let request = request.clone();
            tokio::spawn(async move { client.generate(&request).await })
        });
        for call in futures::future::join_all(calls).await {
            assert!(call.unwrap().is_ok());
        }

        assert_eq!(client.sessions_opened(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_session_reopens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(one_image_body()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.close().await;
        assert!(!client.is_open().await);

        let request = GenerationRequest::new("a red fox", &IdeogramDetails::default()).unwrap();
        client.generate(&request).await.unwrap();
        assert!(client.is_open().await);

        client.close().await;
        client.close().await;
        assert!(!client.is_open().await);

        client.generate(&request).await.unwrap();
        assert_eq!(client.sessions_opened(), 2);
    }
}
