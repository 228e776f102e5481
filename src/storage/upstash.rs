use crate::{
    config::UpstashConfig,
    error::{ImageMakerError, Result},
    storage::traits::ResultStore,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Result store on Upstash Redis, spoken to through its REST command endpoint.
pub struct UpstashResultStore {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl UpstashResultStore {
    pub async fn new(config: UpstashConfig) -> Result<Self> {
        let store = Self::connect(config)?;

        // Test connection
        store.health_check().await?;

        Ok(store)
    }

    /// Builds the store without a round trip.
    pub fn connect(config: UpstashConfig) -> Result<Self> {
        let base_url = config
            .url
            .ok_or_else(|| ImageMakerError::ConfigError("Upstash URL is required".into()))?;

        let token = config
            .token
            .ok_or_else(|| ImageMakerError::ConfigError("Upstash token is required".into()))?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn build_headers(&self) -> Result<reqwest::header::HeaderMap> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", self.token)
            .parse()
            .map_err(|e| ImageMakerError::ConfigError(format!("Invalid Upstash token: {}", e)))?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    async fn command(&self, args: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.base_url)
            .headers(self.build_headers()?)
            .json(&args)
            .send()
            .await
            .map_err(|e| ImageMakerError::StorageError(format!("Upstash request failed: {}", e)))?;

        let status = response.status();
        let body: CommandResponse = response
            .json()
            .await
            .map_err(|e| ImageMakerError::StorageError(format!("Upstash response unreadable: {}", e)))?;

        if let Some(error) = body.error {
            return Err(ImageMakerError::StorageError(format!(
                "Upstash command failed ({}): {}",
                status.as_u16(),
                error
            )));
        }
        if !status.is_success() {
            return Err(ImageMakerError::StorageError(format!(
                "Upstash command failed with status {}",
                status.as_u16()
            )));
        }

        Ok(body.result)
    }

    pub async fn health_check(&self) -> Result<bool> {
        let result = self.command(json!(["PING"])).await?;
        Ok(result.as_str() == Some("PONG"))
    }
}

#[async_trait]
impl ResultStore for UpstashResultStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.command(json!(["GET", key])).await? {
            Value::Null => Ok(None),
            Value::String(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            other => Err(ImageMakerError::StorageError(format!(
                "Unexpected GET result for {}: {}",
                key, other
            ))),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        let encoded = serde_json::to_string(&value)?;
        let secs = ttl.as_secs().max(1).to_string();
        self.command(json!(["SET", key, encoded, "EX", secs])).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.command(json!(["DEL", key])).await?;
        Ok(removed.as_i64().unwrap_or(0) > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> UpstashResultStore {
        UpstashResultStore::connect(UpstashConfig::new().with_credentials(server.uri(), "tok"))
            .unwrap()
    }

    #[test]
    fn test_missing_credentials() {
        assert!(UpstashResultStore::connect(UpstashConfig::new()).is_err());
    }

    #[tokio::test]
    async fn test_set_sends_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!([
                "SET",
                "task_result_1_2",
                "{\"status\":\"processing\"}",
                "EX",
                "3600"
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "OK"})))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server)
            .set(
                "task_result_1_2",
                json!({"status": "processing"}),
                Duration::from_secs(3600),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_decodes_stored_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!(["GET", "k"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"result": "{\"status\":\"success\",\"image_id\":4}"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(json!(["GET", "gone"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": null})))
            .mount(&server)
            .await;

        let store = store_for(&server);
        assert_eq!(
            store.get("k").await.unwrap(),
            Some(json!({"status": "success", "image_id": 4}))
        );
        assert_eq!(store.get("gone").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_error_reply_is_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized"})),
            )
            .mount(&server)
            .await;

        let err = store_for(&server).get("k").await.unwrap_err();
        assert!(err.to_string().contains("Unauthorized"));
    }
}
