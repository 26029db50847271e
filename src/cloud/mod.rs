pub mod memory;

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde_json::Value;

use crate::error::AppError;

pub use memory::InMemoryBlobStore;

/// A public JSON blob service: create, overwrite and read a document by an
/// opaque id. Knowing the id is the only credential.
///
/// Every failure, whether a non-success status, a network error or an
/// unreadable body, is reported as the operation's remote error.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `body` as a new blob and returns its id.
    async fn create(&self, body: &Value) -> Result<String, AppError>;
    async fn write(&self, id: &str, body: &Value) -> Result<(), AppError>;
    async fn read(&self, id: &str) -> Result<Value, AppError>;
}

#[derive(Clone, Debug)]
pub struct BlobStoreConfig {
    pub base_url: String,
}

impl BlobStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Client for a jsonblob-style HTTP API:
/// `POST {base}` creates, `PUT {base}/{id}` overwrites, `GET {base}/{id}` reads.
pub struct JsonBlobHttpClient {
    client: Client,
    config: BlobStoreConfig,
}

impl JsonBlobHttpClient {
    pub fn new(config: BlobStoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::BadRequest(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn blob_url(&self, id: &str) -> String {
        format!("{}/{}", self.config.base_url, id)
    }
}

async fn failure_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("status {}: {}", status, body)
}

/// The service returns the new id in `x-jsonblob-id`, or failing that as the
/// last path segment of `Location`.
fn blob_id_from_headers(headers: &header::HeaderMap) -> Option<String> {
    if let Some(id) = headers.get("x-jsonblob-id").and_then(|v| v.to_str().ok()) {
        return Some(id.to_string());
    }
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|loc| loc.trim_end_matches('/').rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl BlobStore for JsonBlobHttpClient {
    async fn create(&self, body: &Value) -> Result<String, AppError> {
        let response = self
            .client
            .post(&self.config.base_url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::RemoteInit(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::RemoteInit(failure_detail(response).await));
        }

        let id = blob_id_from_headers(response.headers())
            .ok_or_else(|| AppError::RemoteInit("response carried no blob id".to_string()))?;
        tracing::info!("created remote blob {}", id);
        Ok(id)
    }

    async fn write(&self, id: &str, body: &Value) -> Result<(), AppError> {
        let response = self
            .client
            .put(self.blob_url(id))
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::RemoteWrite(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::RemoteWrite(failure_detail(response).await));
        }
        Ok(())
    }

    async fn read(&self, id: &str) -> Result<Value, AppError> {
        let response = self
            .client
            .get(self.blob_url(id))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::RemoteRead(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::RemoteRead(failure_detail(response).await));
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| AppError::RemoteRead(e.to_string()))?;
        serde_json::from_str::<Value>(&body_text).map_err(|e| {
            tracing::error!("Failed to parse remote blob: {}", e);
            AppError::RemoteRead(format!("malformed JSON: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_id_prefers_dedicated_header() {
        let mut headers = header::HeaderMap::new();
        headers.insert("x-jsonblob-id", "abc123".parse().unwrap());
        headers.insert(
            header::LOCATION,
            "https://jsonblob.com/api/jsonBlob/other".parse().unwrap(),
        );
        assert_eq!(blob_id_from_headers(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_blob_id_falls_back_to_location() {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::LOCATION,
            "https://jsonblob.com/api/jsonBlob/1234567890/".parse().unwrap(),
        );
        assert_eq!(blob_id_from_headers(&headers).as_deref(), Some("1234567890"));

        assert_eq!(blob_id_from_headers(&header::HeaderMap::new()), None);
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = BlobStoreConfig::new("https://jsonblob.com/api/jsonBlob/");
        let client = JsonBlobHttpClient::new(config).unwrap();
        assert_eq!(
            client.blob_url("xyz"),
            "https://jsonblob.com/api/jsonBlob/xyz"
        );
    }
}
