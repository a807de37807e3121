//! Blob store speaking plain HTTP verbs against an object bucket endpoint
//! (R2/S3 public bucket behind an authenticating proxy, MinIO, ...).

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use super::blob::{BlobError, BlobObject, BlobStore};

const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

pub struct HttpBlobStore {
    client: Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl HttpBlobStore {
    pub fn new(endpoint: &str, bearer_token: Option<String>) -> Self {
        Self::with_client(Client::new(), endpoint, bearer_token)
    }

    pub fn with_client(client: Client, endpoint: &str, bearer_token: Option<String>) -> Self {
        Self { client, endpoint: endpoint.trim_end_matches('/').to_string(), bearer_token }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint, key)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

fn remote(e: reqwest::Error) -> BlobError {
    BlobError::Remote(e.to_string())
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn head(&self, key: &str) -> Result<bool, BlobError> {
        let resp = self.authorize(self.client.head(self.url(key))).send().await.map_err(remote)?;
        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(BlobError::Status { status: s.as_u16(), key: key.to_string() }),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<BlobObject>, BlobError> {
        let resp = self.authorize(self.client.get(self.url(key))).send().await.map_err(remote)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let content_type = resp
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = resp.bytes().await.map_err(remote)?.to_vec();
                Ok(Some(BlobObject { body, content_type }))
            }
            s => Err(BlobError::Status { status: s.as_u16(), key: key.to_string() }),
        }
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        let len = body.len();
        let resp = self
            .authorize(self.client.put(self.url(key)))
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL)
            .body(body)
            .send()
            .await
            .map_err(remote)?;
        if !resp.status().is_success() {
            return Err(BlobError::Status { status: resp.status().as_u16(), key: key.to_string() });
        }
        debug!(%key, bytes = len, "blob uploaded");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let resp = self.authorize(self.client.delete(self.url(key))).send().await.map_err(remote)?;
        match resp.status() {
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            s => Err(BlobError::Status { status: s.as_u16(), key: key.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_object_urls() {
        let store = HttpBlobStore::new("https://bucket.example.com/avatars/", None);
        assert_eq!(store.url("3.webp"), "https://bucket.example.com/avatars/3.webp");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        // port 9 (discard) on loopback is closed in test environments
        let store = HttpBlobStore::new("http://127.0.0.1:9", None);
        assert!(store.head("1.webp").await.is_err());
    }
}
