use chrono::Utc;
use reqwest::multipart;
use serde_json::Value;

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};

/// Object-storage client for payment screenshots and trip media. Uploads go
/// through the provider's signed HTTP API; delivery URLs are computed
/// locally with an md5 token over key + expiry, so reads never hit the
/// provider.
#[derive(Clone)]
pub struct StorageService {
    api_url: String,
    delivery_url: String,
    api_key: String,
    api_secret: String,
    url_ttl_seconds: i64,
    client: reqwest::Client,
}

impl StorageService {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            api_url: config.api_url,
            delivery_url: config.delivery_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            api_secret: config.api_secret,
            url_ttl_seconds: config.url_ttl_seconds,
            client: reqwest::Client::new(),
        }
    }

    /// Uploads a blob under the given key and returns the stored key.
    pub async fn upload(&self, key: &str, bytes: &[u8], mime_type: &str) -> Result<String> {
        let timestamp = Utc::now().timestamp().to_string();

        let signature_data = format!("key={}&timestamp={}{}", key, timestamp, self.api_secret);
        let signature = format!("{:x}", md5::compute(signature_data));

        let form = multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("key", key.to_string())
            .part(
                "file",
                multipart::Part::bytes(bytes.to_vec())
                    .file_name(key.to_string())
                    .mime_str(mime_type)
                    .map_err(|e| AppError::storage(e.to_string()))?,
            );

        let response = self
            .client
            .post(&self.api_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::storage(format!("Upload failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::storage(format!("Storage API error: {}", error_text)));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| AppError::storage(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = result.get("error") {
            let error_msg = error["message"].as_str().unwrap_or("Unknown storage error");
            return Err(AppError::storage(error_msg.to_string()));
        }

        // Providers may rewrite the key (folder prefixes); trust theirs.
        let stored_key = result["key"].as_str().unwrap_or(key).to_string();

        Ok(stored_key)
    }

    /// Time-limited delivery URL for a stored key, using the configured TTL.
    pub fn signed_url(&self, key: &str) -> String {
        self.signed_url_with_ttl(key, self.url_ttl_seconds)
    }

    pub fn signed_url_with_ttl(&self, key: &str, ttl_seconds: i64) -> String {
        self.signed_url_at(key, Utc::now().timestamp() + ttl_seconds)
    }

    fn signed_url_at(&self, key: &str, expires_at: i64) -> String {
        let token = md5::compute(format!("{}{}{}", key, expires_at, self.api_secret));
        format!(
            "{}/{}?expires={}&token={:x}",
            self.delivery_url, key, expires_at, token
        )
    }
}
