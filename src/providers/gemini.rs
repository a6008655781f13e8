use async_trait::async_trait;
use serde_json::{json, Value};

use super::{FileModel, ProviderError};

const GENERATION_MODEL: &str = "gemini-1.5-flash";

/// MIME types Gemini ingests directly; anything else falls back to
/// inline extracted text at the call site.
pub const INGEST_MIMES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/webp",
];

/// Fixed polling schedule for uploaded-file activation. The loop is
/// bounded: after `MAX_POLL_ATTEMPTS` the whole generation fails.
const POLL_INTERVAL_MS: u64 = 1000;
const MAX_POLL_ATTEMPTS: u32 = 10;

const TIMEOUT_SECS: u64 = 120;

/// Gemini HTTP client: file upload, activation polling, generateContent.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    /// Upload raw bytes to the file endpoint. Returns (name, uri).
    async fn upload_file(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        display_name: &str,
    ) -> Result<(String, String), ProviderError> {
        let url = format!(
            "{}/upload/v1beta/files?key={}",
            self.base_url, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("X-Goog-Upload-Header-Content-Type", mime)
            .header("Content-Type", mime)
            .query(&[("file.display_name", display_name)])
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let body: Value = response.json().await?;
        let name = body["file"]["name"]
            .as_str()
            .ok_or_else(|| ProviderError::MalformedResponse("file upload: missing name".into()))?
            .to_string();
        let uri = body["file"]["uri"]
            .as_str()
            .ok_or_else(|| ProviderError::MalformedResponse("file upload: missing uri".into()))?
            .to_string();
        Ok((name, uri))
    }

    /// Poll the file resource until its state is ACTIVE. Fixed interval,
    /// hard attempt cap.
    async fn wait_until_active(&self, file_name: &str) -> Result<(), ProviderError> {
        for attempt in 1..=MAX_POLL_ATTEMPTS {
            let url = format!("{}/v1beta/{}?key={}", self.base_url, file_name, self.api_key);
            let response = self.client.get(&url).send().await?;

            if response.status().is_success() {
                let body: Value = response.json().await?;
                match body["state"].as_str() {
                    Some("ACTIVE") => return Ok(()),
                    Some("FAILED") => {
                        return Err(ProviderError::MalformedResponse(
                            "uploaded file entered FAILED state".into(),
                        ))
                    }
                    _ => {}
                }
            }

            tracing::debug!(file_name, attempt, "Uploaded file not yet active");
            tokio::time::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS)).await;
        }

        Err(ProviderError::FileNotActive {
            attempts: MAX_POLL_ATTEMPTS,
        })
    }

    async fn generate(&self, parts: Vec<Value>) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, GENERATION_MODEL, self.api_key
        );

        let body = json!({
            "contents": [{ "role": "user", "parts": parts }]
        });

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let body: Value = response.json().await?;
        extract_candidate_text(&body)
    }
}

fn extract_candidate_text(body: &Value) -> Result<String, ProviderError> {
    body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::MalformedResponse("no candidate text in response".into()))
}

#[async_trait]
impl FileModel for GeminiClient {
    fn accepts_mime(&self, mime: &str) -> bool {
        INGEST_MIMES.contains(&mime)
    }

    async fn generate_from_file(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        display_name: &str,
        instructions: &str,
    ) -> Result<String, ProviderError> {
        let (name, uri) = self.upload_file(bytes, mime, display_name).await?;
        self.wait_until_active(&name).await?;

        self.generate(vec![
            json!({ "text": instructions }),
            json!({ "file_data": { "mime_type": mime, "file_uri": uri } }),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_and_images_are_ingestible() {
        let client = GeminiClient::new("https://generativelanguage.googleapis.com", "key");
        assert!(client.accepts_mime("application/pdf"));
        assert!(client.accepts_mime("image/png"));
        assert!(!client.accepts_mime("application/vnd.openxmlformats-officedocument.wordprocessingml.document"));
        assert!(!client.accepts_mime("text/plain"));
    }

    #[test]
    fn candidate_text_extraction() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Patient-friendly text." }], "role": "model" }
            }]
        });
        assert_eq!(
            extract_candidate_text(&body).unwrap(),
            "Patient-friendly text."
        );
    }

    #[test]
    fn missing_candidate_is_malformed() {
        let body = json!({ "candidates": [] });
        assert!(matches!(
            extract_candidate_text(&body),
            Err(ProviderError::MalformedResponse(_))
        ));
    }
}
