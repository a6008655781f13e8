use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Mailer, ProviderError};

const TIMEOUT_SECS: u64 = 30;

/// Resend transactional email client.
pub struct ResendClient {
    base_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl ResendClient {
    pub fn new(base_url: &str, api_key: &str, from: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
            client,
        }
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[async_trait]
impl Mailer for ResendClient {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<String, ProviderError> {
        let url = format!("{}/emails", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                to: [to],
                subject,
                html,
            })
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

        let body: SendEmailResponse = response.json().await?;
        Ok(body.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_serializes_resend_shape() {
        let body = SendEmailRequest {
            from: "summaries@careletter.example",
            to: ["patient@home.example"],
            subject: "Your visit summary",
            html: "<p>Hello</p>",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["from"], "summaries@careletter.example");
        assert_eq!(json["to"][0], "patient@home.example");
        assert!(json["html"].as_str().unwrap().contains("Hello"));
    }

    #[test]
    fn send_response_parses() {
        let raw = r#"{"id":"re_123"}"#;
        let parsed: SendEmailResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.id, "re_123");
    }
}
