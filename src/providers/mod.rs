//! External AI and email providers behind trait seams.
//!
//! Handlers depend on the traits; the real clients live in the sibling
//! modules and are wired up once at startup. Tests substitute in-memory
//! fakes. No provider call is retried; a failure surfaces as a generic
//! 500 and the caller retries manually.

pub mod gemini;
pub mod openai;
pub mod resend;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ChatTurn;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Uploaded file never became active after {attempts} polls")]
    FileNotActive { attempts: u32 },
}

/// Text completion against a system prompt plus ordered turns.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String, ProviderError>;
}

/// Speech-to-text over a raw audio buffer.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String, ProviderError>;
}

/// Generation grounded in an uploaded file (document/image ingestion).
#[async_trait]
pub trait FileModel: Send + Sync {
    /// Whether this provider ingests the given MIME type directly.
    fn accepts_mime(&self, mime: &str) -> bool;

    async fn generate_from_file(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        display_name: &str,
        instructions: &str,
    ) -> Result<String, ProviderError>;
}

/// Transactional email. Returns the provider's message id.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<String, ProviderError>;
}

/// The full provider set held by the API context.
#[derive(Clone)]
pub struct Providers {
    pub text: Arc<dyn TextModel>,
    pub speech: Arc<dyn SpeechToText>,
    pub files: Arc<dyn FileModel>,
    pub mailer: Arc<dyn Mailer>,
}

impl Providers {
    /// Wire up the real clients from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        let openai = Arc::new(openai::OpenAiClient::new(
            &config.openai_base_url,
            &config.openai_api_key,
        ));
        Self {
            text: openai.clone(),
            speech: openai,
            files: Arc::new(gemini::GeminiClient::new(
                &config.gemini_base_url,
                &config.gemini_api_key,
            )),
            mailer: Arc::new(resend::ResendClient::new(
                &config.resend_base_url,
                &config.resend_api_key,
                &config.from_email,
            )),
        }
    }
}
