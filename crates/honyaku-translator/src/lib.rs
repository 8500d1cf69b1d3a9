use std::time::Duration;

use honyaku_types::{SourceLanguage, TargetLanguage, TranslationResult};

pub mod ollama;

pub use ollama::{DEFAULT_MODEL, OllamaTranslator, pick_model};

/// Translation provider interface
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` with the given model
    async fn translate(
        &self,
        text: &str,
        from: SourceLanguage,
        to: TargetLanguage,
        model: &str,
    ) -> Result<Translation, TranslateError>;

    /// Model identifiers the backend can serve
    async fn list_models(&self) -> Result<Vec<String>, TranslateError>;

    /// Provider metadata
    fn metadata(&self) -> ProviderMetadata;
}

#[derive(Debug, Clone)]
pub struct Translation {
    pub text: String,
    pub from: SourceLanguage,
    pub to: TargetLanguage,
    pub model: String,
    pub latency: Duration,
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub endpoint: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("cannot reach {url} (is the server running?): {reason}")]
    Unreachable { url: String, reason: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Flatten a translation outcome into the value shown to the user
pub fn into_result(outcome: Result<Translation, TranslateError>) -> TranslationResult {
    match outcome {
        Ok(translation) => TranslationResult::Translated(translation.text),
        Err(e) => TranslationResult::Failed(e.to_string()),
    }
}
