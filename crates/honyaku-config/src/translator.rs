use honyaku_types::TargetLanguage;
use serde::{Deserialize, Serialize};

use crate::parse_or;

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "gemma2:latest".to_string()
}

fn default_target_language() -> TargetLanguage {
    TargetLanguage::TraditionalChinese
}

fn default_temperature() -> f32 {
    0.1
}

fn default_num_ctx() -> u32 {
    1024
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Root of the text-generation service
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Preferred model, also the fallback when listing fails
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_target_language")]
    pub target_language: TargetLanguage,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Context window cap in tokens
    #[serde(default = "default_num_ctx")]
    pub num_ctx: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            target_language: default_target_language(),
            temperature: default_temperature(),
            num_ctx: default_num_ctx(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl TranslatorConfig {
    pub(crate) fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            base_url: lookup("OLLAMA_URL").unwrap_or_else(default_base_url),
            model: lookup("TRANSLATION_MODEL").unwrap_or_else(default_model),
            target_language: parse_or(lookup, "TARGET_LANGUAGE", default_target_language()),
            temperature: default_temperature(),
            num_ctx: default_num_ctx(),
            timeout_seconds: parse_or(lookup, "TIMEOUT_SECONDS", default_timeout_seconds()),
        }
    }
}
