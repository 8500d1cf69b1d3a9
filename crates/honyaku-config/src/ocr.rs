use honyaku_types::{OcrEngineKind, SourceLanguage};
use serde::{Deserialize, Serialize};

use crate::parse_or;

fn default_engine() -> OcrEngineKind {
    OcrEngineKind::Paddle
}

fn default_language() -> SourceLanguage {
    SourceLanguage::English
}

fn default_model_dir() -> String {
    "models".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    #[serde(default = "default_engine")]
    pub engine: OcrEngineKind,
    #[serde(default = "default_language")]
    pub language: SourceLanguage,
    /// Prefer GPU inference when the engine supports it
    pub use_acceleration: bool,
    /// Directory holding the PP-OCR model files
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            language: default_language(),
            use_acceleration: false,
            model_dir: default_model_dir(),
        }
    }
}

impl OcrConfig {
    pub(crate) fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            engine: parse_or(lookup, "OCR_ENGINE", default_engine()),
            language: parse_or(lookup, "OCR_LANGUAGE", default_language()),
            use_acceleration: parse_or(lookup, "OCR_USE_ACCELERATION", false),
            model_dir: lookup("OCR_MODEL_DIR").unwrap_or_else(default_model_dir),
        }
    }

    pub fn with_language(&self, language: SourceLanguage) -> Self {
        Self {
            language,
            ..self.clone()
        }
    }

    pub fn with_engine(&self, engine: OcrEngineKind) -> Self {
        Self {
            engine,
            ..self.clone()
        }
    }
}
