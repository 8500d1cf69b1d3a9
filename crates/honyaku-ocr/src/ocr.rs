use std::fmt;
use std::sync::Arc;

use honyaku_config::ocr::OcrConfig;
use honyaku_types::{OcrEngineKind, OcrFragment, SourceLanguage};
use image::RgbaImage;

use crate::engine;

/// Separator placed between fragments
pub const FRAGMENT_SEPARATOR: char = ' ';

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("Image conversion failed: {0}")]
    Image(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{engine} OCR is not available in this build")]
    EngineUnavailable { engine: OcrEngineKind },

    #[error("{engine} OCR does not support {language}: {reason}")]
    UnsupportedLanguage {
        engine: OcrEngineKind,
        language: SourceLanguage,
        reason: String,
    },

    #[error("OCR model file missing: {0}")]
    MissingModel(String),

    #[error("OCR engine failed to load: {0}")]
    LoadFailed(String),
}

/// A loaded OCR model
pub trait OcrBackend: Send + Sync {
    /// Fragments in the engine's reading order
    fn recognize(&self, image: &RgbaImage) -> Result<Vec<OcrFragment>, ExtractionError>;

    fn name(&self) -> &'static str;
}

pub type BackendFactory =
    Arc<dyn Fn(&OcrConfig) -> Result<Box<dyn OcrBackend>, ConfigurationError> + Send + Sync>;

/// Build the backend named by `config.engine`
pub fn build_backend(config: &OcrConfig) -> Result<Box<dyn OcrBackend>, ConfigurationError> {
    match config.engine {
        OcrEngineKind::Windows => engine::windows_backend(config),
        OcrEngineKind::Paddle => engine::paddle_backend(config),
    }
}

/// Engines compiled into this build
pub fn available_engines() -> Vec<OcrEngineKind> {
    let mut engines = Vec::new();
    if cfg!(feature = "paddle") {
        engines.push(OcrEngineKind::Paddle);
    }
    if cfg!(windows) {
        engines.push(OcrEngineKind::Windows);
    }
    engines
}

/// The engine to load for `requested`: itself when it is compiled in,
/// otherwise the first engine that is. With no engine at all the request is
/// returned unchanged and fails to load with a clear error.
pub fn resolve_engine(requested: OcrEngineKind) -> OcrEngineKind {
    let available = available_engines();
    if available.contains(&requested) {
        return requested;
    }

    match available.first() {
        Some(&fallback) => {
            tracing::warn!(
                "{} OCR is not available in this build, using {} instead",
                requested,
                fallback
            );
            fallback
        }
        None => requested,
    }
}

/// Join fragments in the order given, without filtering
pub fn join_fragments(fragments: &[OcrFragment]) -> String {
    let mut text = String::new();
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            text.push(FRAGMENT_SEPARATOR);
        }
        text.push_str(&fragment.text);
    }
    text
}

/// OCR with a fixed configuration.
///
/// Loading a model is slow, so an extractor is built once per
/// engine/language choice and replaced as a whole by [`TextExtractor::rebuild`].
pub struct TextExtractor {
    config: OcrConfig,
    backend: Box<dyn OcrBackend>,
    factory: BackendFactory,
}

impl fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextExtractor")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl TextExtractor {
    pub fn new(config: OcrConfig) -> Result<Self, ConfigurationError> {
        Self::with_factory(config, Arc::new(build_backend))
    }

    pub fn with_factory(
        config: OcrConfig,
        factory: BackendFactory,
    ) -> Result<Self, ConfigurationError> {
        let started = std::time::Instant::now();
        let backend = factory(&config)?;
        tracing::info!(
            "OCR reader ready: {} for {} in {:?}",
            backend.name(),
            config.language,
            started.elapsed()
        );

        Ok(Self {
            config,
            backend,
            factory,
        })
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Build a replacement extractor for `config`. `self` is untouched, so
    /// on error the caller keeps using the current one.
    pub fn rebuild(&self, config: OcrConfig) -> Result<Self, ConfigurationError> {
        Self::with_factory(config, self.factory.clone())
    }

    /// Recognize `image`. Engine failures are logged and read as "no text".
    pub fn extract(&self, image: &RgbaImage) -> String {
        match self.backend.recognize(image) {
            Ok(fragments) => join_fragments(&fragments),
            Err(e) => {
                tracing::warn!(
                    "OCR failed on {}x{} frame: {}",
                    image.width(),
                    image.height(),
                    e
                );
                String::new()
            }
        }
    }
}
