use std::sync::Arc;
use std::time::SystemTime;

use honyaku_config::ocr::OcrConfig;
use honyaku_core::ChangeDetector;
use honyaku_ocr::{CaptureError, ConfigurationError, FrameSource, TextExtractor};
use honyaku_translator::{Translator, into_result};
use honyaku_types::{CaptureRegion, TargetLanguage, TranslationResult};

use crate::overlay::OverlayPresenter;
use crate::status::PipelineStatus;

/// Shown in place of a translation while the region holds no text
pub const NO_TEXT_MESSAGE: &str = "No text detected";

/// What a single pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// New text was translated and shown
    Translated,
    /// Translation was attempted and its error shown
    TranslationFailed,
    /// Text equal to the last translated text, nothing sent
    Unchanged,
    /// OCR found nothing, the notice is shown
    Empty,
    /// The region could not be captured, the error is shown
    CaptureFailed,
}

enum Recognition {
    Text(String),
    CaptureFailed(CaptureError),
}

/// capture -> recognize -> deduplicate -> translate -> display
pub struct Pipeline {
    frames: Arc<dyn FrameSource>,
    extractor: Arc<TextExtractor>,
    translator: Arc<dyn Translator>,
    presenter: Arc<dyn OverlayPresenter>,
    detector: ChangeDetector,
    target: TargetLanguage,
    model: String,
    /// Text shown by the last translation, restored after a transient error
    last_shown: Option<String>,
    /// Error or notice currently covering `last_shown`
    notice: Option<String>,
    status: PipelineStatus,
}

impl Pipeline {
    pub fn new(
        frames: Arc<dyn FrameSource>,
        extractor: TextExtractor,
        translator: Arc<dyn Translator>,
        presenter: Arc<dyn OverlayPresenter>,
        target: TargetLanguage,
        model: String,
    ) -> Self {
        Self {
            frames,
            extractor: Arc::new(extractor),
            translator,
            presenter,
            detector: ChangeDetector::new(),
            target,
            model,
            last_shown: None,
            notice: None,
            status: PipelineStatus::default(),
        }
    }

    pub fn status(&self) -> &PipelineStatus {
        &self.status
    }

    pub fn previous_text(&self) -> &str {
        self.detector.previous()
    }

    pub fn ocr_config(&self) -> &OcrConfig {
        self.extractor.config()
    }

    pub fn target(&self) -> TargetLanguage {
        self.target
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_target(&mut self, target: TargetLanguage) {
        self.target = target;
    }

    pub fn set_model(&mut self, model: String) {
        self.model = model;
    }

    /// Swap in an extractor built for `config`. The model is loaded off the
    /// async thread; on failure the current extractor stays in place.
    pub async fn reconfigure_ocr(&mut self, config: OcrConfig) -> Result<(), ConfigurationError> {
        if *self.extractor.config() == config {
            return Ok(());
        }

        let current = self.extractor.clone();
        let rebuilt = tokio::task::spawn_blocking(move || current.rebuild(config))
            .await
            .map_err(|e| ConfigurationError::LoadFailed(format!("model loader crashed: {e}")))??;

        self.extractor = Arc::new(rebuilt);
        Ok(())
    }

    async fn recognize(&self, region: CaptureRegion) -> Recognition {
        let frames = self.frames.clone();
        let extractor = self.extractor.clone();

        let joined = tokio::task::spawn_blocking(move || {
            let frame = frames.capture(region)?;
            Ok::<_, CaptureError>(extractor.extract(&frame))
        })
        .await;

        match joined {
            Ok(Ok(text)) => Recognition::Text(text),
            Ok(Err(e)) => Recognition::CaptureFailed(e),
            Err(e) => {
                tracing::error!("OCR task crashed: {}", e);
                Recognition::Text(String::new())
            }
        }
    }

    fn show(&self, text: &str) {
        self.presenter.set_text(text);
    }

    fn show_notice(&mut self, message: String) {
        self.show(&message);
        self.notice = Some(message);
    }

    /// Run one full pass over `region`
    pub async fn tick(&mut self, region: CaptureRegion) -> TickOutcome {
        self.status.ticks += 1;
        self.status.last_capture_time = Some(SystemTime::now());

        let text = match self.recognize(region).await {
            Recognition::Text(text) => text,
            Recognition::CaptureFailed(e) => {
                tracing::warn!("Capture failed: {}", e);
                self.status.capture_errors += 1;
                self.show_notice(format!("Error: {e}"));
                return TickOutcome::CaptureFailed;
            }
        };

        tracing::debug!("Extracted text: {}", text);

        if text.is_empty() {
            tracing::debug!("No text detected in the image");
            if self.notice.as_deref() != Some(NO_TEXT_MESSAGE) {
                self.show_notice(NO_TEXT_MESSAGE.to_string());
            }
            return TickOutcome::Empty;
        }

        if !self.detector.should_translate(&text) {
            tracing::trace!("No new text detected");
            if self.notice.take().is_some()
                && let Some(last) = self.last_shown.clone()
            {
                self.show(&last);
            }
            return TickOutcome::Unchanged;
        }

        self.detector.record(&text);

        let source = self.extractor.config().language;
        let result = into_result(
            self.translator
                .translate(&text, source, self.target, &self.model)
                .await,
        );

        let outcome = match &result {
            TranslationResult::Translated(_) => {
                self.status.translations += 1;
                TickOutcome::Translated
            }
            TranslationResult::Failed(reason) => {
                tracing::warn!("Translation failed: {}", reason);
                self.status.translation_errors += 1;
                TickOutcome::TranslationFailed
            }
        };

        let shown = result.display_text();
        self.show(&shown);
        self.last_shown = Some(shown);
        self.notice = None;

        outcome
    }
}
