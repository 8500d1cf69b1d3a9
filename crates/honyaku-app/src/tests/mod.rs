//! Pipeline and scheduler tests against fake capture, OCR and translation

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use honyaku_config::ocr::OcrConfig;
use honyaku_ocr::{
    BackendFactory, CaptureError, ConfigurationError, ExtractionError, FrameSource, OcrBackend,
    TextExtractor,
};
use honyaku_translator::{ProviderMetadata, TranslateError, Translation, Translator};
use honyaku_types::{CaptureRegion, OcrFragment, OverlayEvent, SourceLanguage, TargetLanguage};
use image::RgbaImage;
use kanal::Receiver;

use crate::overlay::{ChannelPresenter, OverlayPresenter};
use crate::pipeline::Pipeline;


/// Capture that succeeds unless told to fail the next calls
#[derive(Default)]
pub struct FakeFrames {
    failures: Mutex<VecDeque<CaptureError>>,
    captured: Mutex<Vec<CaptureRegion>>,
}

impl FakeFrames {
    pub fn fail_next(&self, error: CaptureError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn captured(&self) -> Vec<CaptureRegion> {
        self.captured.lock().unwrap().clone()
    }
}

impl FrameSource for FakeFrames {
    fn capture(&self, region: CaptureRegion) -> Result<RgbaImage, CaptureError> {
        self.captured.lock().unwrap().push(region);
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(RgbaImage::new(region.width.max(1), region.height.max(1)))
    }
}

/// Text the OCR fake reports, one entry per call. The last entry repeats.
#[derive(Default)]
pub struct OcrScript {
    texts: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl OcrScript {
    pub fn new(texts: &[&str]) -> Arc<Self> {
        let script = Arc::new(Self::default());
        script.push(texts);
        script
    }

    pub fn push(&self, texts: &[&str]) {
        let mut queue = self.texts.lock().unwrap();
        queue.extend(texts.iter().map(|t| t.to_string()));
    }

    fn next(&self) -> String {
        let mut last = self.last.lock().unwrap();
        if let Some(text) = self.texts.lock().unwrap().pop_front() {
            *last = text;
        }
        last.clone()
    }
}

struct ScriptedOcr {
    script: Arc<OcrScript>,
    language: SourceLanguage,
}

impl OcrBackend for ScriptedOcr {
    fn recognize(&self, _image: &RgbaImage) -> Result<Vec<OcrFragment>, ExtractionError> {
        let text = self.script.next();
        if text == "!crash" {
            return Err(ExtractionError::Engine("scripted crash".to_string()));
        }
        Ok(text
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(OcrFragment::new)
            .collect())
    }

    fn name(&self) -> &'static str {
        match self.language {
            SourceLanguage::English => "scripted-en",
            SourceLanguage::Japanese => "scripted-ja",
        }
    }
}

/// Extractor over `script`. Japanese fails to load when `japanese_available`
/// is false.
pub fn scripted_extractor(script: Arc<OcrScript>, japanese_available: bool) -> TextExtractor {
    let factory: BackendFactory = Arc::new(
        move |config: &OcrConfig| -> Result<Box<dyn OcrBackend>, ConfigurationError> {
            if config.language == SourceLanguage::Japanese && !japanese_available {
                return Err(ConfigurationError::UnsupportedLanguage {
                    engine: config.engine,
                    language: config.language,
                    reason: "language pack not installed".to_string(),
                });
            }
            Ok(Box::new(ScriptedOcr {
                script: script.clone(),
                language: config.language,
            }))
        },
    );
    TextExtractor::with_factory(OcrConfig::default(), factory).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslateCall {
    pub text: String,
    pub from: SourceLanguage,
    pub to: TargetLanguage,
    pub model: String,
}

/// Translator that records every call and answers `"<to>:<text>"`
#[derive(Default)]
pub struct CountingTranslator {
    calls: Mutex<Vec<TranslateCall>>,
    failures: Mutex<VecDeque<TranslateError>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl CountingTranslator {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn fail_next(&self, error: TranslateError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn calls(&self) -> Vec<TranslateCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of requests that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Translator for CountingTranslator {
    async fn translate(
        &self,
        text: &str,
        from: SourceLanguage,
        to: TargetLanguage,
        model: &str,
    ) -> Result<Translation, TranslateError> {
        self.calls.lock().unwrap().push(TranslateCall {
            text: text.to_string(),
            from,
            to,
            model: model.to_string(),
        });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(error) = failure {
            return Err(error);
        }

        Ok(Translation {
            text: format!("{to}:{text}"),
            from,
            to,
            model: model.to_string(),
            latency: Duration::ZERO,
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, TranslateError> {
        Ok(vec!["fake:latest".to_string()])
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "counting".to_string(),
            endpoint: "memory".to_string(),
        }
    }
}

/// Everything a test needs to drive and observe a pipeline
pub struct Harness {
    pub frames: Arc<FakeFrames>,
    pub script: Arc<OcrScript>,
    pub translator: Arc<CountingTranslator>,
    pub presenter: Arc<dyn OverlayPresenter>,
    pub events: Receiver<OverlayEvent>,
}

impl Harness {
    pub fn new(texts: &[&str]) -> Self {
        Self::with_translator(texts, CountingTranslator::default())
    }

    pub fn with_translator(texts: &[&str], translator: CountingTranslator) -> Self {
        let (tx, events) = kanal::unbounded();
        Self {
            frames: Arc::new(FakeFrames::default()),
            script: OcrScript::new(texts),
            translator: Arc::new(translator),
            presenter: Arc::new(ChannelPresenter::new(tx)),
            events,
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_with(true)
    }

    pub fn pipeline_with(&self, japanese_available: bool) -> Pipeline {
        Pipeline::new(
            self.frames.clone(),
            scripted_extractor(self.script.clone(), japanese_available),
            self.translator.clone(),
            self.presenter.clone(),
            TargetLanguage::TraditionalChinese,
            "fake:latest".to_string(),
        )
    }

    /// Everything presented since the last drain
    pub fn drain(&self) -> Vec<OverlayEvent> {
        std::iter::from_fn(|| self.events.try_recv().ok().flatten()).collect()
    }

    /// Only the text updates since the last drain
    pub fn shown_texts(&self) -> Vec<String> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                OverlayEvent::SetText(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

pub fn region(left: i32, top: i32, width: u32, height: u32) -> CaptureRegion {
    CaptureRegion {
        top,
        left,
        width,
        height,
    }
}
