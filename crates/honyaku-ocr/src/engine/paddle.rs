use std::path::{Path, PathBuf};
use std::sync::Mutex;

use honyaku_config::ocr::OcrConfig;
use honyaku_types::{OcrFragment, SourceLanguage};
use image::{DynamicImage, RgbaImage};
use ocr_rs::{OcrEngine, OcrEngineConfig};

use crate::ocr::{ConfigurationError, ExtractionError, OcrBackend};

/// Detection model, shared by every language
const DET_MODEL: &str = "PP-OCRv5_mobile_det.mnn";

/// `(recognition model, charset)` for a source language
fn rec_files(language: SourceLanguage) -> (&'static str, &'static str) {
    match language {
        SourceLanguage::English => ("en_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_en.txt"),
        // The main v5 model covers CJK, Japanese included
        SourceLanguage::Japanese => ("PP-OCRv5_mobile_rec.mnn", "ppocr_keys_v5.txt"),
    }
}

fn require(path: PathBuf) -> Result<PathBuf, ConfigurationError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(ConfigurationError::MissingModel(path.display().to_string()))
    }
}

/// Inference settings. `None` keeps the library's CPU defaults.
fn engine_config(use_acceleration: bool) -> Option<OcrEngineConfig> {
    if use_acceleration {
        tracing::debug!("PP-OCR running on the GPU backend");
        Some(OcrEngineConfig::gpu())
    } else {
        None
    }
}

/// PP-OCR models through `ocr-rs`
pub struct PaddleOcr {
    engine: Mutex<OcrEngine>,
}

impl PaddleOcr {
    pub fn new(config: &OcrConfig) -> Result<Self, ConfigurationError> {
        let models_dir = Path::new(&config.model_dir);
        let (rec_model, charset) = rec_files(config.language);

        let det_path = require(models_dir.join(DET_MODEL))?;
        let rec_path = require(models_dir.join(rec_model))?;
        let charset_path = require(models_dir.join(charset))?;

        tracing::debug!(
            "Loading PP-OCR {} model ({})",
            config.language.paddle_code(),
            rec_model
        );
        let engine_config = engine_config(config.use_acceleration);
        let engine = OcrEngine::new(&det_path, &rec_path, &charset_path, engine_config)
            .map_err(|e| ConfigurationError::LoadFailed(e.to_string()))?;

        Ok(Self {
            engine: Mutex::new(engine),
        })
    }
}

impl OcrBackend for PaddleOcr {
    fn recognize(&self, image: &RgbaImage) -> Result<Vec<OcrFragment>, ExtractionError> {
        let image = DynamicImage::ImageRgba8(image.clone());
        let engine = self
            .engine
            .lock()
            .map_err(|_| ExtractionError::Engine("engine lock poisoned".to_string()))?;

        let results = engine
            .recognize(&image)
            .map_err(|e| ExtractionError::Engine(e.to_string()))?;

        Ok(results
            .into_iter()
            .map(|r| OcrFragment {
                text: r.text,
                bounds: Some((
                    r.bbox.rect.left() as i32,
                    r.bbox.rect.top() as i32,
                    r.bbox.rect.width() as u32,
                    r.bbox.rect.height() as u32,
                )),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "paddle"
    }
}
