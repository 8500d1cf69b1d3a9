use anyhow::{Context, Result};
use honyaku_config::ocr::OcrConfig;
use honyaku_types::{OcrEngineKind, OcrFragment};
use image::RgbaImage;
use windows::{
    Globalization::Language,
    Graphics::Imaging::BitmapDecoder,
    Media::Ocr::OcrEngine as WinOcrEngine,
    Storage::Streams::{DataWriter, InMemoryRandomAccessStream},
    core::HSTRING,
};

use crate::capture::encode_png;
use crate::com::ComGuard;
use crate::ocr::{ConfigurationError, ExtractionError, OcrBackend};

/// `Windows.Media.Ocr`, needs the language pack of the source language
pub struct WindowsOcr {
    engine: WinOcrEngine,
}

impl WindowsOcr {
    pub fn new(config: &OcrConfig) -> Result<Self, ConfigurationError> {
        let unsupported = |reason: String| ConfigurationError::UnsupportedLanguage {
            engine: OcrEngineKind::Windows,
            language: config.language,
            reason,
        };

        if config.use_acceleration {
            tracing::debug!("Windows OCR has no acceleration switch, ignoring");
        }

        let language = Language::CreateLanguage(&HSTRING::from(config.language.bcp47()))
            .map_err(|e| unsupported(e.to_string()))?;

        if !WinOcrEngine::IsLanguageSupported(&language).unwrap_or(false) {
            return Err(unsupported("OCR language pack not installed".to_string()));
        }

        let engine = WinOcrEngine::TryCreateFromLanguage(&language)
            .map_err(|e| unsupported(e.to_string()))?;

        Ok(Self { engine })
    }

    fn recognize_png(&self, image_bytes: &[u8]) -> Result<Vec<OcrFragment>> {
        let _com = ComGuard::initialize()?;

        let stream = InMemoryRandomAccessStream::new().context("Failed to create stream")?;
        let writer = DataWriter::CreateDataWriter(&stream).context("Failed to create writer")?;

        writer
            .WriteBytes(image_bytes)
            .context("Failed to write image bytes")?;
        writer
            .StoreAsync()
            .context("Failed to store async")?
            .get()
            .context("Failed to store data")?;
        writer.FlushAsync().context("Failed to flush")?.get()?;

        stream.Seek(0).context("Failed to seek")?;

        let decoder = BitmapDecoder::CreateAsync(&stream)
            .context("Failed to create decoder async")?
            .get()
            .context("Failed to get decoder")?;

        let bitmap = decoder
            .GetSoftwareBitmapAsync()
            .context("Failed to get bitmap async")?
            .get()
            .context("Failed to get software bitmap")?;

        let result = self
            .engine
            .RecognizeAsync(&bitmap)
            .context("Failed to recognize async")?
            .get()
            .context("Failed to get OCR result")?;

        let mut fragments = Vec::new();
        for line in &result.Lines().context("Failed to get lines")? {
            let text = line.Text().context("Failed to get line text")?.to_string();
            fragments.push(OcrFragment::new(text));
        }
        Ok(fragments)
    }
}

impl OcrBackend for WindowsOcr {
    fn recognize(&self, image: &RgbaImage) -> Result<Vec<OcrFragment>, ExtractionError> {
        let png = encode_png(image).map_err(|e| ExtractionError::Image(e.to_string()))?;
        self.recognize_png(&png)
            .map_err(|e| ExtractionError::Engine(format!("{e:#}")))
    }

    fn name(&self) -> &'static str {
        "windows"
    }
}
