use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rectangle in logical (DPI-independent) pixels, as drawn by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl LogicalRect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a normalized rectangle from the two corners of a drag,
    /// whichever direction the drag went.
    /// Extents that do not fit in `i32` saturate.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            left: a.0.min(b.0),
            top: a.1.min(b.1),
            width: i32::try_from(a.0.abs_diff(b.0)).unwrap_or(i32::MAX),
            height: i32::try_from(a.1.abs_diff(b.1)).unwrap_or(i32::MAX),
        }
    }

    /// Same rectangle with non-negative extents. `None` when the corner
    /// opposite `(left, top)` is outside the `i32` range.
    pub fn normalized(&self) -> Option<Self> {
        let right = self.left.checked_add(self.width)?;
        let bottom = self.top.checked_add(self.height)?;
        Some(Self::from_corners((self.left, self.top), (right, bottom)))
    }

    pub fn is_normalized(&self) -> bool {
        self.width >= 0 && self.height >= 0
    }
}

/// Screen region in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub top: i32,
    pub left: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }
}

/// Display scale: DPI scale multiplied by the user-adjustable percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub const MIN_PERCENT: u32 = 100;
    pub const MAX_PERCENT: u32 = 300;

    /// Combine the display DPI scale with a user percentage.
    /// The percentage is clamped to `[100, 300]`, a non-positive DPI scale
    /// is treated as `1.0`.
    pub fn new(dpi_scale: f64, percent: u32) -> Self {
        let dpi_scale = if dpi_scale.is_finite() && dpi_scale > 0.0 {
            dpi_scale
        } else {
            1.0
        };
        let percent = percent.clamp(Self::MIN_PERCENT, Self::MAX_PERCENT);
        Self(dpi_scale * percent as f64 / 100.0)
    }

    pub fn from_percent(percent: u32) -> Self {
        Self::new(1.0, percent)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Size of the primary display in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub width: i32,
    pub height: i32,
}

/// Placement of the translation overlay in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayLayout {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One piece of OCR output, in the order the engine reported it
#[derive(Debug, Clone, PartialEq)]
pub struct OcrFragment {
    pub text: String,
    /// `(x, y, width, height)` inside the captured frame, when the engine reports it
    pub bounds: Option<(i32, i32, u32, u32)>,
}

impl OcrFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bounds: None,
        }
    }
}

pub const TRANSLATION_ERROR_PREFIX: &str = "Translation failed. Error: ";

/// Outcome of one translation request. Failures carry a readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    Translated(String),
    Failed(String),
}

impl TranslationResult {
    pub fn is_error(&self) -> bool {
        matches!(self, TranslationResult::Failed(_))
    }

    /// Text shown in the overlay. Errors get a prefix no translation carries.
    pub fn display_text(&self) -> String {
        match self {
            TranslationResult::Translated(text) => text.clone(),
            TranslationResult::Failed(reason) => format!("{TRANSLATION_ERROR_PREFIX}{reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrEngineKind {
    /// OS OCR (`Windows.Media.Ocr`)
    Windows,
    /// PP-OCR models
    Paddle,
}

impl fmt::Display for OcrEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrEngineKind::Windows => write!(f, "windows"),
            OcrEngineKind::Paddle => write!(f, "paddle"),
        }
    }
}

impl FromStr for OcrEngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" | "win" => Ok(OcrEngineKind::Windows),
            "paddle" | "paddleocr" => Ok(OcrEngineKind::Paddle),
            other => Err(format!("unknown OCR engine '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLanguage {
    English,
    Japanese,
}

impl SourceLanguage {
    /// BCP-47 tag used by the OS OCR
    pub fn bcp47(&self) -> &'static str {
        match self {
            SourceLanguage::English => "en",
            SourceLanguage::Japanese => "ja",
        }
    }

    /// Model family name used by PP-OCR
    pub fn paddle_code(&self) -> &'static str {
        match self {
            SourceLanguage::English => "en",
            SourceLanguage::Japanese => "japan",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceLanguage::English => "English",
            SourceLanguage::Japanese => "Japanese",
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(SourceLanguage::English),
            "ja" | "jp" | "japan" | "japanese" => Ok(SourceLanguage::Japanese),
            other => Err(format!("unsupported source language '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLanguage {
    TraditionalChinese,
    English,
}

impl TargetLanguage {
    /// Name used inside the translation prompt
    pub fn prompt_name(&self) -> &'static str {
        match self {
            TargetLanguage::TraditionalChinese => "Traditional Chinese",
            TargetLanguage::English => "English",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prompt_name())
    }
}

impl FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zh-tw" | "zh_tw" | "zh-hant" | "traditional chinese" | "繁體中文" => {
                Ok(TargetLanguage::TraditionalChinese)
            }
            "en" | "english" => Ok(TargetLanguage::English),
            other => Err(format!("unsupported target language '{other}'")),
        }
    }
}

/// Messages from the pipeline to whatever renders the overlay
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    Show,
    Hide,
    SetText(String),
    SetGeometry(OverlayLayout),
    /// User-facing status line (not overlay content)
    Status(String),
}
