use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use self::ocr::OcrConfig;
use self::translator::TranslatorConfig;

pub mod ocr;
pub mod translator;

fn default_capture_interval_ms() -> u64 {
    200
}

fn default_scale_percent() -> u32 {
    150
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrConfig,
    pub translator: TranslatorConfig,

    /// Delay between two capture ticks
    #[serde(default = "default_capture_interval_ms")]
    pub capture_interval_ms: u64,
    /// User scale percentage, 100..=300
    #[serde(default = "default_scale_percent")]
    pub scale_percent: u32,
    /// Display DPI scale. `None` means ask the primary monitor at startup.
    pub dpi_scale: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            translator: TranslatorConfig::default(),
            capture_interval_ms: default_capture_interval_ms(),
            scale_percent: default_scale_percent(),
            dpi_scale: None,
        }
    }
}

impl Config {
    /// Read the process environment once
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source, falling back to defaults
    /// for missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let capture_interval_ms =
            parse_or(&lookup, "CAPTURE_INTERVAL_MS", default_capture_interval_ms()).max(1);

        let scale_percent = parse_or(&lookup, "SCALE_PERCENT", default_scale_percent())
            .clamp(100, 300);

        let dpi_scale = lookup("DPI_SCALE")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0);

        Config {
            ocr: OcrConfig::from_lookup(&lookup),
            translator: TranslatorConfig::from_lookup(&lookup),
            capture_interval_ms,
            scale_percent,
            dpi_scale,
        }
    }
}

pub(crate) fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid value for {key}: {raw:?}");
                default
            }
        },
        None => default,
    }
}
