//! Concrete OCR engines. Each one is compiled only where it can run;
//! the others report [`ConfigurationError::EngineUnavailable`].

use honyaku_config::ocr::OcrConfig;
#[cfg(not(all(windows, feature = "paddle")))]
use honyaku_types::OcrEngineKind;

use crate::ocr::{ConfigurationError, OcrBackend};

#[cfg(feature = "paddle")]
mod paddle;
#[cfg(windows)]
mod windows_ocr;

#[cfg(windows)]
pub(crate) fn windows_backend(
    config: &OcrConfig,
) -> Result<Box<dyn OcrBackend>, ConfigurationError> {
    Ok(Box::new(windows_ocr::WindowsOcr::new(config)?))
}

#[cfg(not(windows))]
pub(crate) fn windows_backend(
    _config: &OcrConfig,
) -> Result<Box<dyn OcrBackend>, ConfigurationError> {
    Err(ConfigurationError::EngineUnavailable {
        engine: OcrEngineKind::Windows,
    })
}

#[cfg(feature = "paddle")]
pub(crate) fn paddle_backend(
    config: &OcrConfig,
) -> Result<Box<dyn OcrBackend>, ConfigurationError> {
    Ok(Box::new(paddle::PaddleOcr::new(config)?))
}

#[cfg(not(feature = "paddle"))]
pub(crate) fn paddle_backend(
    _config: &OcrConfig,
) -> Result<Box<dyn OcrBackend>, ConfigurationError> {
    Err(ConfigurationError::EngineUnavailable {
        engine: OcrEngineKind::Paddle,
    })
}
