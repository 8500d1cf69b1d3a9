mod capture;
#[cfg(windows)]
mod com;
mod engine;
mod ocr;

pub use capture::{
    CaptureError, FrameSource, ScreenCapturer, capture_screen_region, display_regions,
    encode_png, locate_region, primary_scale_factor, primary_screen_bounds,
};
#[cfg(windows)]
pub use com::ComGuard;
pub use ocr::{
    BackendFactory, ConfigurationError, ExtractionError, FRAGMENT_SEPARATOR, OcrBackend,
    TextExtractor, available_engines, build_backend, join_fragments, resolve_engine,
};
