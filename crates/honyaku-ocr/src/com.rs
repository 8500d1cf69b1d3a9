use anyhow::{Context, Result};
use windows::Win32::System::Com::{COINIT_MULTITHREADED, CoInitializeEx, CoUninitialize};

/// Keeps COM initialized on the current thread until dropped.
///
/// Capture and OCR run on blocking-pool threads, which start without COM,
/// so each recognition call holds one of these.
pub struct ComGuard;

impl ComGuard {
    pub fn initialize() -> Result<Self> {
        unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
            .ok()
            .context("Failed to initialize COM")?;
        Ok(ComGuard)
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}
