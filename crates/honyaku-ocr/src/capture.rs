use anyhow::Context;
use honyaku_types::{CaptureRegion, ScreenBounds};
use image::RgbaImage;
use xcap::Monitor;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    #[error("capture region is empty ({width}x{height})")]
    EmptyRegion { width: u32, height: u32 },

    #[error("capture region is outside every display")]
    OffScreen,

    #[error("no display found")]
    NoDisplay,

    #[error("screen capture failed: {0}")]
    Backend(String),
}

/// Anything that can grab the pixels of a physical-pixel region
pub trait FrameSource: Send + Sync {
    fn capture(&self, region: CaptureRegion) -> Result<RgbaImage, CaptureError>;
}

/// Captures from the real displays through xcap
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenCapturer;

impl FrameSource for ScreenCapturer {
    fn capture(&self, region: CaptureRegion) -> Result<RgbaImage, CaptureError> {
        capture_screen_region(region)
    }
}

fn monitor_bounds(monitor: &Monitor) -> CaptureRegion {
    CaptureRegion {
        top: monitor.y(),
        left: monitor.x(),
        width: monitor.width(),
        height: monitor.height(),
    }
}

fn all_monitors() -> Result<Vec<Monitor>, CaptureError> {
    let monitors = Monitor::all().map_err(|e| CaptureError::Backend(e.to_string()))?;
    if monitors.is_empty() {
        return Err(CaptureError::NoDisplay);
    }
    Ok(monitors)
}

/// Bounds of every display in physical pixels
pub fn display_regions() -> Result<Vec<CaptureRegion>, CaptureError> {
    Ok(all_monitors()?.iter().map(monitor_bounds).collect())
}

fn primary_monitor() -> anyhow::Result<Monitor> {
    let monitors = Monitor::all().context("Failed to get monitors")?;
    let index = monitors.iter().position(|m| m.is_primary()).unwrap_or(0);
    monitors.into_iter().nth(index).context("No monitor found")
}

/// DPI scale of the primary display
pub fn primary_scale_factor() -> anyhow::Result<f64> {
    let monitor = primary_monitor()?;
    Ok(monitor.scale_factor() as f64)
}

/// Size of the primary display in logical pixels
pub fn primary_screen_bounds() -> anyhow::Result<ScreenBounds> {
    let monitor = primary_monitor()?;
    let scale = (monitor.scale_factor() as f64).max(f64::EPSILON);
    Ok(ScreenBounds {
        width: (monitor.width() as f64 / scale).round() as i32,
        height: (monitor.height() as f64 / scale).round() as i32,
    })
}

/// Pick the display sharing the most area with `region`.
///
/// Returns its index and the part of the region it covers, relative to the
/// display's top-left corner.
pub fn locate_region(
    region: &CaptureRegion,
    displays: &[CaptureRegion],
) -> Result<(usize, CaptureRegion), CaptureError> {
    if region.is_empty() {
        return Err(CaptureError::EmptyRegion {
            width: region.width,
            height: region.height,
        });
    }
    if displays.is_empty() {
        return Err(CaptureError::NoDisplay);
    }

    let mut best: Option<(usize, u64, CaptureRegion)> = None;
    for (index, display) in displays.iter().enumerate() {
        let left = (region.left as i64).max(display.left as i64);
        let top = (region.top as i64).max(display.top as i64);
        let right = region.right().min(display.right());
        let bottom = region.bottom().min(display.bottom());
        if right <= left || bottom <= top {
            continue;
        }

        let area = ((right - left) * (bottom - top)) as u64;
        if best.as_ref().is_none_or(|(_, best_area, _)| area > *best_area) {
            let crop = CaptureRegion {
                top: (top - display.top as i64) as i32,
                left: (left - display.left as i64) as i32,
                width: (right - left) as u32,
                height: (bottom - top) as u32,
            };
            best = Some((index, area, crop));
        }
    }

    best.map(|(index, _, crop)| (index, crop))
        .ok_or(CaptureError::OffScreen)
}

/// Capture a region of the screen
pub fn capture_screen_region(region: CaptureRegion) -> Result<RgbaImage, CaptureError> {
    if region.is_empty() {
        return Err(CaptureError::EmptyRegion {
            width: region.width,
            height: region.height,
        });
    }

    let monitors = all_monitors()?;
    let displays: Vec<CaptureRegion> = monitors.iter().map(monitor_bounds).collect();
    let (index, crop) = locate_region(&region, &displays)?;

    let image = monitors[index]
        .capture_image()
        .map_err(|e| CaptureError::Backend(e.to_string()))?;

    let cropped = image::imageops::crop_imm(
        &image,
        crop.left as u32,
        crop.top as u32,
        crop.width,
        crop.height,
    )
    .to_image();

    if cropped.width() == 0 || cropped.height() == 0 {
        return Err(CaptureError::OffScreen);
    }

    Ok(cropped)
}

pub fn encode_png(image: &RgbaImage) -> anyhow::Result<Vec<u8>> {
    use image::ImageEncoder;
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .context("Failed to encode PNG")?;
    Ok(buffer)
}
