//! Capture a region and run OCR once:
//! cargo run -p honyaku-ocr --bin test_ocr -- [left top width height]

use anyhow::{Context, Result};
use honyaku_config::Config;
use honyaku_types::CaptureRegion;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let args: Vec<u32> = std::env::args()
        .skip(1)
        .map(|a| a.parse().context("region values must be non-negative integers"))
        .collect::<Result<_>>()?;

    // 1. Displays
    let displays = honyaku_ocr::display_regions()?;
    for (i, region) in displays.iter().enumerate() {
        tracing::info!("display [{}] {:?}", i, region);
    }

    let region = match args.as_slice() {
        [left, top, width, height] => CaptureRegion {
            top: *top as i32,
            left: *left as i32,
            width: *width,
            height: *height,
        },
        [] => CaptureRegion {
            top: 0,
            left: 0,
            width: displays[0].width.min(800),
            height: displays[0].height.min(200),
        },
        _ => anyhow::bail!("expected 0 or 4 arguments: left top width height"),
    };

    // 2. Capture
    let start = std::time::Instant::now();
    let frame = honyaku_ocr::capture_screen_region(region)?;
    tracing::info!("captured {}x{} in {:?}", frame.width(), frame.height(), start.elapsed());

    frame.save("test_capture.png")?;
    tracing::info!("saved to test_capture.png");

    // 3. OCR with the environment's engine/language
    let config = Config::new();
    let extractor = honyaku_ocr::TextExtractor::new(config.ocr)?;

    let start = std::time::Instant::now();
    let text = extractor.extract(&frame);
    tracing::info!("{:?} - {} chars", start.elapsed(), text.chars().count());
    if !text.is_empty() {
        tracing::info!("> {}", text);
    }

    Ok(())
}
