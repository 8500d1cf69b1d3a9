//! Logical/physical pixel conversion and overlay placement.
//!
//! Selections arrive in logical pixels, capture works in physical pixels.
//! The overlay is laid out in logical pixels again so the windowing layer can
//! place it directly.

use honyaku_types::{CaptureRegion, LogicalRect, OverlayLayout, ScaleFactor, ScreenBounds};

/// Overlay height in logical pixels
pub const OVERLAY_HEIGHT: i32 = 300;
/// Vertical distance between the region edge and the overlay
pub const OVERLAY_GAP: i32 = 10;
/// Overlay width as a share of the region width
pub const OVERLAY_WIDTH_RATIO: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("Please select an area first")]
    Missing,

    #[error("Selected area is empty ({width}x{height})")]
    Degenerate { width: u32, height: u32 },

    #[error("Selected area is outside every display")]
    OffScreen(CaptureRegion),

    #[error("Selected area is out of range")]
    OutOfRange(LogicalRect),
}

/// Convert a normalized logical rectangle into physical capture coordinates.
///
/// Every coordinate and extent is `round(value * scale)`. A zero-area input
/// gives a zero-area region; rejecting it is left to capture.
pub fn map_selection_to_region(rect: &LogicalRect, scale: ScaleFactor) -> CaptureRegion {
    debug_assert!(rect.is_normalized(), "selection must be normalized");
    let s = scale.value();

    CaptureRegion {
        top: (rect.top as f64 * s).round() as i32,
        left: (rect.left as f64 * s).round() as i32,
        width: (rect.width.max(0) as f64 * s).round() as u32,
        height: (rect.height.max(0) as f64 * s).round() as u32,
    }
}

/// Place the overlay under the region, or above it when there is no room
/// below. The result always lies within `screen`.
pub fn compute_overlay_layout(
    region: &CaptureRegion,
    scale: ScaleFactor,
    screen: ScreenBounds,
) -> OverlayLayout {
    let s = scale.value();
    let screen_width = screen.width.max(0);

    let width =
        ((region.width as f64 * OVERLAY_WIDTH_RATIO / s).round() as i32).clamp(0, screen_width);
    let height = OVERLAY_HEIGHT;

    let center_x = (region.left as f64 + region.width as f64 / 2.0) / s;
    let x = ((center_x - width as f64 / 2.0).round() as i32).clamp(0, screen_width - width);

    let below = ((region.bottom() as f64 / s).round() as i32).saturating_add(OVERLAY_GAP);
    let y = if below.saturating_add(height) > screen.height {
        ((region.top as f64 / s).round() as i32)
            .saturating_sub(OVERLAY_GAP)
            .saturating_sub(height)
    } else {
        below
    }
    .max(0);

    OverlayLayout {
        x,
        y,
        width,
        height,
    }
}

/// Reject selections that can never be captured.
///
/// `displays` are monitor rectangles in physical pixels. When it is empty the
/// display layout is unknown and only the area check applies.
pub fn validate_selection(
    region: &CaptureRegion,
    displays: &[CaptureRegion],
) -> Result<(), SelectionError> {
    if region.is_empty() {
        return Err(SelectionError::Degenerate {
            width: region.width,
            height: region.height,
        });
    }

    if !displays.is_empty() && !displays.iter().any(|d| intersects(region, d)) {
        return Err(SelectionError::OffScreen(*region));
    }

    Ok(())
}

fn intersects(a: &CaptureRegion, b: &CaptureRegion) -> bool {
    (a.left as i64) < b.right()
        && (b.left as i64) < a.right()
        && (a.top as i64) < b.bottom()
        && (b.top as i64) < a.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: ScreenBounds = ScreenBounds {
        width: 1920,
        height: 1080,
    };

    fn region(left: i32, top: i32, width: u32, height: u32) -> CaptureRegion {
        CaptureRegion {
            top,
            left,
            width,
            height,
        }
    }

    fn assert_on_screen(layout: &OverlayLayout, screen: ScreenBounds) {
        assert!(layout.x >= 0, "x = {}", layout.x);
        assert!(layout.x <= screen.width - layout.width, "x = {}", layout.x);
        assert!(layout.y >= 0, "y = {}", layout.y);
    }

    #[test]
    fn test_map_selection_scales_each_field() {
        let rect = LogicalRect::new(100, 100, 400, 100);
        let mapped = map_selection_to_region(&rect, ScaleFactor::from_percent(150));

        assert_eq!(mapped, region(150, 150, 600, 150));
    }

    #[test]
    fn test_map_selection_rounds_instead_of_truncating() {
        let rect = LogicalRect::new(3, 5, 7, 1);
        // 1.25 * 7 = 8.75, 1.25 * 5 = 6.25, 1.25 * 3 = 3.75
        let mapped = map_selection_to_region(&rect, ScaleFactor::from_percent(125));

        assert_eq!(mapped, region(4, 6, 9, 1));
    }

    #[test]
    fn test_map_selection_combines_dpi_and_percent() {
        let rect = LogicalRect::new(10, 20, 100, 50);
        let mapped = map_selection_to_region(&rect, ScaleFactor::new(2.0, 150));

        assert_eq!(mapped, region(30, 60, 300, 150));
    }

    #[test]
    fn test_map_selection_extents_match_rounded_products() {
        for percent in (100..=300).step_by(10) {
            let scale = ScaleFactor::from_percent(percent);
            for extent in [0, 1, 2, 33, 157, 640, 1999] {
                let rect = LogicalRect::new(extent, extent, extent, extent);
                let mapped = map_selection_to_region(&rect, scale);
                let expected = (extent as f64 * scale.value()).round() as u32;

                assert_eq!(mapped.width, expected);
                assert_eq!(mapped.height, expected);
            }
        }
    }

    #[test]
    fn test_zero_area_selection_maps_to_zero_area() {
        let click = LogicalRect::from_corners((40, 40), (40, 40));
        let mapped = map_selection_to_region(&click, ScaleFactor::from_percent(200));

        assert!(mapped.is_empty());
        assert_eq!(mapped.left, 80);
        assert_eq!(mapped.top, 80);
    }

    #[test]
    fn test_overlay_sits_below_region() {
        let scale = ScaleFactor::from_percent(100);
        let layout = compute_overlay_layout(&region(100, 100, 400, 100), scale, SCREEN);

        assert_eq!(layout.width, 360);
        assert_eq!(layout.height, OVERLAY_HEIGHT);
        assert_eq!(layout.x, 120);
        assert_eq!(layout.y, 210);
    }

    #[test]
    fn test_overlay_uses_logical_pixels() {
        let scale = ScaleFactor::from_percent(150);
        let layout = compute_overlay_layout(&region(150, 150, 600, 150), scale, SCREEN);

        assert_eq!(layout.width, 360);
        assert_eq!(layout.x, 120);
        assert_eq!(layout.y, 210);
    }

    #[test]
    fn test_overlay_flips_above_when_bottom_overflows() {
        let scale = ScaleFactor::from_percent(100);
        let layout = compute_overlay_layout(&region(600, 900, 400, 100), scale, SCREEN);

        assert_eq!(layout.y, 900 - OVERLAY_GAP - OVERLAY_HEIGHT);
        assert_on_screen(&layout, SCREEN);
    }

    #[test]
    fn test_overlay_flipped_is_clamped_to_top() {
        let screen = ScreenBounds {
            width: 800,
            height: 400,
        };
        let scale = ScaleFactor::from_percent(100);
        let layout = compute_overlay_layout(&region(100, 50, 300, 200), scale, screen);

        assert_eq!(layout.y, 0);
        assert_on_screen(&layout, screen);
    }

    #[test]
    fn test_overlay_is_clamped_horizontally() {
        let scale = ScaleFactor::from_percent(100);

        let left_edge = compute_overlay_layout(&region(-300, 100, 400, 100), scale, SCREEN);
        assert_eq!(left_edge.x, 0);

        let right_edge = compute_overlay_layout(&region(1800, 100, 400, 100), scale, SCREEN);
        assert_eq!(right_edge.x, SCREEN.width - right_edge.width);
    }

    #[test]
    fn test_overlay_never_wider_than_screen() {
        let scale = ScaleFactor::from_percent(100);
        let layout = compute_overlay_layout(&region(0, 0, 4000, 100), scale, SCREEN);

        assert_eq!(layout.width, SCREEN.width);
        assert_eq!(layout.x, 0);
    }

    #[test]
    fn test_overlay_stays_on_screen_across_positions() {
        let scale = ScaleFactor::from_percent(125);
        for top in (0..1400).step_by(97) {
            for left in (-200..2400).step_by(131) {
                let layout = compute_overlay_layout(&region(left, top, 500, 120), scale, SCREEN);
                assert_on_screen(&layout, SCREEN);
            }
        }
    }

    #[test]
    fn test_overlay_for_region_at_coordinate_limits() {
        let scale = ScaleFactor::from_percent(100);
        for area in [
            region(i32::MAX - 10, i32::MAX - 10, u32::MAX, u32::MAX),
            region(i32::MIN, i32::MIN, 100, 100),
        ] {
            let layout = compute_overlay_layout(&area, scale, SCREEN);
            assert_on_screen(&layout, SCREEN);
        }
    }

    #[test]
    fn test_validate_selection_rejects_zero_area() {
        let err = validate_selection(&region(10, 10, 0, 40), &[]).unwrap_err();

        assert_eq!(
            err,
            SelectionError::Degenerate {
                width: 0,
                height: 40
            }
        );
    }

    #[test]
    fn test_validate_selection_rejects_off_screen() {
        let displays = [region(0, 0, 1920, 1080)];
        let outside = region(5000, 5000, 100, 100);

        assert_eq!(
            validate_selection(&outside, &displays),
            Err(SelectionError::OffScreen(outside))
        );
        assert!(validate_selection(&region(1900, 1000, 100, 100), &displays).is_ok());
    }

    #[test]
    fn test_validate_selection_without_display_info() {
        assert!(validate_selection(&region(5000, 5000, 100, 100), &[]).is_ok());
    }
}
