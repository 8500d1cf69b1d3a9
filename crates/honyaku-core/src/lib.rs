pub mod change;
pub mod geometry;

pub use change::{ChangeDetector, should_translate};
pub use geometry::{
    OVERLAY_GAP, OVERLAY_HEIGHT, OVERLAY_WIDTH_RATIO, SelectionError, compute_overlay_layout,
    map_selection_to_region, validate_selection,
};
