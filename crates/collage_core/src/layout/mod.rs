//! Tile-grid layout: grid shape per segment, one shared output
//! resolution per plan.
//!
//! The resolution is chosen once from the plan's maximum concurrency so
//! the output never changes size mid-video; segments with fewer sources
//! just get larger tiles.

use crate::models::LayoutDescriptor;

/// Smallest square-ish grid holding `present` tiles, as `(cols, rows)`.
///
/// Columns equal the ceiling square root, rows shrink to what is
/// actually needed (4 tiles get 2x2, 5 through 6 get 3x2). Zero present
/// sources still get a 1x1 grid so every segment has a layout.
pub fn grid_for(present: usize) -> (u32, u32) {
    if present <= 1 {
        return (1, 1);
    }
    let mut side: usize = 1;
    while side * side < present {
        side += 1;
    }
    let rows = present.div_ceil(side);
    (side as u32, rows as u32)
}

/// Output resolution for a plan whose busiest segment shows
/// `max_present` sources at once.
///
/// Scales with the grid side so a tile never drops below roughly 720p.
pub fn resolution_for(max_present: usize) -> (u32, u32) {
    let (side, _) = grid_for(max_present);
    match side {
        0 | 1 => (1920, 1080),
        2 => (2560, 1440),
        3 => (3840, 2160),
        _ => (5120, 2880),
    }
}

/// Layout for one segment: grid shape from its own present count, cell
/// size as the largest output-aspect rectangle fitting a grid slot.
/// Footage is padded into the cell, never cropped.
pub fn descriptor_for(present: usize, resolution: (u32, u32)) -> LayoutDescriptor {
    let (grid_cols, grid_rows) = grid_for(present);
    let slot_w = resolution.0 / grid_cols;
    let slot_h = resolution.1 / grid_rows;

    // Fit the output aspect ratio into the slot.
    let fit_h = slot_w as u64 * resolution.1 as u64 / resolution.0 as u64;
    let cell_size = if fit_h as u32 <= slot_h {
        (slot_w, fit_h as u32)
    } else {
        let fit_w = slot_h as u64 * resolution.0 as u64 / resolution.1 as u64;
        (fit_w as u32, slot_h)
    };

    LayoutDescriptor {
        grid_cols,
        grid_rows,
        resolution,
        cell_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_grows_with_present_count() {
        assert_eq!(grid_for(0), (1, 1));
        assert_eq!(grid_for(1), (1, 1));
        assert_eq!(grid_for(2), (2, 1));
        assert_eq!(grid_for(3), (2, 2));
        assert_eq!(grid_for(4), (2, 2));
        assert_eq!(grid_for(5), (3, 2));
        assert_eq!(grid_for(7), (3, 3));
        assert_eq!(grid_for(10), (4, 3));
    }

    #[test]
    fn resolution_tracks_grid_side() {
        assert_eq!(resolution_for(1), (1920, 1080));
        assert_eq!(resolution_for(2), (2560, 1440));
        assert_eq!(resolution_for(4), (2560, 1440));
        assert_eq!(resolution_for(5), (3840, 2160));
        assert_eq!(resolution_for(9), (3840, 2160));
        assert_eq!(resolution_for(10), (5120, 2880));
    }

    #[test]
    fn two_up_layout_keeps_aspect() {
        let layout = descriptor_for(2, resolution_for(2));
        assert_eq!(layout.grid_cols, 2);
        assert_eq!(layout.grid_rows, 1);
        assert_eq!(layout.resolution, (2560, 1440));
        // Slot is 1280x1440; a 16:9 cell fits as 1280x720.
        assert_eq!(layout.cell_size, (1280, 720));
    }

    #[test]
    fn solo_segment_fills_the_frame() {
        let layout = descriptor_for(1, (1920, 1080));
        assert_eq!(layout.cell_size, (1920, 1080));
    }

    #[test]
    fn five_up_on_shared_resolution() {
        // Plan max is 5, so every segment shares 3840x2160; a segment
        // with 5 sources tiles 3x2.
        let resolution = resolution_for(5);
        let layout = descriptor_for(5, resolution);
        assert_eq!((layout.grid_cols, layout.grid_rows), (3, 2));
        // Slot is 1280x1080; a 16:9 cell fits as 1280x720.
        assert_eq!(layout.cell_size, (1280, 720));
    }
}
