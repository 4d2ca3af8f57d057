//! Window position calculation for offset estimation.
//!
//! Pure functions for placing macro windows over the analyzable overlap
//! and micro windows within one macro window.

/// Start positions (seconds) of macro windows across the overlap.
///
/// Only whole macro windows are analyzed; a trailing partial window is
/// dropped. Returns an empty vec if the overlap is shorter than one
/// macro window.
pub fn macro_positions(overlap_secs: f64, macro_window_secs: f64) -> Vec<f64> {
    if overlap_secs < macro_window_secs {
        return vec![];
    }
    let count = (overlap_secs / macro_window_secs).floor() as usize;
    (0..count).map(|i| i as f64 * macro_window_secs).collect()
}

/// Start positions (seconds, relative to the macro window start) of micro
/// windows sliding through one macro window at the given stride.
pub fn micro_positions(macro_window_secs: f64, micro_window_secs: f64, stride_secs: f64) -> Vec<f64> {
    let mut positions = Vec::new();
    let mut pos = 0.0;
    while pos + micro_window_secs <= macro_window_secs {
        positions.push(pos);
        pos += stride_secs;
    }
    positions
}
