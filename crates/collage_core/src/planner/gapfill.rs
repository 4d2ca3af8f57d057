//! Gap-fill pass: bridge short holes inside one recording with footage
//! the trim pass (or affiliation filtering) removed.
//!
//! Only holes strictly inside the matrix are candidates; leading and
//! trailing absence is genuine absence. A hole is filled from the raw
//! sessions of the recording that bounds it on both sides, so filling
//! never splices footage across a camera restart.

use chrono::Duration;

use super::matrix::{ArenaSession, PlanMatrix};
use super::SourceTimeline;

/// Fill every empty run shorter than `min_gap` whose neighbours on both
/// sides come from the same recording.
///
/// `timelines` must be ordered like the matrix columns and carries each
/// source's raw (pre-filtering) recordings.
pub(crate) fn fill_gaps(matrix: &mut PlanMatrix, timelines: &[&SourceTimeline], min_gap: Duration) {
    if min_gap <= Duration::zero() {
        return;
    }
    let row_count = matrix.row_count();

    for column in 0..matrix.column_count() {
        let mut row = 0;
        while row < row_count {
            if matrix.is_present(row, column) {
                row += 1;
                continue;
            }
            let run_start = row;
            while row < row_count && !matrix.is_present(row, column) {
                row += 1;
            }
            let run_end = row; // exclusive

            // Bounded on both sides, short enough, same recording around it.
            if run_start == 0 || run_end == row_count {
                continue;
            }
            let run_duration = matrix.boundaries[run_end] - matrix.boundaries[run_start];
            if run_duration >= min_gap {
                continue;
            }
            let before = matrix.cell_recording(run_start - 1, column).cloned();
            let after = matrix.cell_recording(run_end, column).cloned();
            let recording_id = match (before, after) {
                (Some(b), Some(a)) if b == a => b,
                _ => continue,
            };

            let Some(recording) = timelines[column]
                .recordings
                .iter()
                .find(|rec| rec.id == recording_id)
            else {
                continue;
            };

            // Every run row must be fully covered by raw sessions of that
            // recording, else the hole is a real capture gap; skip whole run.
            // Raw session breaks need not align with row boundaries, so a
            // row may take several sessions.
            let mut fills = Vec::with_capacity(run_end - run_start);
            for run_row in run_start..run_end {
                let row_range = matrix.row_range(run_row);
                let overlapping: Vec<_> = recording
                    .sessions
                    .iter()
                    .filter(|session| session.range.intersects(&row_range))
                    .cloned()
                    .collect();
                let covered = overlapping
                    .first()
                    .is_some_and(|s| s.range.start <= row_range.start)
                    && overlapping
                        .last()
                        .is_some_and(|s| s.range.end >= row_range.end);
                if covered {
                    fills.push((run_row, overlapping));
                } else {
                    fills.clear();
                    break;
                }
            }
            if fills.is_empty() {
                continue;
            }

            tracing::debug!(
                source = %matrix.sources[column],
                recording = %recording_id,
                rows = run_end - run_start,
                "gap-fill: bridging hole inside recording"
            );
            for (run_row, sessions) in fills {
                for session in sessions {
                    let idx = matrix.arena.push(ArenaSession {
                        column,
                        recording: session.recording,
                        category: session.category,
                        range: session.range,
                    });
                    matrix.rows[run_row][column].push(idx);
                }
            }
        }
    }
}
