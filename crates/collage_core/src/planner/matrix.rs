//! The segment matrix: rows are boundary-to-boundary intervals, columns
//! are sources, cells hold arena-indexed sessions.
//!
//! All passes rebuild rows and replace them wholesale; nothing inserts
//! into a row vector while iterating it.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Category, RecordingId, SourceId, TimeRange};

/// Index of a session in the planning arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct SessionIdx(pub usize);

/// One session's planning view: source column plus the fields the passes
/// need, denormalized out of the model types.
#[derive(Debug, Clone)]
pub(crate) struct ArenaSession {
    /// Column of the owning source.
    pub column: usize,
    /// Recording the session belongs to.
    pub recording: RecordingId,
    /// Category tag.
    pub category: Category,
    /// Absolute range covered.
    pub range: TimeRange,
}

/// Append-only arena of sessions referenced by matrix cells.
///
/// Gap-filling appends; nothing is ever removed, so indices stay valid
/// for the whole planning call.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionArena {
    entries: Vec<ArenaSession>,
}

impl SessionArena {
    pub fn push(&mut self, session: ArenaSession) -> SessionIdx {
        self.entries.push(session);
        SessionIdx(self.entries.len() - 1)
    }

    pub fn get(&self, idx: SessionIdx) -> &ArenaSession {
        &self.entries[idx.0]
    }
}

/// A matrix cell: the sessions a source contributes to one row.
///
/// Empty means the source is absent. Construction guarantees at most one
/// session; only coalescing produces multi-session cells.
pub(crate) type Cell = Vec<SessionIdx>;

/// Working matrix for one planning invocation.
#[derive(Debug, Clone)]
pub(crate) struct PlanMatrix {
    /// Column order: main source at column 0, secondaries in input order.
    pub sources: Vec<SourceId>,
    /// Row boundaries; `boundaries.len() == rows.len() + 1`.
    pub boundaries: Vec<DateTime<Utc>>,
    /// Row-major cells: `rows[row][column]`.
    pub rows: Vec<Vec<Cell>>,
    /// Session storage backing the cells.
    pub arena: SessionArena,
}

impl PlanMatrix {
    /// Build the matrix from per-column kept sessions.
    ///
    /// For each row and column the unique session overlapping the row by
    /// a positive duration is recorded. Two simultaneous sessions for one
    /// source violate the input contract and abort planning.
    pub fn build(
        sources: Vec<SourceId>,
        boundaries: Vec<DateTime<Utc>>,
        arena: SessionArena,
        per_column: &[Vec<SessionIdx>],
    ) -> Self {
        assert!(boundaries.len() >= 2, "matrix needs at least one row");
        assert_eq!(sources.len(), per_column.len());

        let mut rows = Vec::with_capacity(boundaries.len() - 1);
        for pair in boundaries.windows(2) {
            let row_range = TimeRange::new(pair[0], pair[1]);
            let mut row: Vec<Cell> = Vec::with_capacity(sources.len());
            for (column, session_idxs) in per_column.iter().enumerate() {
                let mut cell: Cell = Vec::new();
                for &idx in session_idxs {
                    if arena.get(idx).range.intersects(&row_range) {
                        assert!(
                            cell.is_empty(),
                            "source '{}' has two simultaneous sessions over {}",
                            sources[column],
                            row_range
                        );
                        cell.push(idx);
                    }
                }
                row.push(cell);
            }
            rows.push(row);
        }

        Self {
            sources,
            boundaries,
            rows,
            arena,
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of source columns.
    pub fn column_count(&self) -> usize {
        self.sources.len()
    }

    /// The time range a row covers.
    pub fn row_range(&self, row: usize) -> TimeRange {
        TimeRange::new(self.boundaries[row], self.boundaries[row + 1])
    }

    /// Duration of a row.
    pub fn row_duration(&self, row: usize) -> Duration {
        self.row_range(row).duration()
    }

    /// Whether a source is present in a row.
    pub fn is_present(&self, row: usize, column: usize) -> bool {
        !self.rows[row][column].is_empty()
    }

    /// The recording backing a cell, if the cell is occupied.
    ///
    /// All sessions in one cell share a recording (coalescing merges only
    /// same-recording cells), so the first session decides.
    pub fn cell_recording(&self, row: usize, column: usize) -> Option<&RecordingId> {
        self.rows[row][column]
            .first()
            .map(|&idx| &self.arena.get(idx).recording)
    }

    /// Total presence duration of a column across all rows.
    pub fn column_presence(&self, column: usize) -> Duration {
        (0..self.row_count())
            .filter(|&row| self.is_present(row, column))
            .fold(Duration::zero(), |acc, row| acc + self.row_duration(row))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{matrix, presence};
    use super::*;

    #[test]
    fn build_assigns_overlapping_sessions_to_cells() {
        let m = matrix(
            &[0, 30, 60],
            &[
                ("cam_a", &[("r1", "talk", 0, 60)]),
                ("cam_b", &[("r2", "talk", 30, 60)]),
            ],
        );

        assert_eq!(presence(&m), vec!["x.", "xx"]);
    }

    #[test]
    fn abutting_session_is_not_in_row() {
        // Session ends exactly at the row start; no positive overlap.
        let m = matrix(
            &[0, 30, 60],
            &[
                ("cam_a", &[("r1", "talk", 0, 60)]),
                ("cam_b", &[("r2", "talk", 0, 30)]),
            ],
        );

        assert_eq!(presence(&m), vec!["xx", "x."]);
    }

    #[test]
    fn column_presence_sums_occupied_rows() {
        let m = matrix(
            &[0, 30, 60, 90],
            &[
                ("cam_a", &[("r1", "talk", 0, 90)]),
                ("cam_b", &[("r2", "talk", 30, 60)]),
            ],
        );

        assert_eq!(m.column_presence(0), Duration::minutes(90));
        assert_eq!(m.column_presence(1), Duration::minutes(30));
    }

    #[test]
    #[should_panic(expected = "two simultaneous sessions")]
    fn simultaneous_sessions_abort() {
        matrix(
            &[0, 30],
            &[("cam_a", &[("r1", "talk", 0, 30), ("r2", "talk", 10, 30)])],
        );
    }
}
