//! Presence filter: drop secondary sources with too little screen time.

use chrono::Duration;

use crate::models::SourceId;

use super::matrix::PlanMatrix;

/// Remove every secondary column whose total presence is below
/// `minimum`. The main column is never removed. Returns the dropped
/// sources in column order.
pub(crate) fn filter_thin_sources(matrix: &mut PlanMatrix, minimum: Duration) -> Vec<SourceId> {
    if minimum <= Duration::zero() {
        return Vec::new();
    }

    let keep: Vec<bool> = (0..matrix.column_count())
        .map(|column| column == 0 || matrix.column_presence(column) >= minimum)
        .collect();
    if keep.iter().all(|&k| k) {
        return Vec::new();
    }

    let mut removed = Vec::new();
    let mut sources = Vec::new();
    for (column, source) in matrix.sources.drain(..).enumerate() {
        if keep[column] {
            sources.push(source);
        } else {
            removed.push(source);
        }
    }
    matrix.sources = sources;

    for row in &mut matrix.rows {
        let mut column = 0;
        row.retain(|_| {
            let kept = keep[column];
            column += 1;
            kept
        });
    }

    tracing::debug!(dropped = removed.len(), "presence filter removed thin sources");
    removed
}
