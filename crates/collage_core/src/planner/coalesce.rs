//! Coalesce pass: merge adjacent rows that would render identically.
//!
//! Two neighbouring rows merge when every column agrees on presence and,
//! where present, on the backing recording. Sessions of merged cells are
//! unioned, so a cell can hold several sessions of one recording after
//! this pass. A single backward sweep reaches a fixed point because
//! merging never changes a row's presence or recordings.

use super::matrix::PlanMatrix;

pub(crate) fn coalesce(matrix: &mut PlanMatrix) {
    let mut row = matrix.row_count();
    while row > 1 {
        row -= 1;
        if !mergeable(matrix, row - 1, row) {
            continue;
        }
        let removed = matrix.rows.remove(row);
        for (column, cell) in removed.into_iter().enumerate() {
            let target = &mut matrix.rows[row - 1][column];
            for idx in cell {
                // A session spanning the old boundary sits in both rows.
                if !target.contains(&idx) {
                    target.push(idx);
                }
            }
        }
        matrix.boundaries.remove(row);
    }
}

fn mergeable(matrix: &PlanMatrix, upper: usize, lower: usize) -> bool {
    (0..matrix.column_count()).all(|column| {
        match (matrix.is_present(upper, column), matrix.is_present(lower, column)) {
            (false, false) => true,
            (true, true) => {
                matrix.cell_recording(upper, column) == matrix.cell_recording(lower, column)
            }
            _ => false,
        }
    })
}
