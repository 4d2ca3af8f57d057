//! Trim pass: drop secondary footage whose category does not match what
//! the main source is doing around the same rows.

use std::collections::HashSet;

use crate::models::Category;

use super::matrix::{Cell, PlanMatrix};

/// Clear secondary cells whose session category falls outside the main
/// source's accepted set for a window of `[row - lookback, row + lookahead]`
/// rows.
///
/// Special case, preserved deliberately: a source whose cells would *all*
/// be trimmed is exempted from trimming entirely. A source that never
/// matches the main category by name is assumed to be mislabeled rather
/// than unrelated, and mislabeled footage is better kept than silently
/// dropped.
pub(crate) fn trim(
    matrix: &mut PlanMatrix,
    lookback: usize,
    lookahead: usize,
    non_grouping: &[Category],
) {
    let row_count = matrix.row_count();
    if row_count == 0 {
        return;
    }

    // Accepted categories per row, from the main column only.
    let accepted: Vec<HashSet<Category>> = (0..row_count)
        .map(|row| {
            let lo = row.saturating_sub(lookback);
            let hi = (row + lookahead).min(row_count - 1);
            let mut set = HashSet::new();
            for window_row in lo..=hi {
                for &idx in &matrix.rows[window_row][0] {
                    let category = &matrix.arena.get(idx).category;
                    if !non_grouping.contains(category) {
                        set.insert(category.clone());
                    }
                }
            }
            set
        })
        .collect();

    for column in 1..matrix.column_count() {
        let trimmed: Vec<Cell> = (0..row_count)
            .map(|row| {
                let cell = &matrix.rows[row][column];
                match cell.first() {
                    Some(&idx) if !accepted[row].contains(&matrix.arena.get(idx).category) => {
                        Vec::new()
                    }
                    _ => cell.clone(),
                }
            })
            .collect();

        let had_any = (0..row_count).any(|row| matrix.is_present(row, column));
        let survivors = trimmed.iter().filter(|cell| !cell.is_empty()).count();
        if had_any && survivors == 0 {
            tracing::debug!(
                source = %matrix.sources[column],
                "trim pass: exempting source that would lose all cells"
            );
            continue;
        }

        for (row, cell) in trimmed.into_iter().enumerate() {
            matrix.rows[row][column] = cell;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::matrix::test_support::{matrix, presence};
    use super::*;

    #[test]
    fn clears_category_mismatch_outside_window() {
        // Main plays talk / music / talk; the side source is tagged music
        // throughout. With a zero-width window only the middle row accepts
        // music.
        let mut m = matrix(
            &[0, 30, 60, 90],
            &[
                (
                    "cam_a",
                    &[("r1", "talk", 0, 30), ("r1", "music", 30, 60), ("r1", "talk", 60, 90)],
                ),
                (
                    "cam_b",
                    &[("r2", "music", 0, 30), ("r2", "music", 30, 60), ("r2", "music", 60, 90)],
                ),
            ],
        );

        trim(&mut m, 0, 0, &[]);

        assert_eq!(presence(&m), vec!["x.", "xx", "x."]);
    }

    #[test]
    fn lookback_widens_the_accepted_set() {
        let mut m = matrix(
            &[0, 30, 60],
            &[
                ("cam_a", &[("r1", "music", 0, 30), ("r1", "talk", 30, 60)]),
                ("cam_b", &[("r2", "music", 0, 30), ("r2", "music", 30, 60)]),
            ],
        );

        // Row 1 looks back one row and still accepts music.
        trim(&mut m, 1, 0, &[]);

        assert_eq!(presence(&m), vec!["xx", "xx"]);
    }

    #[test]
    fn non_grouping_categories_never_accept() {
        let mut m = matrix(
            &[0, 30],
            &[
                ("cam_a", &[("r1", "break", 0, 30)]),
                (
                    "cam_b",
                    &[("r2", "break", 0, 30)],
                ),
            ],
        );

        // "break" is non-grouping, but cam_b would lose everything, so the
        // exemption kicks in and keeps it.
        trim(&mut m, 0, 0, &[Category::new("break")]);
        assert_eq!(presence(&m), vec!["xx"]);
    }

    #[test]
    fn source_never_matching_is_exempt() {
        // cam_b's label never matches main's; assumed mislabeled, kept.
        let mut m = matrix(
            &[0, 30, 60],
            &[
                ("cam_a", &[("r1", "talk", 0, 30), ("r1", "talk", 30, 60)]),
                ("cam_b", &[("r2", "gaming", 0, 30), ("r2", "gaming", 30, 60)]),
            ],
        );

        trim(&mut m, 0, 0, &[]);

        assert_eq!(presence(&m), vec!["xx", "xx"]);
    }

    #[test]
    fn partial_match_is_not_exempt() {
        let mut m = matrix(
            &[0, 30, 60],
            &[
                ("cam_a", &[("r1", "talk", 0, 30), ("r1", "talk", 30, 60)]),
                ("cam_b", &[("r2", "talk", 0, 30), ("r2", "gaming", 30, 60)]),
            ],
        );

        trim(&mut m, 0, 0, &[]);

        assert_eq!(presence(&m), vec!["xx", "x."]);
    }
}
