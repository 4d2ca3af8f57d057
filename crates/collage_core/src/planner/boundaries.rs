//! Boundary derivation: which sessions participate and where the rows go.
//!
//! Collects the main source's in-span sessions, filters secondary sessions
//! through the affiliation oracle, and derives the sorted boundary set that
//! partitions the plan span. Every kept session endpoint strictly inside
//! the span becomes a boundary, which is what guarantees the one-session-
//! per-cell invariant during matrix construction; coalescing later drops
//! the boundaries that turn out to be redundant.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::models::{AffiliationOracle, BoundaryMode, Session, SourceId, TimeRange};

use super::matrix::{ArenaSession, SessionArena, SessionIdx};
use super::SourceTimeline;

/// Everything matrix construction needs, derived from raw timelines.
pub(crate) struct DerivedInputs {
    /// Column order: main first, secondaries in input order.
    pub sources: Vec<SourceId>,
    /// Arena holding every kept session.
    pub arena: SessionArena,
    /// Kept sessions per column.
    pub per_column: Vec<Vec<SessionIdx>>,
    /// Sorted boundary timestamps, plan edges included.
    pub boundaries: Vec<DateTime<Utc>>,
}

/// Derive planning inputs from the ordered timelines (main first).
///
/// Returns `None` when the main source has no session intersecting the
/// target span; composition is not applicable then.
pub(crate) fn derive(
    timelines: &[&SourceTimeline],
    target_span: TimeRange,
    oracle: &dyn AffiliationOracle,
    start_mode: BoundaryMode,
    end_mode: BoundaryMode,
) -> Option<DerivedInputs> {
    let main_timeline = timelines[0];

    let main_kept: Vec<&Session> = main_timeline
        .sessions()
        .filter(|s| s.range.intersects(&target_span))
        .collect();
    if main_kept.is_empty() {
        return None;
    }

    // Secondary sessions survive only if affiliated with a main session.
    let mut kept_per_column: Vec<Vec<&Session>> = vec![main_kept.clone()];
    for timeline in &timelines[1..] {
        let kept = timeline
            .sessions()
            .filter(|s| {
                main_kept.iter().any(|m| {
                    oracle.affiliated(&main_timeline.source, m, &timeline.source, s)
                })
            })
            .collect();
        kept_per_column.push(kept);
    }

    let (plan_start, plan_end) =
        plan_edges(&kept_per_column, target_span, start_mode, end_mode);

    let mut boundary_set: BTreeSet<DateTime<Utc>> = BTreeSet::new();
    boundary_set.insert(plan_start);
    boundary_set.insert(plan_end);
    for kept in &kept_per_column {
        for session in kept {
            for endpoint in [session.range.start, session.range.end] {
                if plan_start < endpoint && endpoint < plan_end {
                    boundary_set.insert(endpoint);
                }
            }
        }
    }

    let mut arena = SessionArena::default();
    let mut per_column = Vec::with_capacity(kept_per_column.len());
    for (column, kept) in kept_per_column.iter().enumerate() {
        per_column.push(
            kept.iter()
                .map(|session| {
                    arena.push(ArenaSession {
                        column,
                        recording: session.recording.clone(),
                        category: session.category.clone(),
                        range: session.range,
                    })
                })
                .collect(),
        );
    }

    Some(DerivedInputs {
        sources: timelines.iter().map(|t| t.source.clone()).collect(),
        arena,
        per_column,
        boundaries: boundary_set.into_iter().collect(),
    })
}

/// Plan start/end per the configured boundary modes, clamped to the
/// target span.
fn plan_edges(
    kept_per_column: &[Vec<&Session>],
    target_span: TimeRange,
    start_mode: BoundaryMode,
    end_mode: BoundaryMode,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let column_first = |kept: &[&Session]| kept.iter().map(|s| s.range.start).min();
    let column_last = |kept: &[&Session]| kept.iter().map(|s| s.range.end).max();

    let main_first = column_first(&kept_per_column[0]).expect("main kept is non-empty");
    let main_last = column_last(&kept_per_column[0]).expect("main kept is non-empty");

    let union_first = kept_per_column
        .iter()
        .filter_map(|kept| column_first(kept))
        .min()
        .unwrap_or(main_first);
    let union_last = kept_per_column
        .iter()
        .filter_map(|kept| column_last(kept))
        .max()
        .unwrap_or(main_last);

    let start = match start_mode {
        BoundaryMode::MainSpan => main_first,
        BoundaryMode::UnionSpan => union_first,
    };
    let end = match end_mode {
        BoundaryMode::MainSpan => main_last,
        BoundaryMode::UnionSpan => union_last,
    };

    (start.max(target_span.start), end.min(target_span.end))
}
