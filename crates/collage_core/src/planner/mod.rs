//! Composition planning: turn per-source session timelines into an
//! ordered, gap-free segment plan.
//!
//! Planning is a fixed pipeline of pure passes over a working matrix:
//! boundary derivation, matrix construction, trim, gap-fill, presence
//! filter, coalesce, then emission. Each invocation owns its own
//! matrix and arena; nothing is shared, so concurrent calls over
//! different inputs are safe.

use std::collections::{HashMap, HashSet};

use chrono::Duration;

use crate::layout;
use crate::models::{
    AffiliationOracle, Assignment, Clip, RecordingId, RenderPlan, PlanSegment, Segment, SourceId,
    TimeRange,
};

mod boundaries;
mod coalesce;
mod config;
mod gapfill;
mod matrix;
mod presence;
mod trim;

pub use config::PlannerConfig;

use matrix::PlanMatrix;

/// Everything one source contributes to planning: its recordings, each
/// carrying the tagged sessions that tile it.
#[derive(Debug, Clone)]
pub struct SourceTimeline {
    /// The source these recordings belong to.
    pub source: SourceId,
    /// The source's recordings, any order.
    pub recordings: Vec<crate::models::Recording>,
}

impl SourceTimeline {
    /// Create a timeline for a source.
    pub fn new(source: SourceId, recordings: Vec<crate::models::Recording>) -> Self {
        Self { source, recordings }
    }

    /// All sessions across all recordings.
    pub fn sessions(&self) -> impl Iterator<Item = &crate::models::Session> {
        self.recordings.iter().flat_map(|rec| rec.sessions.iter())
    }
}

/// Why planning legitimately produced no composition.
///
/// Callers must treat this as "skip, do not retry", distinct from an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoCompositionReason {
    /// The main source has no session inside the target span.
    MainSourceAbsent,
    /// No secondary source survived filtering with any presence.
    SoloSource,
}

impl std::fmt::Display for NoCompositionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MainSourceAbsent => f.write_str("main source absent from target span"),
            Self::SoloSource => f.write_str("only the main source remains"),
        }
    }
}

/// Outcome of a planning call.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// A complete plan was produced.
    Plan(RenderPlan),
    /// Composition is not applicable for these inputs.
    NoComposition(NoCompositionReason),
}

impl PlanOutcome {
    /// The plan, if one was produced.
    pub fn plan(&self) -> Option<&RenderPlan> {
        match self {
            Self::Plan(plan) => Some(plan),
            Self::NoComposition(_) => None,
        }
    }
}

/// Errors from invalid planning inputs.
///
/// These are caller mistakes, rejected before any computation. Internal
/// invariant violations are not represented here; those abort the call.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The configuration is malformed.
    #[error("invalid planner configuration: {0}")]
    InvalidConfig(String),

    /// The named main source has no timeline.
    #[error("main source '{0}' has no timeline")]
    UnknownMainSource(SourceId),

    /// Two timelines claim the same source.
    #[error("duplicate timeline for source '{0}'")]
    DuplicateSource(SourceId),

    /// A recording is filed under a timeline of a different source.
    #[error("timeline for '{timeline}' contains recording '{recording}' of source '{owner}'")]
    ForeignRecording {
        timeline: SourceId,
        recording: RecordingId,
        owner: SourceId,
    },
}

/// Plan a composition over `target_span`.
///
/// `timelines` holds every candidate source, `main_source` names the one
/// whose sessions anchor the plan. Secondary sessions participate only
/// when affiliated with a main session, per `oracle`.
pub fn plan(
    timelines: &[SourceTimeline],
    main_source: &SourceId,
    target_span: TimeRange,
    oracle: &dyn AffiliationOracle,
    config: &PlannerConfig,
) -> Result<PlanOutcome, PlanError> {
    config.validate()?;
    check_timelines(timelines)?;

    let main_index = timelines
        .iter()
        .position(|t| &t.source == main_source)
        .ok_or_else(|| PlanError::UnknownMainSource(main_source.clone()))?;

    // Column order: main first, secondaries in input order.
    let mut ordered: Vec<&SourceTimeline> = Vec::with_capacity(timelines.len());
    ordered.push(&timelines[main_index]);
    ordered.extend(
        timelines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != main_index)
            .map(|(_, t)| t),
    );

    let Some(derived) = boundaries::derive(
        &ordered,
        target_span,
        oracle,
        config.start_mode,
        config.end_mode,
    ) else {
        tracing::info!(main = %main_source, span = %target_span, "no main sessions in span");
        return Ok(PlanOutcome::NoComposition(NoCompositionReason::MainSourceAbsent));
    };

    let mut matrix = PlanMatrix::build(
        derived.sources,
        derived.boundaries,
        derived.arena,
        &derived.per_column,
    );
    tracing::debug!(
        rows = matrix.row_count(),
        sources = matrix.column_count(),
        "planning matrix built"
    );

    if let Some((lookback, lookahead)) = config.trim_window() {
        trim::trim(&mut matrix, lookback, lookahead, &config.non_grouping_categories);
    }
    gapfill::fill_gaps(&mut matrix, &ordered, config.min_gap);
    presence::filter_thin_sources(&mut matrix, config.minimum_time_in_video);
    coalesce::coalesce(&mut matrix);

    let any_secondary_presence = (1..matrix.column_count())
        .any(|column| matrix.column_presence(column) > Duration::zero());
    if !any_secondary_presence {
        tracing::info!(main = %main_source, "no secondary footage survived filtering");
        return Ok(PlanOutcome::NoComposition(NoCompositionReason::SoloSource));
    }

    let plan = emit(&matrix, &ordered);
    if let Err(violation) = plan.validate() {
        panic!("emitted plan violates the partition invariant: {violation}");
    }
    tracing::info!(
        segments = plan.segments.len(),
        sources = matrix.column_count(),
        max_concurrency = plan.max_concurrency,
        span = %plan.span,
        "plan emitted"
    );
    Ok(PlanOutcome::Plan(plan))
}

fn check_timelines(timelines: &[SourceTimeline]) -> Result<(), PlanError> {
    let mut seen = HashSet::new();
    for timeline in timelines {
        if !seen.insert(&timeline.source) {
            return Err(PlanError::DuplicateSource(timeline.source.clone()));
        }
        for recording in &timeline.recordings {
            if recording.source != timeline.source {
                return Err(PlanError::ForeignRecording {
                    timeline: timeline.source.clone(),
                    recording: recording.id.clone(),
                    owner: recording.source.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Turn the finished matrix into a RenderPlan.
fn emit(matrix: &PlanMatrix, timelines: &[&SourceTimeline]) -> RenderPlan {
    let catalog: HashMap<&RecordingId, &crate::models::Recording> = timelines
        .iter()
        .flat_map(|t| t.recordings.iter())
        .map(|rec| (&rec.id, rec))
        .collect();

    let present_count = |row: usize| {
        (0..matrix.column_count())
            .filter(|&column| matrix.is_present(row, column))
            .count()
    };
    let max_concurrency = (0..matrix.row_count()).map(present_count).max().unwrap_or(0);
    let resolution = layout::resolution_for(max_concurrency);

    let mut segments = Vec::with_capacity(matrix.row_count());
    for row in 0..matrix.row_count() {
        let row_range = matrix.row_range(row);
        let mut assignment = Assignment::new();
        for (column, source) in matrix.sources.iter().enumerate() {
            let cell = &matrix.rows[row][column];
            let Some(&first) = cell.first() else {
                assignment.set(source.clone(), None);
                continue;
            };

            // All sessions in a cell share one recording.
            let recording_id = &matrix.arena.get(first).recording;
            let recording = catalog
                .get(recording_id)
                .unwrap_or_else(|| panic!("cell references unknown recording '{recording_id}'"));

            let mut coverage = matrix.arena.get(first).range;
            for &idx in &cell[1..] {
                coverage = coverage.union_span(&matrix.arena.get(idx).range);
            }
            let clip_range = row_range
                .intersection(&coverage)
                .unwrap_or_else(|| panic!("present cell does not overlap row {row_range}"));
            assignment.set(
                source.clone(),
                Some(Clip {
                    recording: recording.id.clone(),
                    media: recording.media.clone(),
                    range: clip_range,
                    offset_in_recording: clip_range.start - recording.span.start,
                }),
            );
        }
        let layout = layout::descriptor_for(present_count(row), resolution);
        segments.push(PlanSegment {
            segment: Segment::new(row_range),
            assignment,
            layout,
        });
    }

    RenderPlan {
        span: TimeRange::new(
            *matrix.boundaries.first().expect("matrix has boundaries"),
            *matrix.boundaries.last().expect("matrix has boundaries"),
        ),
        segments,
        max_concurrency,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::models::test_support::{mins, t};
    use crate::models::{CategoryAffiliation, Recording};

    use super::*;

    fn timeline(source: &str, recording: &str, start: i64, layout: &[(&str, i64)]) -> SourceTimeline {
        let layout: Vec<(&str, Duration)> = layout
            .iter()
            .map(|&(cat, minutes)| (cat, Duration::minutes(minutes)))
            .collect();
        SourceTimeline::new(
            SourceId::new(source),
            vec![Recording::from_session_layout(
                recording,
                source,
                t(start),
                &layout,
                format!("media://{recording}"),
            )
            .unwrap()],
        )
    }

    fn run(
        timelines: &[SourceTimeline],
        span: TimeRange,
        config: &PlannerConfig,
    ) -> PlanOutcome {
        plan(
            timelines,
            &timelines[0].source,
            span,
            &CategoryAffiliation,
            config,
        )
        .unwrap()
    }

    #[test]
    fn full_overlap_same_category_yields_one_two_up_segment() {
        let timelines = vec![
            timeline("cam_a", "r1", 0, &[("talk", 240)]),
            timeline("cam_b", "r2", 0, &[("talk", 240)]),
        ];

        let outcome = run(&timelines, mins(0, 240), &PlannerConfig::default());
        let plan = outcome.plan().expect("plan expected");

        assert_eq!(plan.segments.len(), 1);
        assert_eq!(plan.span, mins(0, 240));
        assert_eq!(plan.max_concurrency, 2);

        let segment = &plan.segments[0];
        assert_eq!(segment.assignment.present_count(), 2);
        assert_eq!((segment.layout.grid_cols, segment.layout.grid_rows), (2, 1));

        let clip = segment.assignment.clip(&SourceId::new("cam_b")).unwrap();
        assert_eq!(clip.range, mins(0, 240));
        assert_eq!(clip.offset_in_recording, Duration::zero());
    }

    #[test]
    fn category_mismatch_isolates_secondary_to_matching_segment() {
        let timelines = vec![
            timeline("cam_a", "r1", 0, &[("a", 30), ("b", 30), ("a", 30)]),
            timeline("cam_b", "r2", 30, &[("b", 30)]),
        ];
        let config = PlannerConfig {
            trim_lookback: Some(0),
            trim_lookahead: Some(0),
            ..Default::default()
        };

        let outcome = run(&timelines, mins(0, 90), &config);
        let plan = outcome.plan().expect("plan expected");
        let cam_b = SourceId::new("cam_b");

        assert_eq!(plan.segments.len(), 3);
        assert!(!plan.segments[0].assignment.is_present(&cam_b));
        assert!(plan.segments[1].assignment.is_present(&cam_b));
        assert!(!plan.segments[2].assignment.is_present(&cam_b));
        assert_eq!(plan.segments[1].segment.range, mins(30, 60));
    }

    #[test]
    fn short_absence_inside_recording_is_bridged() {
        // cam_b's middle session is unaffiliated (no main "gaming") and
        // gets dropped, leaving a 2 minute hole inside recording r2.
        let timelines = vec![
            timeline("cam_a", "r1", 0, &[("talk", 70)]),
            timeline("cam_b", "r2", 0, &[("talk", 30), ("gaming", 2), ("talk", 38)]),
        ];
        let config = PlannerConfig {
            trim_lookback: None,
            trim_lookahead: None,
            min_gap: Duration::minutes(5),
            ..Default::default()
        };

        let outcome = run(&timelines, mins(0, 70), &config);
        let plan = outcome.plan().expect("plan expected");

        // Presence is continuous, so everything coalesces into one segment.
        assert_eq!(plan.segments.len(), 1);
        let clip = plan.segments[0]
            .assignment
            .clip(&SourceId::new("cam_b"))
            .unwrap();
        assert_eq!(clip.range, mins(0, 70));
    }

    #[test]
    fn thin_secondary_is_absent_from_every_segment() {
        let timelines = vec![
            timeline("cam_a", "r1", 0, &[("talk", 60)]),
            timeline("cam_b", "r2", 20, &[("talk", 10)]),
            timeline("cam_c", "r3", 0, &[("talk", 60)]),
        ];
        let config = PlannerConfig {
            minimum_time_in_video: Duration::minutes(15),
            ..Default::default()
        };

        let outcome = run(&timelines, mins(0, 60), &config);
        let plan = outcome.plan().expect("plan expected");
        let cam_b = SourceId::new("cam_b");

        assert!(!plan.segments.is_empty());
        for segment in &plan.segments {
            assert!(!segment.assignment.is_present(&cam_b));
            assert!(segment.assignment.clip(&cam_b).is_none());
        }
    }

    #[test]
    fn main_absent_from_span_is_no_composition() {
        let timelines = vec![
            timeline("cam_a", "r1", 0, &[("talk", 30)]),
            timeline("cam_b", "r2", 60, &[("talk", 30)]),
        ];

        let outcome = run(&timelines, mins(60, 120), &PlannerConfig::default());
        assert_eq!(
            outcome,
            PlanOutcome::NoComposition(NoCompositionReason::MainSourceAbsent)
        );
    }

    #[test]
    fn filtered_out_secondaries_leave_no_composition() {
        let timelines = vec![
            timeline("cam_a", "r1", 0, &[("talk", 60)]),
            timeline("cam_b", "r2", 20, &[("talk", 10)]),
        ];
        let config = PlannerConfig {
            minimum_time_in_video: Duration::minutes(15),
            ..Default::default()
        };

        let outcome = run(&timelines, mins(0, 60), &config);
        assert_eq!(
            outcome,
            PlanOutcome::NoComposition(NoCompositionReason::SoloSource)
        );
    }

    #[test]
    fn true_gap_rows_are_preserved() {
        // Main records in two stretches; nobody covers [30, 40).
        let main = SourceTimeline::new(
            SourceId::new("cam_a"),
            vec![
                Recording::from_session_layout(
                    "r1",
                    "cam_a",
                    t(0),
                    &[("talk", Duration::minutes(30))],
                    "media://r1",
                )
                .unwrap(),
                Recording::from_session_layout(
                    "r3",
                    "cam_a",
                    t(40),
                    &[("talk", Duration::minutes(30))],
                    "media://r3",
                )
                .unwrap(),
            ],
        );
        let side = timeline("cam_b", "r2", 5, &[("talk", 20)]);

        let outcome = run(&[main, side], mins(0, 70), &PlannerConfig::default());
        let plan = outcome.plan().expect("plan expected");

        let gap = plan
            .segments
            .iter()
            .find(|s| s.segment.range == mins(30, 40))
            .expect("gap segment preserved");
        assert_eq!(gap.assignment.present_count(), 0);
        assert_eq!((gap.layout.grid_cols, gap.layout.grid_rows), (1, 1));
        plan.validate().unwrap();
    }

    #[test]
    fn every_clip_overlaps_its_segment_and_recording() {
        let timelines = vec![
            timeline("cam_a", "r1", 0, &[("talk", 40), ("music", 40), ("talk", 40)]),
            timeline("cam_b", "r2", 10, &[("talk", 50), ("music", 20)]),
            timeline("cam_c", "r4", 30, &[("music", 60)]),
        ];
        let catalog: HashMap<RecordingId, TimeRange> = timelines
            .iter()
            .flat_map(|t| t.recordings.iter())
            .map(|rec| (rec.id.clone(), rec.span))
            .collect();

        let outcome = run(&timelines, mins(0, 120), &PlannerConfig::default());
        let plan = outcome.plan().expect("plan expected");
        plan.validate().unwrap();

        for segment in &plan.segments {
            for source in segment.assignment.present_sources() {
                let clip = segment.assignment.clip(source).unwrap();
                assert!(clip.range.intersects(&segment.segment.range));
                let span = catalog[&clip.recording];
                assert!(span.start <= clip.range.start && clip.range.end <= span.end);
                assert_eq!(clip.offset_in_recording, clip.range.start - span.start);
            }
        }
    }

    #[test]
    fn dropping_a_source_never_raises_another_sources_presence() {
        let with_c = vec![
            timeline("cam_a", "r1", 0, &[("talk", 90)]),
            timeline("cam_b", "r2", 10, &[("talk", 50)]),
            timeline("cam_c", "r3", 0, &[("talk", 90)]),
        ];
        let without_c = with_c[..2].to_vec();

        let presence_of = |timelines: &[SourceTimeline]| {
            let outcome = run(timelines, mins(0, 90), &PlannerConfig::default());
            let plan = outcome.plan().expect("plan expected").clone();
            let cam_b = SourceId::new("cam_b");
            plan.segments
                .iter()
                .filter(|s| s.assignment.is_present(&cam_b))
                .fold(Duration::zero(), |acc, s| acc + s.segment.duration())
        };

        assert!(presence_of(&without_c) <= presence_of(&with_c));
    }

    #[test]
    fn unknown_main_source_is_rejected() {
        let timelines = vec![timeline("cam_a", "r1", 0, &[("talk", 30)])];
        let err = plan(
            &timelines,
            &SourceId::new("cam_z"),
            mins(0, 30),
            &CategoryAffiliation,
            &PlannerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::UnknownMainSource(_)));
    }

    #[test]
    fn duplicate_timeline_is_rejected() {
        let timelines = vec![
            timeline("cam_a", "r1", 0, &[("talk", 30)]),
            timeline("cam_a", "r2", 0, &[("talk", 30)]),
        ];
        let err = plan(
            &timelines,
            &SourceId::new("cam_a"),
            mins(0, 30),
            &CategoryAffiliation,
            &PlannerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::DuplicateSource(_)));
    }

    #[test]
    fn mislabeled_recording_owner_is_rejected() {
        let mut rogue = timeline("cam_b", "r2", 0, &[("talk", 30)]);
        rogue.source = SourceId::new("cam_c");
        let timelines = vec![timeline("cam_a", "r1", 0, &[("talk", 30)]), rogue];

        let err = plan(
            &timelines,
            &SourceId::new("cam_a"),
            mins(0, 30),
            &CategoryAffiliation,
            &PlannerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::ForeignRecording { .. }));
    }
}
