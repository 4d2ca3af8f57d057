//! Plan structures: segments, assignments, layouts, render plans.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::media::{MediaHandle, RecordingId, SourceId};
use super::time::TimeRange;

/// One interval of the final partition over the plan span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Half-open time range this segment covers.
    pub range: TimeRange,
}

impl Segment {
    /// Create a segment over a range.
    pub fn new(range: TimeRange) -> Self {
        Self { range }
    }

    /// Segment duration.
    pub fn duration(&self) -> Duration {
        self.range.duration()
    }
}

/// A source's footage for one segment: a sub-range of one recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    /// Recording the footage comes from.
    pub recording: RecordingId,
    /// Media handle of that recording.
    pub media: MediaHandle,
    /// Absolute range of the footage used.
    pub range: TimeRange,
    /// Offset of `range.start` from the recording's own start.
    pub offset_in_recording: Duration,
}

/// Per-segment mapping from source to its active clip, if any.
///
/// A source mapped to `None` (or missing) has no footage for the segment.
/// Invariant: at most one recording per source per segment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Assignment {
    entries: BTreeMap<SourceId, Option<Clip>>,
}

impl Assignment {
    /// Create an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a source's clip (or explicit absence) for this segment.
    pub fn set(&mut self, source: SourceId, clip: Option<Clip>) {
        self.entries.insert(source, clip);
    }

    /// The clip assigned to a source, if it is present.
    pub fn clip(&self, source: &SourceId) -> Option<&Clip> {
        self.entries.get(source).and_then(|c| c.as_ref())
    }

    /// Whether a source has footage in this segment.
    pub fn is_present(&self, source: &SourceId) -> bool {
        self.clip(source).is_some()
    }

    /// Number of sources with footage in this segment.
    pub fn present_count(&self) -> usize {
        self.entries.values().filter(|c| c.is_some()).count()
    }

    /// Sources with footage, in stable order.
    pub fn present_sources(&self) -> impl Iterator<Item = &SourceId> {
        self.entries
            .iter()
            .filter(|(_, clip)| clip.is_some())
            .map(|(source, _)| source)
    }

    /// All sources the assignment knows about, present or not.
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.entries.keys()
    }
}

/// Tile grid shape and resolution for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    /// Number of tile columns.
    pub grid_cols: u32,
    /// Number of tile rows.
    pub grid_rows: u32,
    /// Output resolution shared by every segment of the plan (width, height).
    pub resolution: (u32, u32),
    /// Size of one tile cell (width, height), aspect preserved by padding.
    pub cell_size: (u32, u32),
}

/// One emitted row of a render plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSegment {
    /// The time interval.
    pub segment: Segment,
    /// Which sources are present and with what footage.
    pub assignment: Assignment,
    /// Tile layout for this segment.
    pub layout: LayoutDescriptor,
}

/// A render-plan invariant violation.
///
/// These indicate internal logic errors in the planner; they are never
/// produced from valid inputs.
#[derive(Debug, thiserror::Error)]
pub enum PlanInvariantViolation {
    /// The plan has no segments.
    #[error("plan has no segments")]
    Empty,

    /// Consecutive segments leave a hole or overlap.
    #[error("segments {index} and {} are not contiguous", index + 1)]
    NotContiguous { index: usize },

    /// First segment does not start at the plan span start.
    #[error("first segment starts at {found}, plan starts at {expected}")]
    StartMismatch {
        expected: chrono::DateTime<chrono::Utc>,
        found: chrono::DateTime<chrono::Utc>,
    },

    /// Last segment does not end at the plan span end.
    #[error("last segment ends at {found}, plan ends at {expected}")]
    EndMismatch {
        expected: chrono::DateTime<chrono::Utc>,
        found: chrono::DateTime<chrono::Utc>,
    },
}

/// The complete ordered segment/assignment/layout sequence handed to the
/// encoding backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPlan {
    /// Full span the plan covers, a gap-free partition.
    pub span: TimeRange,
    /// Ordered, contiguous segments.
    pub segments: Vec<PlanSegment>,
    /// Maximum number of simultaneously present sources over the plan.
    pub max_concurrency: usize,
}

impl RenderPlan {
    /// Check the partition invariant: segments are sorted, contiguous,
    /// non-overlapping, and exactly cover `span`.
    pub fn validate(&self) -> Result<(), PlanInvariantViolation> {
        let first = self.segments.first().ok_or(PlanInvariantViolation::Empty)?;
        if first.segment.range.start != self.span.start {
            return Err(PlanInvariantViolation::StartMismatch {
                expected: self.span.start,
                found: first.segment.range.start,
            });
        }
        for (index, pair) in self.segments.windows(2).enumerate() {
            if pair[0].segment.range.end != pair[1].segment.range.start {
                return Err(PlanInvariantViolation::NotContiguous { index });
            }
        }
        let last = self.segments.last().expect("checked non-empty");
        if last.segment.range.end != self.span.end {
            return Err(PlanInvariantViolation::EndMismatch {
                expected: self.span.end,
                found: last.segment.range.end,
            });
        }
        Ok(())
    }

    /// Serialize the plan for the external backend hand-off.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::super::time::test_support::mins;
    use super::*;

    fn layout1() -> LayoutDescriptor {
        LayoutDescriptor {
            grid_cols: 1,
            grid_rows: 1,
            resolution: (1920, 1080),
            cell_size: (1920, 1080),
        }
    }

    fn plan_segment(start: i64, end: i64) -> PlanSegment {
        PlanSegment {
            segment: Segment::new(mins(start, end)),
            assignment: Assignment::new(),
            layout: layout1(),
        }
    }

    #[test]
    fn assignment_counts_present_sources() {
        let mut assignment = Assignment::new();
        assignment.set(SourceId::new("cam_a"), None);
        assignment.set(
            SourceId::new("cam_b"),
            Some(Clip {
                recording: RecordingId::new("r1"),
                media: MediaHandle::new("media://r1"),
                range: mins(0, 10),
                offset_in_recording: Duration::zero(),
            }),
        );

        assert_eq!(assignment.present_count(), 1);
        assert!(assignment.is_present(&SourceId::new("cam_b")));
        assert!(!assignment.is_present(&SourceId::new("cam_a")));
    }

    #[test]
    fn validate_accepts_contiguous_partition() {
        let plan = RenderPlan {
            span: mins(0, 30),
            segments: vec![plan_segment(0, 10), plan_segment(10, 30)],
            max_concurrency: 1,
        };
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn validate_rejects_gap_between_segments() {
        let plan = RenderPlan {
            span: mins(0, 30),
            segments: vec![plan_segment(0, 10), plan_segment(15, 30)],
            max_concurrency: 1,
        };
        assert!(matches!(
            plan.validate(),
            Err(PlanInvariantViolation::NotContiguous { index: 0 })
        ));
    }

    #[test]
    fn validate_rejects_edge_mismatch() {
        let plan = RenderPlan {
            span: mins(0, 30),
            segments: vec![plan_segment(5, 30)],
            max_concurrency: 1,
        };
        assert!(matches!(
            plan.validate(),
            Err(PlanInvariantViolation::StartMismatch { .. })
        ));

        let plan = RenderPlan {
            span: mins(0, 30),
            segments: vec![plan_segment(0, 25)],
            max_concurrency: 1,
        };
        assert!(matches!(
            plan.validate(),
            Err(PlanInvariantViolation::EndMismatch { .. })
        ));
    }

    #[test]
    fn plan_serializes_to_json() {
        let plan = RenderPlan {
            span: mins(0, 10),
            segments: vec![plan_segment(0, 10)],
            max_concurrency: 2,
        };
        let json = plan.to_json().unwrap();
        assert!(json.contains("max_concurrency"));
    }
}
