//! Data models for Collage.
//!
//! This module contains the core value structures shared by the planner:
//! - Time intervals (`TimeRange`)
//! - Capture structures (sources, recordings, sessions)
//! - Plan structures (segments, assignments, render plans)
//! - The affiliation capability used to relate sessions across sources
//!
//! All entities are immutable value data constructed once per planning
//! invocation; nothing here holds shared mutable state.

mod affiliation;
mod enums;
mod media;
mod plan;
mod time;

pub use affiliation::{AffiliationOracle, CategoryAffiliation};
pub use enums::BoundaryMode;
pub use media::{Category, MediaHandle, ModelError, Recording, RecordingId, Session, SourceId};
pub use plan::{
    Assignment, Clip, LayoutDescriptor, PlanInvariantViolation, PlanSegment, RenderPlan, Segment,
};
pub use time::TimeRange;

#[cfg(test)]
pub(crate) use time::test_support;
