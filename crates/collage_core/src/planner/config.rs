//! Planner configuration and validation.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::{BoundaryMode, Category};

use super::PlanError;

/// Configuration for one planning invocation.
///
/// Validated by [`PlannerConfig::validate`] before any computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// How the plan's start boundary is derived.
    pub start_mode: BoundaryMode,
    /// How the plan's end boundary is derived.
    pub end_mode: BoundaryMode,
    /// Trim-pass window: rows looked back for accepted categories.
    /// Both trim fields must be set together; `None` disables the pass.
    pub trim_lookback: Option<u32>,
    /// Trim-pass window: rows looked ahead for accepted categories.
    pub trim_lookahead: Option<u32>,
    /// Categories that never contribute to the trim-accepted set.
    pub non_grouping_categories: Vec<Category>,
    /// Absent runs shorter than this are gap-filled. Zero disables.
    pub min_gap: Duration,
    /// Secondary sources with less total presence are dropped entirely.
    pub minimum_time_in_video: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            start_mode: BoundaryMode::MainSpan,
            end_mode: BoundaryMode::MainSpan,
            trim_lookback: Some(1),
            trim_lookahead: Some(1),
            non_grouping_categories: Vec::new(),
            min_gap: Duration::zero(),
            minimum_time_in_video: Duration::zero(),
        }
    }
}

impl PlannerConfig {
    /// The trim window, if the trim pass is enabled.
    pub fn trim_window(&self) -> Option<(usize, usize)> {
        match (self.trim_lookback, self.trim_lookahead) {
            (Some(back), Some(ahead)) => Some((back as usize, ahead as usize)),
            _ => None,
        }
    }

    /// Reject malformed configurations before planning starts.
    pub fn validate(&self) -> Result<(), PlanError> {
        match (self.trim_lookback, self.trim_lookahead) {
            (Some(_), Some(_)) | (None, None) => {}
            _ => {
                return Err(PlanError::InvalidConfig(
                    "trim lookback and lookahead must be configured together".into(),
                ))
            }
        }
        if self.min_gap < Duration::zero() {
            return Err(PlanError::InvalidConfig(format!(
                "min gap must not be negative, got {}",
                self.min_gap
            )));
        }
        if self.minimum_time_in_video < Duration::zero() {
            return Err(PlanError::InvalidConfig(format!(
                "minimum time in video must not be negative, got {}",
                self.minimum_time_in_video
            )));
        }
        Ok(())
    }
}
