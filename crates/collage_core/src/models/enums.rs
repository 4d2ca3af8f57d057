//! Enumerations shared across the planner.

use serde::{Deserialize, Serialize};

/// How a plan edge (start or end) is derived during boundary derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Clamp the plan edge to the main source's own first/last boundary.
    #[default]
    MainSpan,
    /// Extend the plan edge to the union of all sources' boundaries.
    UnionSpan,
}

impl std::fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryMode::MainSpan => f.write_str("main_span"),
            BoundaryMode::UnionSpan => f.write_str("union_span"),
        }
    }
}
