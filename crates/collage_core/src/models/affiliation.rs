//! Affiliation between sessions of different sources.
//!
//! Whether a secondary source's session "belongs with" a main-source
//! session is decided by an injected capability rather than a global
//! lookup table. The default implementation matches category tags; an
//! external oracle (e.g., backed by a social-signal service) can be
//! supplied by the caller instead.

use super::media::{Session, SourceId};
use super::time::TimeRange;

/// Capability deciding whether two sources are affiliated over a range.
pub trait AffiliationOracle: Send + Sync {
    /// Whether sessions of `a` and `b` overlapping `range` are related.
    fn affiliates_at(&self, a: &SourceId, b: &SourceId, range: TimeRange) -> bool;

    /// Whether a secondary session is affiliated with a main session.
    ///
    /// The default implementation requires overlapping ranges and either
    /// a category match or a positive oracle answer for the overlap.
    fn affiliated(
        &self,
        main_source: &SourceId,
        main: &Session,
        other_source: &SourceId,
        other: &Session,
    ) -> bool {
        if !main.range.intersects(&other.range) {
            return false;
        }
        if main.category == other.category {
            return true;
        }
        match main.range.intersection(&other.range) {
            Some(overlap) => self.affiliates_at(main_source, other_source, overlap),
            None => false,
        }
    }
}

/// Affiliation by category equality only.
///
/// This is the behavior used when no external oracle is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryAffiliation;

impl AffiliationOracle for CategoryAffiliation {
    fn affiliates_at(&self, _a: &SourceId, _b: &SourceId, _range: TimeRange) -> bool {
        false
    }
}
