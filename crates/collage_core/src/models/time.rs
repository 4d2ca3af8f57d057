//! Half-open time intervals over wall-clock time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)` of wall-clock time.
///
/// Empty ranges (`start == end`) are allowed; inverted ranges are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive start instant.
    pub start: DateTime<Utc>,
    /// Exclusive end instant.
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a new range. Panics if `end` precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "inverted time range: {start} > {end}");
        Self { start, end }
    }

    /// Create a range from a start instant and a duration.
    pub fn from_start(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    /// Length of the range.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether the range contains no time.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether this range overlaps `other` by a positive duration.
    pub fn intersects(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The overlapping portion of two ranges, if it has positive duration.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(TimeRange { start, end })
        } else {
            None
        }
    }

    /// Whether an instant falls inside the half-open interval.
    pub fn contains_instant(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Whether `other` ends exactly where this range starts, or vice versa.
    pub fn abuts(&self, other: &TimeRange) -> bool {
        self.end == other.start || other.end == self.start
    }

    /// Smallest range covering both inputs.
    pub fn union_span(&self, other: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {})", self.start, self.end)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{mins, t};
    use super::*;

    #[test]
    fn intersects_requires_positive_overlap() {
        assert!(mins(0, 10).intersects(&mins(5, 15)));
        assert!(!mins(0, 10).intersects(&mins(10, 20))); // abutting, not overlapping
        assert!(!mins(0, 10).intersects(&mins(20, 30)));
    }

    #[test]
    fn intersection_clips_to_overlap() {
        let got = mins(0, 10).intersection(&mins(5, 15)).unwrap();
        assert_eq!(got, mins(5, 10));
        assert!(mins(0, 10).intersection(&mins(10, 20)).is_none());
    }

    #[test]
    fn contains_instant_is_half_open() {
        let r = mins(0, 10);
        assert!(r.contains_instant(t(0)));
        assert!(r.contains_instant(t(9)));
        assert!(!r.contains_instant(t(10)));
    }

    #[test]
    fn union_span_covers_both() {
        assert_eq!(mins(0, 5).union_span(&mins(8, 12)), mins(0, 12));
    }

    #[test]
    #[should_panic(expected = "inverted time range")]
    fn inverted_range_panics() {
        TimeRange::new(t(10), t(0));
    }
}
