//! Capture-related data structures (sources, recordings, sessions).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::time::TimeRange;

/// Identifier for a capture source (e.g., "cam_main", "cam_guest_2").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    /// Create a new source identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for one continuous recording of a source.
///
/// Stable within a planning invocation; typically derived from the
/// recording's storage key by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingId(pub String);

impl RecordingId {
    /// Create a new recording identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category tag attached to a session (activity/subject label).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub String);

impl Category {
    /// Create a new category tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to a recording's media or sample data.
///
/// The core never opens it; it is carried through to the plan so the
/// encoding backend can locate the footage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaHandle(pub String);

impl MediaHandle {
    /// Create a new media handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }
}

/// Errors raised while constructing model values.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Recording sessions do not exactly tile the recording span.
    #[error("recording '{recording}': sessions must contiguously cover {expected}, found gap or overlap at {at}")]
    SessionCoverage {
        recording: RecordingId,
        expected: TimeRange,
        at: DateTime<Utc>,
    },

    /// A session references a different recording than its owner.
    #[error("recording '{recording}': session belongs to '{found}'")]
    ForeignSession {
        recording: RecordingId,
        found: RecordingId,
    },

    /// A recording has no sessions at all.
    #[error("recording '{0}' has no sessions")]
    EmptyRecording(RecordingId),
}

/// A tagged sub-interval of exactly one recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The recording this session belongs to.
    pub recording: RecordingId,
    /// Activity/subject label for this stretch of footage.
    pub category: Category,
    /// Absolute time range covered.
    pub range: TimeRange,
}

impl Session {
    /// Create a new session.
    pub fn new(recording: RecordingId, category: impl Into<String>, range: TimeRange) -> Self {
        Self {
            recording,
            category: Category::new(category),
            range,
        }
    }
}

/// One continuous capture from a single source.
///
/// Invariant (checked by [`Recording::new`]): the sessions are ordered,
/// non-overlapping, contiguous, and together exactly span the recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Recording identity.
    pub id: RecordingId,
    /// Source that produced this recording.
    pub source: SourceId,
    /// Absolute span of the capture.
    pub span: TimeRange,
    /// Ordered sessions exactly tiling `span`.
    pub sessions: Vec<Session>,
    /// Handle to the media (or sample) data.
    pub media: MediaHandle,
}

impl Recording {
    /// Create a recording, validating the session-coverage invariant.
    pub fn new(
        id: RecordingId,
        source: SourceId,
        span: TimeRange,
        sessions: Vec<Session>,
        media: MediaHandle,
    ) -> Result<Self, ModelError> {
        if sessions.is_empty() {
            return Err(ModelError::EmptyRecording(id));
        }

        let mut cursor = span.start;
        for session in &sessions {
            if session.recording != id {
                return Err(ModelError::ForeignSession {
                    recording: id,
                    found: session.recording.clone(),
                });
            }
            if session.range.start != cursor {
                return Err(ModelError::SessionCoverage {
                    recording: id,
                    expected: span,
                    at: cursor,
                });
            }
            cursor = session.range.end;
        }
        if cursor != span.end {
            return Err(ModelError::SessionCoverage {
                recording: id,
                expected: span,
                at: cursor,
            });
        }

        Ok(Self {
            id,
            source,
            span,
            sessions,
            media,
        })
    }

    /// Convenience constructor: a recording with one session per
    /// `(category, duration)` entry, tiling the span from `start`.
    pub fn from_session_layout(
        id: impl Into<String>,
        source: impl Into<String>,
        start: DateTime<Utc>,
        layout: &[(&str, Duration)],
        media: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let id = RecordingId::new(id);
        let mut cursor = start;
        let mut sessions = Vec::with_capacity(layout.len());
        for (category, duration) in layout {
            let range = TimeRange::from_start(cursor, *duration);
            sessions.push(Session::new(id.clone(), *category, range));
            cursor = range.end;
        }
        Self::new(
            id,
            SourceId::new(source),
            TimeRange::new(start, cursor),
            sessions,
            MediaHandle::new(media),
        )
    }

    /// Duration of the capture.
    pub fn duration(&self) -> Duration {
        self.span.duration()
    }
}
