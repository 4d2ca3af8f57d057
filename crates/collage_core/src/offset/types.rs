//! Core types for offset estimation.

use serde::{Deserialize, Serialize};

/// Mono audio samples for one recording.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    /// Samples as f64 (mono; callers downmix multi-channel input).
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioTrack {
    /// Create a track from samples.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Borrow a window of samples starting at the given time offset.
    ///
    /// Returns `None` if the window would start before the track or extend
    /// past its end. Borrowing keeps memory bounded by the window
    /// configuration; multi-hour tracks are never duplicated.
    pub fn extract_window(&self, start_secs: f64, duration_secs: f64) -> Option<&[f64]> {
        if start_secs < 0.0 || duration_secs <= 0.0 {
            return None;
        }
        let start = (start_secs * self.sample_rate as f64).round() as usize;
        let len = (duration_secs * self.sample_rate as f64).round() as usize;
        let end = start.checked_add(len)?;
        self.samples.get(start..end)
    }
}

/// Why the estimator could not commit to an offset.
///
/// All of these are legitimate outcomes of ambiguous correlation evidence,
/// not errors; callers should retry with different window parameters or
/// fall back to a default offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndeterminateReason {
    /// The two tracks do not overlap long enough for one macro window.
    InsufficientOverlap,
    /// No micro window produced a peak above the acceptance threshold.
    NoAcceptedWindows,
    /// Fewer than two buckets collected more than one vote.
    InsufficientAgreement,
    /// No bucket stood out against the mean + stddev popularity cut.
    NoPopularBucket,
    /// Two equally-voted buckets more than one bucket width apart; the
    /// true offset cannot be distinguished from an echo/alias.
    AmbiguousPeaks {
        /// Bucket distance between the two candidates, in bucket widths.
        bucket_distance: i64,
    },
}

impl std::fmt::Display for IndeterminateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientOverlap => f.write_str("tracks overlap less than one macro window"),
            Self::NoAcceptedWindows => f.write_str("no correlation peak cleared the threshold"),
            Self::InsufficientAgreement => f.write_str("fewer than two buckets with repeat votes"),
            Self::NoPopularBucket => f.write_str("no bucket cleared the popularity cut"),
            Self::AmbiguousPeaks { bucket_distance } => {
                write!(f, "two equal peaks {bucket_distance} buckets apart")
            }
        }
    }
}

/// A committed offset estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetEstimate {
    /// Estimated offset in seconds to add to the other track's timestamps
    /// to align them with the reference track.
    pub offset_secs: f64,
    /// Number of votes in the winning bucket (spillover included).
    pub votes: usize,
    /// Total peak weight behind the winning bucket.
    pub peak_weight: f64,
}

/// Result of an estimation run: a committed offset or a typed refusal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OffsetVerdict {
    /// Confident refined offset.
    Estimate(OffsetEstimate),
    /// Ambiguous evidence; no offset is returned.
    Indeterminate(IndeterminateReason),
}

impl OffsetVerdict {
    /// The estimate, if one was committed.
    pub fn estimate(&self) -> Option<&OffsetEstimate> {
        match self {
            Self::Estimate(e) => Some(e),
            Self::Indeterminate(_) => None,
        }
    }
}

/// Errors from the offset estimator.
#[derive(Debug, thiserror::Error)]
pub enum OffsetError {
    /// Rejected configuration; surfaced before any computation.
    #[error("invalid estimator configuration: {0}")]
    InvalidConfig(String),

    /// Tracks must share one sample rate.
    #[error("sample rate mismatch: {reference} vs {other}")]
    SampleRateMismatch { reference: u32, other: u32 },

    /// A track carries no samples.
    #[error("empty audio track")]
    EmptyTrack,
}

/// Result type for offset estimation.
pub type OffsetResult<T> = Result<T, OffsetError>;
