//! Estimator configuration and validation.

use serde::{Deserialize, Serialize};

use super::types::{OffsetError, OffsetResult};

/// Minimum macro window length in seconds.
pub const MACRO_WINDOW_FLOOR_SECS: f64 = 600.0;

/// Required ratio between macro and micro window sizes.
pub const MACRO_TO_MICRO_RATIO: f64 = 5.0;

/// Configuration for offset estimation.
///
/// Validated by [`EstimatorConfig::validate`] before any computation;
/// an invalid configuration is a contract violation, never attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Macro analysis window length in seconds.
    pub macro_window_secs: f64,
    /// Micro (sliding) window length in seconds.
    pub micro_window_secs: f64,
    /// Micro window stride in seconds. `None` means half the micro window.
    pub micro_stride_secs: Option<f64>,
    /// Vote bucket width in seconds.
    pub bucket_width_secs: f64,
    /// How many neighboring buckets a vote spills into, per side.
    pub spillover_radius: u32,
    /// Minimum correlation peak magnitude for a window to vote.
    /// `None` means `max(100, 5 x micro_window_secs)`.
    pub peak_threshold: Option<f64>,
    /// Multiplier on the vote-count stddev for the popularity cut.
    pub popularity_stddev_factor: f64,
    /// Sanity ceiling on the final estimate's magnitude, in seconds.
    /// Exceeding it signals a configuration or data error and aborts.
    pub max_plausible_offset_secs: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            macro_window_secs: 600.0,
            micro_window_secs: 10.0,
            micro_stride_secs: None,
            bucket_width_secs: 1.0,
            spillover_radius: 1,
            peak_threshold: None,
            popularity_stddev_factor: 1.0,
            max_plausible_offset_secs: 120.0,
        }
    }
}

impl EstimatorConfig {
    /// Effective micro stride: configured, or half the micro window.
    pub fn stride_secs(&self) -> f64 {
        self.micro_stride_secs
            .unwrap_or(self.micro_window_secs / 2.0)
    }

    /// Effective peak acceptance threshold.
    pub fn threshold(&self) -> f64 {
        self.peak_threshold
            .unwrap_or_else(|| (MACRO_TO_MICRO_RATIO * self.micro_window_secs).max(100.0))
    }

    /// Reject malformed configurations before computation starts.
    pub fn validate(&self) -> OffsetResult<()> {
        if self.micro_window_secs <= 0.0 {
            return Err(OffsetError::InvalidConfig(format!(
                "micro window must be positive, got {}s",
                self.micro_window_secs
            )));
        }
        if self.macro_window_secs < MACRO_WINDOW_FLOOR_SECS {
            return Err(OffsetError::InvalidConfig(format!(
                "macro window {}s is below the {}s floor",
                self.macro_window_secs, MACRO_WINDOW_FLOOR_SECS
            )));
        }
        if self.macro_window_secs < MACRO_TO_MICRO_RATIO * self.micro_window_secs {
            return Err(OffsetError::InvalidConfig(format!(
                "macro window {}s must be at least {}x the micro window ({}s)",
                self.macro_window_secs, MACRO_TO_MICRO_RATIO, self.micro_window_secs
            )));
        }
        if self.stride_secs() <= 0.0 {
            return Err(OffsetError::InvalidConfig(format!(
                "micro stride must be positive, got {}s",
                self.stride_secs()
            )));
        }
        if self.bucket_width_secs <= 0.0 {
            return Err(OffsetError::InvalidConfig(format!(
                "bucket width must be positive, got {}s",
                self.bucket_width_secs
            )));
        }
        if self.max_plausible_offset_secs <= 0.0 {
            return Err(OffsetError::InvalidConfig(format!(
                "offset ceiling must be positive, got {}s",
                self.max_plausible_offset_secs
            )));
        }
        Ok(())
    }
}
