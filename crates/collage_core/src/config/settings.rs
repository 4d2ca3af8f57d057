//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level
//! updates. Conversions at the bottom turn the serialized shapes into
//! the validated runtime configs the subsystems take.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::{BoundaryMode, Category};
use crate::offset::EstimatorConfig;
use crate::planner::PlannerConfig;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Composition planner settings.
    #[serde(default)]
    pub planner: PlannerSettings,

    /// Offset estimator tuning.
    #[serde(default)]
    pub offset: OffsetSettings,
}

/// Identifies one settings section for section-level updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Logging,
    Planner,
    Offset,
}

impl ConfigSection {
    /// TOML table name of the section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Logging => "logging",
            ConfigSection::Planner => "planner",
            ConfigSection::Offset => "offset",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default log level when RUST_LOG is unset.
    #[serde(default)]
    pub level: LogLevel,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
        }
    }
}

/// Composition planner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// How the plan start boundary is derived.
    #[serde(default)]
    pub start_mode: BoundaryMode,

    /// How the plan end boundary is derived.
    #[serde(default)]
    pub end_mode: BoundaryMode,

    /// Whether the category trim pass runs at all.
    #[serde(default = "default_true")]
    pub trim_enabled: bool,

    /// Trim-pass lookback window, in rows.
    #[serde(default = "default_trim_rows")]
    pub trim_lookback: u32,

    /// Trim-pass lookahead window, in rows.
    #[serde(default = "default_trim_rows")]
    pub trim_lookahead: u32,

    /// Category tags that never contribute to the trim-accepted set.
    #[serde(default)]
    pub non_grouping_categories: Vec<String>,

    /// Absent runs shorter than this many seconds are gap-filled.
    #[serde(default)]
    pub min_gap_secs: u64,

    /// Secondary sources with less total presence than this many seconds
    /// are dropped from the plan.
    #[serde(default)]
    pub minimum_time_in_video_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_trim_rows() -> u32 {
    1
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            start_mode: BoundaryMode::default(),
            end_mode: BoundaryMode::default(),
            trim_enabled: true,
            trim_lookback: default_trim_rows(),
            trim_lookahead: default_trim_rows(),
            non_grouping_categories: Vec::new(),
            min_gap_secs: 0,
            minimum_time_in_video_secs: 0,
        }
    }
}

impl From<&PlannerSettings> for PlannerConfig {
    fn from(settings: &PlannerSettings) -> Self {
        let (trim_lookback, trim_lookahead) = if settings.trim_enabled {
            (Some(settings.trim_lookback), Some(settings.trim_lookahead))
        } else {
            (None, None)
        };
        Self {
            start_mode: settings.start_mode,
            end_mode: settings.end_mode,
            trim_lookback,
            trim_lookahead,
            non_grouping_categories: settings
                .non_grouping_categories
                .iter()
                .map(Category::new)
                .collect(),
            min_gap: Duration::seconds(settings.min_gap_secs as i64),
            minimum_time_in_video: Duration::seconds(settings.minimum_time_in_video_secs as i64),
        }
    }
}

/// Offset estimator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetSettings {
    /// Macro analysis window length in seconds.
    #[serde(default = "default_macro_window")]
    pub macro_window_secs: f64,

    /// Micro (sliding) window length in seconds.
    #[serde(default = "default_micro_window")]
    pub micro_window_secs: f64,

    /// Micro window stride in seconds; omit for half the micro window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_stride_secs: Option<f64>,

    /// Vote bucket width in seconds.
    #[serde(default = "default_bucket_width")]
    pub bucket_width_secs: f64,

    /// Neighboring buckets a vote spills into, per side.
    #[serde(default = "default_spillover")]
    pub spillover_radius: u32,

    /// Minimum correlation peak magnitude; omit for the built-in default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_threshold: Option<f64>,

    /// Multiplier on the vote-count stddev for the popularity cut.
    #[serde(default = "default_stddev_factor")]
    pub popularity_stddev_factor: f64,

    /// Sanity ceiling on the estimate's magnitude, in seconds.
    #[serde(default = "default_offset_ceiling")]
    pub max_plausible_offset_secs: f64,
}

fn default_macro_window() -> f64 {
    600.0
}

fn default_micro_window() -> f64 {
    10.0
}

fn default_bucket_width() -> f64 {
    1.0
}

fn default_spillover() -> u32 {
    1
}

fn default_stddev_factor() -> f64 {
    1.0
}

fn default_offset_ceiling() -> f64 {
    120.0
}

impl Default for OffsetSettings {
    fn default() -> Self {
        Self {
            macro_window_secs: default_macro_window(),
            micro_window_secs: default_micro_window(),
            micro_stride_secs: None,
            bucket_width_secs: default_bucket_width(),
            spillover_radius: default_spillover(),
            peak_threshold: None,
            popularity_stddev_factor: default_stddev_factor(),
            max_plausible_offset_secs: default_offset_ceiling(),
        }
    }
}

impl From<&OffsetSettings> for EstimatorConfig {
    fn from(settings: &OffsetSettings) -> Self {
        Self {
            macro_window_secs: settings.macro_window_secs,
            micro_window_secs: settings.micro_window_secs,
            micro_stride_secs: settings.micro_stride_secs,
            bucket_width_secs: settings.bucket_width_secs,
            spillover_radius: settings.spillover_radius,
            peak_threshold: settings.peak_threshold,
            popularity_stddev_factor: settings.popularity_stddev_factor,
            max_plausible_offset_secs: settings.max_plausible_offset_secs,
        }
    }
}
