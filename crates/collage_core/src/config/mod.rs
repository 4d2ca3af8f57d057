//! Configuration management.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only the changed section is modified)
//! - Defaults for missing fields on load
//!
//! # Example
//!
//! ```no_run
//! use collage_core::config::{ConfigManager, ConfigSection};
//! use collage_core::planner::PlannerConfig;
//!
//! let mut config = ConfigManager::new(".config/collage.toml");
//! config.load_or_create().unwrap();
//!
//! // Hand the planner its runtime config.
//! let planner_config = PlannerConfig::from(&config.settings().planner);
//!
//! // Persist a change to one section only.
//! config.settings_mut().planner.min_gap_secs = 300;
//! config.update_section(ConfigSection::Planner).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{ConfigSection, LoggingSettings, OffsetSettings, PlannerSettings, Settings};
