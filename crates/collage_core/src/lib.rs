//! Collage Core - composition planning for multi-source recordings
//!
//! This crate contains all planning logic with zero UI dependencies.
//! It can be used by a scheduler daemon or a CLI tool.
//!
//! The two subsystems are:
//!
//! - [`offset`]: estimates the true clock offset between two recordings
//!   using FFT cross-correlation over macro/micro analysis windows.
//! - [`planner`]: turns tagged per-source session intervals into an
//!   ordered, gap-free [`models::RenderPlan`], with tile layouts assigned
//!   by [`layout`].
//!
//! Both are pure, synchronous computations over in-memory data; all I/O
//! (media probing, encoding, scheduling) belongs to the caller.

pub mod config;
pub mod layout;
pub mod logging;
pub mod models;
pub mod offset;
pub mod planner;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
