//! Clock offset estimation between two recordings.
//!
//! Recordings' declared timestamps are not perfectly synchronized; this
//! module refines an approximate offset hint into a trusted estimate by
//! cross-correlating the two recordings' audio.
//!
//! # Architecture
//!
//! The estimator composes pure functions:
//!
//! 1. **Window placement** (`windows`): macro windows partition the
//!    analyzable overlap; micro windows slide through each macro window.
//! 2. **Correlation** (`correlation`): each micro window of the other
//!    track is matched against the macro window of the reference track
//!    with FFT cross-correlation.
//! 3. **Voting** (`voting`): accepted peaks vote in quantized offset
//!    buckets with neighbor spillover; the decision rule commits only
//!    when one bucket cluster clearly wins.
//!
//! # Usage
//!
//! ```ignore
//! use collage_core::offset::{estimate, AudioTrack, EstimatorConfig, OffsetVerdict};
//!
//! let config = EstimatorConfig::default();
//! match estimate(&reference, &other, approx_secs, &config)? {
//!     OffsetVerdict::Estimate(e) => apply_offset(e.offset_secs),
//!     OffsetVerdict::Indeterminate(reason) => fall_back(reason),
//! }
//! ```

mod config;
mod correlation;
pub mod voting;
mod windows;

pub mod types;

pub use config::{EstimatorConfig, MACRO_TO_MICRO_RATIO, MACRO_WINDOW_FLOOR_SECS};
pub use correlation::{MacroCorrelator, WindowMatch};
pub use types::{
    AudioTrack, IndeterminateReason, OffsetError, OffsetEstimate, OffsetResult, OffsetVerdict,
};
pub use windows::{macro_positions, micro_positions};

use voting::{BucketVoter, CandidateVote};

/// Estimate the clock offset of `other` relative to `reference`.
///
/// `approx_offset_secs` is the caller's hint (e.g., from declared file
/// timestamps): the number of seconds `other`'s clock is believed to lag
/// the reference clock. The returned estimate uses the same convention.
///
/// Pure function of its inputs; reads samples and nothing else. Returns
/// [`OffsetVerdict::Indeterminate`] when the correlation evidence is
/// ambiguous; callers must not treat that as an error, but retry with
/// different windows or fall back to the hint.
///
/// # Panics
///
/// Panics if a committed estimate exceeds the configured plausibility
/// ceiling; that signals corrupt input data or a misconfiguration, never
/// a normal failure.
pub fn estimate(
    reference: &AudioTrack,
    other: &AudioTrack,
    approx_offset_secs: f64,
    config: &EstimatorConfig,
) -> OffsetResult<OffsetVerdict> {
    config.validate()?;

    if reference.samples.is_empty() || other.samples.is_empty() {
        return Err(OffsetError::EmptyTrack);
    }
    if reference.sample_rate != other.sample_rate {
        return Err(OffsetError::SampleRateMismatch {
            reference: reference.sample_rate,
            other: other.sample_rate,
        });
    }

    let rate = reference.sample_rate as f64;
    let micro_secs = config.micro_window_secs;
    let micro_len = (micro_secs * rate).round() as usize;
    let threshold = config.threshold();

    // Portion of the reference timeline where both tracks have samples,
    // assuming the hint is roughly right.
    let analysis_start = (-approx_offset_secs).max(0.0);
    let analysis_end = reference
        .duration_secs()
        .min(other.duration_secs() - approx_offset_secs);
    let overlap_secs = analysis_end - analysis_start;

    let macro_starts = macro_positions(overlap_secs, config.macro_window_secs);
    if macro_starts.is_empty() {
        tracing::debug!(
            overlap_secs,
            macro_window_secs = config.macro_window_secs,
            "offset estimation: overlap below one macro window"
        );
        return Ok(OffsetVerdict::Indeterminate(
            IndeterminateReason::InsufficientOverlap,
        ));
    }

    let mut voter = BucketVoter::new(config.bucket_width_secs, config.spillover_radius);
    let mut windows_seen = 0usize;

    for rel_start in macro_starts {
        let macro_start = analysis_start + rel_start;
        let Some(macro_window) = reference.extract_window(macro_start, config.macro_window_secs)
        else {
            continue;
        };
        let correlator = MacroCorrelator::new(macro_window, micro_len);

        for micro_rel in micro_positions(
            config.macro_window_secs,
            micro_secs,
            config.stride_secs(),
        ) {
            let window_secs = macro_start + micro_rel;
            let Some(micro_window) =
                other.extract_window(window_secs + approx_offset_secs, micro_secs)
            else {
                continue;
            };
            windows_seen += 1;

            let found = correlator.best_match(micro_window);
            if found.peak < threshold {
                continue;
            }

            // The micro window was expected at `micro_rel` inside the macro
            // window; any displacement of the peak is hint error.
            let displacement = found.position as f64 / rate - micro_rel;
            voter.record(CandidateVote {
                offset_secs: approx_offset_secs - displacement,
                peak: found.peak,
                window_secs,
            });
        }
    }

    tracing::debug!(
        windows_seen,
        accepted = voter.total_votes(),
        "offset estimation: voting over correlation peaks"
    );

    let verdict = voter.decide(config.popularity_stddev_factor);
    if let OffsetVerdict::Estimate(estimate) = &verdict {
        assert!(
            estimate.offset_secs.abs() < config.max_plausible_offset_secs,
            "estimated offset {:.3}s exceeds plausibility ceiling {:.0}s; \
             input data or configuration is wrong",
            estimate.offset_secs,
            config.max_plausible_offset_secs
        );
        tracing::info!(
            offset_secs = estimate.offset_secs,
            votes = estimate.votes,
            "offset estimate committed"
        );
    }
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic white noise in [-2, 2] from a xorshift generator.
    fn noise(len: usize, mut seed: u64) -> Vec<f64> {
        (0..len)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                (seed as f64 / u64::MAX as f64 - 0.5) * 4.0
            })
            .collect()
    }

    /// Fast-running configuration for 50 Hz test signals.
    fn test_config() -> EstimatorConfig {
        EstimatorConfig {
            micro_stride_secs: Some(20.0),
            ..Default::default()
        }
    }

    /// Reference track plus a copy delayed by `delay_samples`.
    fn delayed_pair(total_samples: usize, delay_samples: usize) -> (AudioTrack, AudioTrack) {
        let rate = 50;
        let reference = noise(total_samples, 0x1234_5678);
        let mut delayed = noise(delay_samples, 0x9abc_def0);
        delayed.extend_from_slice(&reference[..total_samples - delay_samples]);
        (
            AudioTrack::new(reference, rate),
            AudioTrack::new(delayed, rate),
        )
    }

    #[test]
    fn recovers_known_offset_within_one_bucket() {
        // 620s of noise; copy delayed by 5.38s.
        let (reference, other) = delayed_pair(31_000, 269);

        let verdict = estimate(&reference, &other, 0.0, &test_config()).unwrap();
        let estimate = verdict.estimate().expect("clean signal should commit");

        assert!(
            (estimate.offset_secs - 5.37).abs() <= 1.0,
            "expected ~5.37s, got {:.3}s",
            estimate.offset_secs
        );
    }

    #[test]
    fn hint_is_refined_not_echoed() {
        let (reference, other) = delayed_pair(31_500, 269);

        // A hint that is off by a few seconds still converges on the truth.
        let verdict = estimate(&reference, &other, 9.0, &test_config()).unwrap();
        let estimate = verdict.estimate().expect("clean signal should commit");

        assert!(
            (estimate.offset_secs - 5.38).abs() <= 1.0,
            "expected ~5.38s, got {:.3}s",
            estimate.offset_secs
        );
    }

    #[test]
    fn short_overlap_is_indeterminate() {
        let rate = 50;
        let reference = AudioTrack::new(noise(10_000, 1), rate); // 200s
        let other = AudioTrack::new(noise(10_000, 2), rate);

        let verdict = estimate(&reference, &other, 0.0, &test_config()).unwrap();
        assert_eq!(
            verdict,
            OffsetVerdict::Indeterminate(IndeterminateReason::InsufficientOverlap)
        );
    }

    #[test]
    fn unrelated_noise_does_not_commit() {
        let rate = 50;
        let reference = AudioTrack::new(noise(31_000, 1), rate);
        let other = AudioTrack::new(noise(31_000, 2), rate);

        let verdict = estimate(&reference, &other, 0.0, &test_config()).unwrap();
        assert!(verdict.estimate().is_none(), "got {verdict:?}");
    }

    #[test]
    fn rejects_sample_rate_mismatch() {
        let reference = AudioTrack::new(noise(31_000, 1), 50);
        let other = AudioTrack::new(noise(31_000, 2), 48);

        assert!(matches!(
            estimate(&reference, &other, 0.0, &test_config()),
            Err(OffsetError::SampleRateMismatch { .. })
        ));
    }

    #[test]
    fn rejects_empty_track() {
        let reference = AudioTrack::new(vec![], 50);
        let other = AudioTrack::new(noise(100, 2), 50);

        assert!(matches!(
            estimate(&reference, &other, 0.0, &test_config()),
            Err(OffsetError::EmptyTrack)
        ));
    }

    #[test]
    fn rejects_invalid_config_before_computation() {
        let reference = AudioTrack::new(noise(100, 1), 50);
        let other = AudioTrack::new(noise(100, 2), 50);
        let config = EstimatorConfig {
            macro_window_secs: 60.0,
            ..Default::default()
        };

        assert!(matches!(
            estimate(&reference, &other, 0.0, &config),
            Err(OffsetError::InvalidConfig(_))
        ));
    }

    #[test]
    #[should_panic(expected = "plausibility ceiling")]
    fn implausible_estimate_aborts() {
        let (reference, other) = delayed_pair(31_000, 269);
        let config = EstimatorConfig {
            // Ceiling below the true 5.38s offset.
            max_plausible_offset_secs: 3.0,
            ..test_config()
        };
        let _ = estimate(&reference, &other, 0.0, &config);
    }
}
