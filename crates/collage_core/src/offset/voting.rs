//! Bucket voting over candidate offsets.
//!
//! Each accepted micro window contributes one candidate offset. Candidates
//! are quantized into buckets of `bucket_width_secs` for voting and spill
//! into neighboring buckets so near-miss buckets reinforce each other.
//! The decision rule then looks for one clearly popular bucket cluster;
//! anything ambiguous is reported as indeterminate rather than guessed.

use std::collections::{HashMap, HashSet};

use super::types::{IndeterminateReason, OffsetEstimate, OffsetVerdict};

/// One accepted micro-window measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateVote {
    /// Candidate offset in seconds.
    pub offset_secs: f64,
    /// Correlation peak magnitude behind this candidate.
    pub peak: f64,
    /// Timestamp (seconds into the reference track) of the micro window.
    pub window_secs: f64,
}

/// Collects candidate votes into spillover buckets and decides.
pub struct BucketVoter {
    bucket_width_secs: f64,
    spillover_radius: i64,
    buckets: HashMap<i64, Vec<CandidateVote>>,
    total_votes: usize,
}

impl BucketVoter {
    /// Create a voter with the given quantization and spillover radius.
    pub fn new(bucket_width_secs: f64, spillover_radius: u32) -> Self {
        Self {
            bucket_width_secs,
            spillover_radius: spillover_radius as i64,
            buckets: HashMap::new(),
            total_votes: 0,
        }
    }

    /// Bucket key for an offset.
    fn key_for(&self, offset_secs: f64) -> i64 {
        (offset_secs / self.bucket_width_secs).round() as i64
    }

    /// Record a candidate in its home bucket and its spillover neighbors.
    pub fn record(&mut self, vote: CandidateVote) {
        let home = self.key_for(vote.offset_secs);
        for key in (home - self.spillover_radius)..=(home + self.spillover_radius) {
            self.buckets.entry(key).or_default().push(vote);
        }
        self.total_votes += 1;
    }

    /// Number of candidates recorded (spillover not double-counted).
    pub fn total_votes(&self) -> usize {
        self.total_votes
    }

    /// Apply the decision rule and produce a verdict.
    ///
    /// Popular buckets (count >= mean + `stddev_factor` x stddev over all
    /// multi-vote buckets) are grouped into clusters of buckets that share
    /// at least one originating window, so the spillover copies of one
    /// true peak reunite while distinct peaks stay apart. Two equally
    /// ranked clusters exactly one bucket apart are a vote split across a
    /// bucket edge and are averaged together; further apart they are an
    /// echo/alias ambiguity and no offset is returned.
    pub fn decide(&self, stddev_factor: f64) -> OffsetVerdict {
        if self.total_votes == 0 {
            return OffsetVerdict::Indeterminate(IndeterminateReason::NoAcceptedWindows);
        }

        // Buckets with repeat votes carry the signal; singletons are noise.
        let multi: Vec<(i64, usize)> = {
            let mut v: Vec<(i64, usize)> = self
                .buckets
                .iter()
                .filter(|(_, votes)| votes.len() > 1)
                .map(|(&key, votes)| (key, votes.len()))
                .collect();
            v.sort_unstable();
            v
        };
        if multi.len() < 2 {
            return OffsetVerdict::Indeterminate(IndeterminateReason::InsufficientAgreement);
        }

        let counts: Vec<f64> = multi.iter().map(|(_, count)| *count as f64).collect();
        let mean = counts.iter().sum::<f64>() / counts.len() as f64;
        let variance =
            counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
        let cut = mean + stddev_factor * variance.sqrt();

        let popular: Vec<(i64, usize)> = multi
            .iter()
            .copied()
            .filter(|(_, count)| *count as f64 >= cut)
            .collect();
        if popular.is_empty() {
            return OffsetVerdict::Indeterminate(IndeterminateReason::NoPopularBucket);
        }

        let clusters = self.cluster_by_shared_windows(&popular);

        // Rank clusters by their strongest bucket.
        let peak_count = |cluster: &Cluster| -> usize {
            cluster.members.iter().map(|(_, count)| *count).max().unwrap_or(0)
        };
        let mut ranked: Vec<&Cluster> = clusters.iter().collect();
        ranked.sort_by(|a, b| peak_count(b).cmp(&peak_count(a)));

        let mut winners: Vec<&Cluster> = vec![ranked[0]];
        if ranked.len() >= 2 && peak_count(ranked[0]) == peak_count(ranked[1]) {
            let distance = (ranked[0].peak_key(peak_count(ranked[0]))
                - ranked[1].peak_key(peak_count(ranked[1])))
            .abs();
            if distance > 1 {
                return OffsetVerdict::Indeterminate(IndeterminateReason::AmbiguousPeaks {
                    bucket_distance: distance,
                });
            }
            // Exactly one bucket apart: a vote split across a bucket edge,
            // not an echo. Average the two together.
            winners.push(ranked[1]);
        }

        // Union the winning votes, deduplicating spillover copies by their
        // originating window.
        let mut votes: Vec<CandidateVote> = Vec::new();
        for cluster in winners {
            for (key, _) in &cluster.members {
                for vote in &self.buckets[key] {
                    if !votes
                        .iter()
                        .any(|v| v.window_secs.to_bits() == vote.window_secs.to_bits())
                    {
                        votes.push(*vote);
                    }
                }
            }
        }

        let peak_weight: f64 = votes.iter().map(|v| v.peak).sum();
        let offset_secs = votes
            .iter()
            .map(|v| v.offset_secs * v.peak)
            .sum::<f64>()
            / peak_weight;

        OffsetVerdict::Estimate(OffsetEstimate {
            offset_secs,
            votes: votes.len(),
            peak_weight,
        })
    }

    /// Group popular buckets into clusters connected by shared windows.
    ///
    /// Components are contiguous in key space (a shared window implies
    /// keys within one spillover diameter), so one sorted sweep suffices.
    fn cluster_by_shared_windows(&self, popular: &[(i64, usize)]) -> Vec<Cluster> {
        let window_ids = |key: i64| -> HashSet<u64> {
            self.buckets[&key]
                .iter()
                .map(|v| v.window_secs.to_bits())
                .collect()
        };

        let mut clusters: Vec<Cluster> = Vec::new();
        for &(key, count) in popular {
            let ids = window_ids(key);
            match clusters.last_mut() {
                Some(cluster) if !cluster.window_ids.is_disjoint(&ids) => {
                    cluster.members.push((key, count));
                    cluster.window_ids.extend(ids);
                }
                _ => clusters.push(Cluster {
                    members: vec![(key, count)],
                    window_ids: ids,
                }),
            }
        }
        clusters
    }
}

/// A group of popular buckets fed by the same micro windows.
struct Cluster {
    /// `(bucket key, vote count)` members, ascending by key.
    members: Vec<(i64, usize)>,
    /// Originating windows across all members.
    window_ids: HashSet<u64>,
}

impl Cluster {
    /// Smallest key among the cluster's strongest buckets.
    fn peak_key(&self, peak_count: usize) -> i64 {
        self.members
            .iter()
            .filter(|(_, count)| *count == peak_count)
            .map(|(key, _)| *key)
            .min()
            .expect("non-empty cluster")
    }
}
