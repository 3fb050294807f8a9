// src/fusion/temporal.rs

//! # Temporal Fusion Module
//!
//! Fuses the temporal metadata of a record collection. Records are added one
//! by one with their timestamp (or none), then [`TemporalFusion::fuse`]
//! derives the clustering parameters from the collected distribution, runs
//! the OPTICS-OF detector and reports the detected clusters together with
//! their timestamp boundary ranges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clustering::{ClusterDetector, ClusteringResult, TemporalPoint};
use crate::fusion::{min_neighbors_for, MAX_OUTLIER_FACTOR};

/// The minimum and maximum timestamp of one detected cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

/// Outcome of one temporal fusion run: the index partition plus one
/// boundary range per cluster, in cluster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFusionResult {
    pub clustering: ClusteringResult,
    pub boundaries: Vec<TimeRange>,
}

/// Collects per-record timestamps and consolidates them into clusters of
/// temporally close records.
#[derive(Debug)]
pub struct TemporalFusion {
    records: Vec<TemporalPoint>,
    no_timestamp_count: usize,
    min_timestamp: i64,
    max_timestamp: i64,
}

impl TemporalFusion {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            no_timestamp_count: 0,
            min_timestamp: i64::MAX,
            max_timestamp: i64::MIN,
        }
    }

    /// Adds one record. A record without a timestamp still participates in
    /// the run and is reported in the `no_metadata` bucket.
    pub fn add(&mut self, index: usize, timestamp: Option<i64>) {
        match timestamp {
            Some(ts) => {
                if ts < self.min_timestamp {
                    self.min_timestamp = ts;
                }
                if ts > self.max_timestamp {
                    self.max_timestamp = ts;
                }
            }
            None => self.no_timestamp_count += 1,
        }
        self.records.push(TemporalPoint::new(index, timestamp));
    }

    /// Runs the clustering over all added records. Consumes the fusion;
    /// a new run requires a freshly built one.
    pub fn fuse(mut self) -> TemporalFusionResult {
        self.records
            .sort_by_key(|p| (p.timestamp.unwrap_or(i64::MIN), p.index));

        let element_count = self.records.len() - self.no_timestamp_count;
        let neighborhood_radius = self.neighborhood_radius(element_count);
        let min_neighbors = min_neighbors_for(element_count);

        debug!(
            neighborhood_radius,
            min_neighbors,
            max_outlier_factor = MAX_OUTLIER_FACTOR,
            "starting temporal clustering"
        );
        let clustering = ClusterDetector::new(neighborhood_radius, min_neighbors)
            .with_max_outlier_factor(MAX_OUTLIER_FACTOR)
            .detect_clusters(&self.records);

        let boundaries = self.cluster_boundaries(&clustering);
        info!(
            clusters = clustering.clusters().len(),
            outliers = clustering.outliers().len(),
            no_metadata = clustering.no_metadata().len(),
            "temporal fusion complete"
        );

        TemporalFusionResult {
            clustering,
            boundaries,
        }
    }

    /// The radius in which the detector searches for neighbors: the covered
    /// timestamp span divided by the number of timestamped records.
    fn neighborhood_radius(&self, element_count: usize) -> f64 {
        if element_count == 0 {
            return 0.0;
        }
        (self.max_timestamp - self.min_timestamp) as f64 / element_count as f64
    }

    /// Minimum and maximum timestamp per detected cluster.
    fn cluster_boundaries(&self, clustering: &ClusteringResult) -> Vec<TimeRange> {
        let timestamp_of: HashMap<usize, i64> = self
            .records
            .iter()
            .filter_map(|p| p.timestamp.map(|ts| (p.index, ts)))
            .collect();

        clustering
            .clusters()
            .iter()
            .map(|cluster| {
                let mut start = i64::MAX;
                let mut end = i64::MIN;
                for index in cluster {
                    if let Some(&ts) = timestamp_of.get(index) {
                        start = start.min(ts);
                        end = end.max(ts);
                    }
                }
                TimeRange { start, end }
            })
            .collect()
    }
}

impl Default for TemporalFusion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_separated_groups_form_two_clusters() {
        let mut fusion = TemporalFusion::new();
        for (index, ts) in [0, 1, 2, 1_000_000, 1_000_001, 1_000_002]
            .into_iter()
            .enumerate()
        {
            fusion.add(index, Some(ts));
        }

        let result = fusion.fuse();

        assert_eq!(result.clustering.outliers(), &[] as &[usize]);
        assert_eq!(
            result.clustering.clusters(),
            &[vec![0, 1, 2], vec![3, 4, 5]]
        );
        assert_eq!(
            result.boundaries,
            vec![
                TimeRange { start: 0, end: 2 },
                TimeRange {
                    start: 1_000_000,
                    end: 1_000_002
                }
            ]
        );
    }

    #[test]
    fn test_records_without_timestamp_are_reported() {
        let mut fusion = TemporalFusion::new();
        fusion.add(0, Some(10));
        fusion.add(1, None);
        fusion.add(2, Some(12));
        fusion.add(3, Some(11));
        fusion.add(4, None);

        let result = fusion.fuse();

        assert_eq!(result.clustering.no_metadata(), &[1, 4]);
        assert_eq!(result.clustering.len(), 5);
    }

    #[test]
    fn test_boundaries_cover_cluster_member_timestamps() {
        let mut fusion = TemporalFusion::new();
        let timestamps = [100, 105, 110, 5_000, 5_002, 5_004, 9_000_000];
        for (index, ts) in timestamps.into_iter().enumerate() {
            fusion.add(index, Some(ts));
        }

        let result = fusion.fuse();

        assert_eq!(result.boundaries.len(), result.clustering.clusters().len());
        for (cluster, range) in result.clustering.clusters().iter().zip(&result.boundaries) {
            assert!(range.start <= range.end);
            for &index in cluster {
                let ts = timestamps[index];
                assert!(range.start <= ts && ts <= range.end);
            }
        }
    }

    #[test]
    fn test_empty_fusion() {
        let result = TemporalFusion::new().fuse();
        assert!(result.clustering.is_empty());
        assert!(result.boundaries.is_empty());
    }

    #[test]
    fn test_unordered_input_is_sorted_before_clustering() {
        let mut fusion = TemporalFusion::new();
        // same two groups, interleaved insertion order
        fusion.add(0, Some(1_000_000));
        fusion.add(1, Some(1));
        fusion.add(2, Some(1_000_002));
        fusion.add(3, Some(0));
        fusion.add(4, Some(1_000_001));
        fusion.add(5, Some(2));

        let result = fusion.fuse();

        // within the second cluster, equal reachabilities resolve by index
        assert_eq!(
            result.clustering.clusters(),
            &[vec![3, 1, 5], vec![0, 2, 4]]
        );
    }
}
