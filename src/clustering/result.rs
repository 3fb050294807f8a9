// src/clustering/result.rs

use serde::{Deserialize, Serialize};

/// The partition produced by one clustering run: record indices without the
/// clustered attribute, density outliers, and the detected clusters. The
/// cluster list is append-only; the "current" cluster is always the last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringResult {
    no_metadata: Vec<usize>,
    outliers: Vec<usize>,
    clusters: Vec<Vec<usize>>,
}

impl ClusteringResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_no_metadata(&mut self, index: usize) {
        self.no_metadata.push(index);
    }

    pub(crate) fn add_outlier(&mut self, index: usize) {
        self.outliers.push(index);
    }

    pub(crate) fn add_to_new_cluster(&mut self, index: usize) {
        self.clusters.push(vec![index]);
    }

    pub(crate) fn add_to_existing_cluster(&mut self, index: usize) {
        match self.clusters.last_mut() {
            Some(cluster) => cluster.push(index),
            None => self.clusters.push(vec![index]),
        }
    }

    pub fn no_metadata(&self) -> &[usize] {
        &self.no_metadata
    }

    pub fn outliers(&self) -> &[usize] {
        &self.outliers
    }

    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    /// Total number of partitioned records across all three buckets.
    pub fn len(&self) -> usize {
        self.no_metadata.len()
            + self.outliers.len()
            + self.clusters.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
