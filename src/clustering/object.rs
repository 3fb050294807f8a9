// src/clustering/object.rs

use serde::{Deserialize, Serialize};

use crate::types::Point2D;

/// A record participating in one clustering run. Implementations supply the
/// distance model; all mutable per-run algorithm state (core distance,
/// reachability, density, outlier factor) is owned by the detector.
pub trait ClusterPoint {
    /// Stable position of the record in the original input list. Unique per
    /// run, used as the output identity and as the universal tie-break key.
    fn index(&self) -> usize;

    /// False if the source record lacks the attribute this distance space
    /// clusters on (no timestamp, no coordinates).
    fn has_metadata(&self) -> bool;

    /// Distance to another record. Only defined when both operands carry
    /// metadata; the detector never calls it otherwise.
    fn distance_to(&self, other: &Self) -> f64;
}

/// A record clustered on its timestamp (1-D distance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalPoint {
    pub index: usize,
    pub timestamp: Option<i64>,
}

impl TemporalPoint {
    pub fn new(index: usize, timestamp: Option<i64>) -> Self {
        Self { index, timestamp }
    }
}

impl ClusterPoint for TemporalPoint {
    fn index(&self) -> usize {
        self.index
    }

    fn has_metadata(&self) -> bool {
        self.timestamp.is_some()
    }

    fn distance_to(&self, other: &Self) -> f64 {
        // computed in f64 so extreme timestamp pairs cannot overflow
        match (self.timestamp, other.timestamp) {
            (Some(a), Some(b)) => (a as f64 - b as f64).abs(),
            _ => f64::INFINITY,
        }
    }
}

/// A record clustered on its geographic coordinate (2-D Euclidean distance
/// on longitude/latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArealPoint {
    pub index: usize,
    pub coordinate: Option<Point2D>,
}

impl ArealPoint {
    pub fn new(index: usize, coordinate: Option<Point2D>) -> Self {
        Self { index, coordinate }
    }

    /// Distance of the coordinate from the origin; records without a
    /// coordinate sort as distance zero.
    pub fn origin_distance(&self) -> f64 {
        self.coordinate.map(|c| c.origin_distance()).unwrap_or(0.0)
    }
}

impl ClusterPoint for ArealPoint {
    fn index(&self) -> usize {
        self.index
    }

    fn has_metadata(&self) -> bool {
        self.coordinate.is_some()
    }

    fn distance_to(&self, other: &Self) -> f64 {
        match (self.coordinate, other.coordinate) {
            (Some(a), Some(b)) => a.distance_to(b),
            _ => f64::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_temporal_distance_is_symmetric() {
        let a = TemporalPoint::new(0, Some(100));
        let b = TemporalPoint::new(1, Some(250));

        assert_relative_eq!(a.distance_to(&b), 150.0);
        assert_relative_eq!(a.distance_to(&b), b.distance_to(&a));
    }

    #[test]
    fn test_temporal_distance_does_not_overflow() {
        let a = TemporalPoint::new(0, Some(i64::MAX));
        let b = TemporalPoint::new(1, Some(i64::MIN));

        assert!(a.distance_to(&b).is_finite());
        assert!(a.distance_to(&b) > 0.0);
    }

    #[test]
    fn test_areal_distance_is_symmetric() {
        let a = ArealPoint::new(0, Some(Point2D::new(0.0, 0.0)));
        let b = ArealPoint::new(1, Some(Point2D::new(3.0, 4.0)));

        assert_relative_eq!(a.distance_to(&b), 5.0);
        assert_relative_eq!(a.distance_to(&b), b.distance_to(&a));
    }

    #[test]
    fn test_missing_metadata() {
        let missing = TemporalPoint::new(3, None);
        assert!(!missing.has_metadata());

        let missing = ArealPoint::new(4, None);
        assert!(!missing.has_metadata());
        assert_relative_eq!(missing.origin_distance(), 0.0);
    }
}
