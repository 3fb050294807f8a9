// src/fusion/areal.rs

//! # Areal Fusion Module
//!
//! Fuses the geographic metadata of a record collection. Coordinate-bearing
//! records go through the OPTICS-OF detector; detected clusters are turned
//! into convex polygons and merged with any externally geocoded polygons
//! into a list of disjoint regions. Outliers that are geographically covered
//! by a merged region are reclassified, since the region already describes
//! them even though they are density anomalies.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::clustering::{ArealPoint, ClusterDetector};
use crate::error::{FusionError, FusionResult};
use crate::fusion::{min_neighbors_for, MAX_OUTLIER_FACTOR};
use crate::geometry::{merge_region, ConvexHull, GeoArea};
use crate::types::Point2D;

/// Outcome of one areal fusion run.
#[derive(Debug, Clone, PartialEq)]
pub struct ArealFusionResult {
    /// Disjoint merged regions: geocoded polygons and cluster hulls.
    pub polygons: Vec<GeoArea>,
    /// Convex hull of each detected cluster, in cluster order, before
    /// region merging.
    pub cluster_areas: Vec<GeoArea>,
    /// Outlier record indices that no merged region covers.
    pub outliers: Vec<usize>,
    /// Record indices without geographic coordinates.
    pub no_metadata: Vec<usize>,
    /// Cluster membership as record indices, in detection order.
    pub clusters: Vec<Vec<usize>>,
}

/// Collects per-record coordinates and geocoded polygons and consolidates
/// them into merged geographic regions.
#[derive(Debug, Default)]
pub struct ArealFusion {
    records: Vec<ArealPoint>,
    polygons: Vec<GeoArea>,
}

impl ArealFusion {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            polygons: Vec::new(),
        }
    }

    /// Adds one record by coordinate. A record without coordinates still
    /// participates in the run and is reported in `no_metadata`.
    ///
    /// # Errors
    /// A non-finite coordinate is rejected: the neighbor and seed orderings
    /// of the detector require totally ordered distances.
    pub fn add(&mut self, index: usize, coordinate: Option<Point2D>) -> FusionResult<()> {
        if let Some(c) = coordinate {
            if !c.is_finite() {
                return Err(FusionError::NonFiniteCoordinate { index });
            }
        }
        self.records.push(ArealPoint::new(index, coordinate));
        Ok(())
    }

    /// Merges an externally geocoded polygon (e.g. the area of a named
    /// location) into the running region list.
    pub fn add_polygon(&mut self, polygon: GeoArea) {
        merge_region(&mut self.polygons, polygon);
    }

    /// Runs the clustering over all added records and consolidates the
    /// spatial evidence. Consumes the fusion; a new run requires a freshly
    /// built one.
    pub fn fuse(mut self) -> ArealFusionResult {
        if self.records.is_empty() {
            return ArealFusionResult {
                polygons: self.polygons,
                cluster_areas: Vec::new(),
                outliers: Vec::new(),
                no_metadata: Vec::new(),
                clusters: Vec::new(),
            };
        }

        self.records.sort_by(|a, b| {
            a.origin_distance()
                .partial_cmp(&b.origin_distance())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.index.cmp(&b.index))
        });

        let coordinates: Vec<Point2D> =
            self.records.iter().filter_map(|r| r.coordinate).collect();
        let element_count = coordinates.len();
        let neighborhood_radius = self.neighborhood_radius(&coordinates);
        let min_neighbors = min_neighbors_for(element_count);

        debug!(
            neighborhood_radius,
            min_neighbors,
            max_outlier_factor = MAX_OUTLIER_FACTOR,
            "starting areal clustering"
        );
        let clustering = ClusterDetector::new(neighborhood_radius, min_neighbors)
            .with_max_outlier_factor(MAX_OUTLIER_FACTOR)
            .detect_clusters(&self.records);

        let coordinate_of: HashMap<usize, Point2D> = self
            .records
            .iter()
            .filter_map(|r| r.coordinate.map(|c| (r.index, c)))
            .collect();

        // cluster hulls join the region list
        let mut cluster_areas = Vec::with_capacity(clustering.clusters().len());
        for cluster in clustering.clusters() {
            let members: Vec<Point2D> = cluster
                .iter()
                .filter_map(|index| coordinate_of.get(index).copied())
                .collect();
            let mut hull = ConvexHull::new(&members).into_polygon();
            if let Some(first) = hull.boundary_points().first() {
                hull.set_name(format!("Cluster_{}_{}", first.x, first.y));
            }
            cluster_areas.push(hull.clone());
            merge_region(&mut self.polygons, hull);
        }

        // an outlier covered by any merged region is no outlier in the output
        let outliers: Vec<usize> = clustering
            .outliers()
            .iter()
            .copied()
            .filter(|index| match coordinate_of.get(index) {
                Some(c) => !self.polygons.iter().any(|polygon| polygon.contains(c.x, c.y)),
                None => true,
            })
            .collect();

        info!(
            polygons = self.polygons.len(),
            clusters = clustering.clusters().len(),
            outliers = outliers.len(),
            no_metadata = clustering.no_metadata().len(),
            "areal fusion complete"
        );

        ArealFusionResult {
            polygons: self.polygons,
            cluster_areas,
            outliers,
            no_metadata: clustering.no_metadata().to_vec(),
            clusters: clustering.clusters().to_vec(),
        }
    }

    /// The radius in which the detector searches for neighbors: the diagonal
    /// of the bounding box of the convex hull over all coordinates, divided
    /// by the number of coordinate-bearing records.
    fn neighborhood_radius(&self, coordinates: &[Point2D]) -> f64 {
        if coordinates.is_empty() {
            return 0.0;
        }

        let hull = ConvexHull::new(coordinates);
        let reference_distance = hull
            .polygon()
            .bounds()
            .map(|(min, max)| min.distance_to(max))
            .unwrap_or(0.0);

        reference_distance / coordinates.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    /// Two tight 4-point squares far apart, one lone point between them,
    /// one record without coordinates.
    fn two_groups_fusion() -> ArealFusion {
        let mut fusion = ArealFusion::new();
        let coordinates = [
            p(0.0, 0.0),
            p(0.0, 1.0),
            p(1.0, 0.0),
            p(1.0, 1.0),
            p(10.0, 10.0),
            p(10.0, 11.0),
            p(11.0, 10.0),
            p(11.0, 11.0),
        ];
        for (index, c) in coordinates.into_iter().enumerate() {
            fusion.add(index, Some(c)).unwrap();
        }
        fusion.add(8, Some(p(5.0, 5.0))).unwrap();
        fusion.add(9, None).unwrap();
        fusion
    }

    #[test]
    fn test_add_rejects_non_finite_coordinates() {
        let mut fusion = ArealFusion::new();
        let result = fusion.add(0, Some(p(f64::NAN, 1.0)));
        assert!(matches!(
            result,
            Err(FusionError::NonFiniteCoordinate { index: 0 })
        ));
        assert!(fusion.add(1, Some(p(1.0, 2.0))).is_ok());
        assert!(fusion.add(2, None).is_ok());
    }

    #[test]
    fn test_two_groups_become_two_polygons() {
        let result = two_groups_fusion().fuse();

        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.polygons.len(), 2);
        assert_eq!(result.cluster_areas.len(), 2);
        assert_eq!(result.no_metadata, vec![9]);
        // the lone point is density-anomalous and covered by no region
        assert_eq!(result.outliers, vec![8]);

        let first = result
            .polygons
            .iter()
            .find(|polygon| polygon.contains(0.5, 0.5))
            .expect("a region covering the first group");
        assert!(first.name().starts_with("Cluster_"));
        assert!(!first.contains(10.5, 10.5));

        let second = result
            .polygons
            .iter()
            .find(|polygon| polygon.contains(10.5, 10.5))
            .expect("a region covering the second group");
        assert!(second.contains(10.0, 11.0));
    }

    #[test]
    fn test_covered_outlier_is_reclassified() {
        let mut fusion = two_groups_fusion();
        // geocoded region around the lone point at (5, 5)
        let mut region = GeoArea::from_boundary(vec![
            p(4.0, 4.0),
            p(4.0, 6.0),
            p(6.0, 6.0),
            p(6.0, 4.0),
        ])
        .unwrap();
        region.set_name("Midtown");
        fusion.add_polygon(region);

        let result = fusion.fuse();

        assert_eq!(result.outliers, &[] as &[usize]);
        assert_eq!(result.polygons.len(), 3);
        assert!(result
            .polygons
            .iter()
            .any(|polygon| polygon.name() == "Midtown"));
    }

    #[test]
    fn test_overlapping_cluster_hull_merges_with_geocoded_polygon() {
        let mut fusion = two_groups_fusion();
        // geocoded region overlapping the first group's hull
        let mut region = GeoArea::from_boundary(vec![
            p(0.5, 0.5),
            p(0.5, 3.0),
            p(3.0, 3.0),
            p(3.0, 0.5),
        ])
        .unwrap();
        region.set_name("Oldtown");
        fusion.add_polygon(region);

        let result = fusion.fuse();

        assert_eq!(result.polygons.len(), 2);
        let merged = result
            .polygons
            .iter()
            .find(|polygon| polygon.contains(2.0, 2.0))
            .expect("merged region covering the geocoded polygon");
        // generated cluster labels never extend the geocoded name
        assert_eq!(merged.name(), "Oldtown");
        assert!(merged.contains(0.0, 0.0));
    }

    #[test]
    fn test_fusion_without_records_passes_polygons_through() {
        let mut fusion = ArealFusion::new();
        let region = GeoArea::from_boundary(vec![
            p(0.0, 0.0),
            p(0.0, 2.0),
            p(2.0, 2.0),
            p(2.0, 0.0),
        ])
        .unwrap();
        fusion.add_polygon(region.clone());

        let result = fusion.fuse();

        assert_eq!(result.polygons, vec![region]);
        assert!(result.clusters.is_empty());
        assert!(result.outliers.is_empty());
        assert!(result.no_metadata.is_empty());
    }

    #[test]
    fn test_partition_is_complete() {
        let result = two_groups_fusion().fuse();
        let partitioned = result.no_metadata.len()
            + result.outliers.len()
            + result.clusters.iter().map(Vec::len).sum::<usize>();
        assert_eq!(partitioned, 10);
    }
}
