// src/geometry/geo_area.rs

//! # Geographic Area Module
//!
//! `GeoArea` is the polygon abstraction used to consolidate spatial evidence.
//! It pairs an explicit boundary point list with a derived area representation
//! (`geo::MultiPolygon`) and supports inclusive point containment, overlap
//! detection, set union and subtraction. Merged areas aggregate the display
//! names of their pieces.

use geo::{BooleanOps, Coord, Intersects, LineString, MultiPolygon, Point, Polygon};
use tracing::debug;

use crate::error::{FusionError, FusionResult};
use crate::types::Point2D;

/// A polygon area with inclusive boundary semantics: every listed boundary
/// point counts as contained, in addition to the interior of the area.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoArea {
    name: String,
    boundary_points: Vec<Point2D>,
    area: MultiPolygon<f64>,
}

impl GeoArea {
    /// Creates an empty area with no boundary points.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            boundary_points: Vec::new(),
            area: MultiPolygon::new(Vec::new()),
        }
    }

    /// Creates an area from an externally supplied polygon boundary.
    ///
    /// # Arguments
    /// * `boundary` - the ordered boundary points of the polygon.
    ///
    /// # Returns
    /// A `FusionResult<GeoArea>`; an error if fewer than 3 points are given,
    /// since an external boundary that short cannot describe an area.
    pub fn from_boundary(boundary: Vec<Point2D>) -> FusionResult<Self> {
        if boundary.len() < 3 {
            return Err(FusionError::InsufficientPoints {
                expected: 3,
                actual: boundary.len(),
            });
        }
        Ok(Self::from_points(boundary))
    }

    /// Creates an area from an ordered point list, tolerating degenerate
    /// input. Fewer than 3 points yield an empty area whose membership is
    /// exactly the listed points (the shape convex-hull construction needs
    /// for 1- and 2-point inputs).
    pub fn from_points(points: Vec<Point2D>) -> Self {
        let area = if points.len() >= 3 {
            let ring: LineString<f64> = points.iter().map(|p| Coord::from(*p)).collect();
            MultiPolygon::new(vec![Polygon::new(ring, Vec::new())])
        } else {
            MultiPolygon::new(Vec::new())
        };

        Self {
            name: String::new(),
            boundary_points: points,
            area,
        }
    }

    /// Inclusive containment test: true if `(x, y)` is a listed boundary
    /// point or lies in the area (boundary included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let is_boundary_point = self
            .boundary_points
            .iter()
            .any(|p| p.x == x && p.y == y);

        is_boundary_point || self.area.intersects(&Point::new(x, y))
    }

    /// True if any boundary point of `other` is contained in this area.
    /// The test is asymmetric; overlap detection checks both directions.
    pub fn contains_part_of(&self, other: &GeoArea) -> bool {
        other
            .boundary_points
            .iter()
            .any(|p| self.contains(p.x, p.y))
    }

    /// Unions `other` into this area. Boundary points of `other` that are
    /// already contained are skipped; display names are merged.
    pub fn add(&mut self, other: &GeoArea) {
        if other.boundary_points.is_empty() {
            return;
        }

        for point in &other.boundary_points {
            if !self.contains(point.x, point.y) {
                self.boundary_points.push(*point);
            }
        }

        if self.area.0.is_empty() {
            self.area = other.area.clone();
        } else if !other.area.0.is_empty() {
            self.area = self.area.union(&other.area);
        }

        self.merge_name(&other.name);
    }

    /// Subtracts `other` from this area. The subtracted boundary points are
    /// kept in the boundary list, so they remain "contained" under the
    /// inclusive membership rule.
    pub fn subtract(&mut self, other: &GeoArea) {
        if other.boundary_points.is_empty() {
            return;
        }

        self.boundary_points.extend_from_slice(&other.boundary_points);
        if !self.area.0.is_empty() && !other.area.0.is_empty() {
            self.area = self.area.difference(&other.area);
        }
    }

    /// Aggregates another piece's name into this area's name. Names already
    /// contained (case-insensitively) are not repeated, and generated
    /// cluster labels never extend a real place name.
    fn merge_name(&mut self, other_name: &str) {
        if other_name.is_empty() {
            return;
        }
        if self.name.is_empty() {
            self.name = other_name.to_string();
            return;
        }

        let own_lower = self.name.to_lowercase();
        let other_lower = other_name.to_lowercase();
        if !own_lower.contains(&other_lower) && !other_lower.starts_with("cluster_") {
            if !self.name.ends_with('_') {
                self.name.push('_');
            }
            self.name.push_str(other_name);
        }
    }

    /// Bounding box of the boundary points.
    pub fn bounds(&self) -> Option<(Point2D, Point2D)> {
        if self.boundary_points.is_empty() {
            return None;
        }

        let mut min = self.boundary_points[0];
        let mut max = self.boundary_points[0];

        for point in &self.boundary_points[1..] {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        Some((min, max))
    }

    pub fn boundary_points(&self) -> &[Point2D] {
        &self.boundary_points
    }

    pub fn is_empty(&self) -> bool {
        self.boundary_points.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The derived area representation.
    pub fn multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.area
    }
}

impl Default for GeoArea {
    fn default() -> Self {
        Self::new()
    }
}

/// Merges a newly produced region into a working list of disjoint regions.
///
/// Every stored region that shares a boundary point with the incoming one
/// (in either direction) is absorbed into a single unioned region, which
/// replaces all matched regions; otherwise the incoming region is appended
/// as-is.
pub fn merge_region(regions: &mut Vec<GeoArea>, current: GeoArea) {
    let mut merged = GeoArea::new();
    let mut is_merged = false;
    let mut kept = Vec::with_capacity(regions.len());

    for stored in regions.drain(..) {
        let overlaps =
            stored.contains_part_of(&current) || current.contains_part_of(&stored);
        if overlaps {
            merged.add(&stored);
            if !is_merged {
                merged.add(&current);
                is_merged = true;
            }
        } else {
            kept.push(stored);
        }
    }

    *regions = kept;
    if is_merged {
        debug!(name = %merged.name(), "merged overlapping regions");
        regions.push(merged);
    } else {
        regions.push(current);
    }
}
