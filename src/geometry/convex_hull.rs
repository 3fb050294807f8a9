// src/geometry/convex_hull.rs

//! # Convex Hull Module
//!
//! QuickHull construction of the convex hull of a set of 2-D points,
//! producing a [`GeoArea`] from the ordered hull boundary. Average time
//! complexity O(n log n), worst case O(n²).
//!
//! Degenerate inputs (fewer than 3 unique points) yield an area whose
//! boundary is exactly the deduplicated point set.

use tracing::warn;

use crate::geometry::GeoArea;
use crate::types::Point2D;

/// Computes the convex hull of a point set on construction.
pub struct ConvexHull {
    polygon: GeoArea,
}

impl ConvexHull {
    /// Builds the hull of `points`. Duplicate points are removed first,
    /// keeping the first occurrence.
    pub fn new(points: &[Point2D]) -> Self {
        let mut unique: Vec<Point2D> = Vec::with_capacity(points.len());
        for &point in points {
            if !unique.contains(&point) {
                unique.push(point);
            }
        }

        Self {
            polygon: Self::create_hull(unique),
        }
    }

    pub fn polygon(&self) -> &GeoArea {
        &self.polygon
    }

    pub fn into_polygon(self) -> GeoArea {
        self.polygon
    }

    fn create_hull(mut points: Vec<Point2D>) -> GeoArea {
        if points.len() < 3 {
            warn!(
                count = points.len(),
                "not enough points for a convex hull, boundary is the point set itself"
            );
            return GeoArea::from_points(points);
        }

        // The extreme points by x are permanent hull vertices.
        let (leftmost, rightmost) = Self::extremal_points(&points);
        points.retain(|p| *p != leftmost && *p != rightmost);

        let mut left_set = Vec::new();
        let mut right_set = Vec::new();
        for &point in &points {
            if Self::cross_product(leftmost, rightmost, point) > 0.0 {
                left_set.push(point);
            } else {
                right_set.push(point);
            }
        }

        let mut hull = vec![leftmost];
        hull.extend(Self::hull_chain(leftmost, rightmost, &left_set));
        hull.push(rightmost);
        hull.extend(Self::hull_chain(rightmost, leftmost, &right_set));

        GeoArea::from_points(hull)
    }

    /// Finds the points with minimal and maximal x coordinate. Ties keep the
    /// first occurrence.
    fn extremal_points(points: &[Point2D]) -> (Point2D, Point2D) {
        let mut leftmost = points[0];
        let mut rightmost = points[0];

        for &point in &points[1..] {
            if point.x < leftmost.x {
                leftmost = point;
            }
            if point.x > rightmost.x {
                rightmost = point;
            }
        }

        (leftmost, rightmost)
    }

    /// Hull points strictly between `a` and `b`, in boundary order. `set`
    /// holds the candidates lying strictly left of the directed line a → b.
    fn hull_chain(a: Point2D, b: Point2D, set: &[Point2D]) -> Vec<Point2D> {
        match set {
            [] => Vec::new(),
            [single] => vec![*single],
            _ => {
                // Furthest candidate from the line. The unnormalized cross
                // product magnitude suffices since only the relative order
                // matters.
                let mut furthest = set[0];
                let mut furthest_distance = f64::MIN;
                for &point in set {
                    let distance = Self::cross_product(a, b, point).abs();
                    if distance > furthest_distance {
                        furthest_distance = distance;
                        furthest = point;
                    }
                }

                let left_of_af: Vec<Point2D> = set
                    .iter()
                    .copied()
                    .filter(|&p| Self::cross_product(a, furthest, p) > 0.0)
                    .collect();
                let left_of_fb: Vec<Point2D> = set
                    .iter()
                    .copied()
                    .filter(|&p| Self::cross_product(furthest, b, p) > 0.0)
                    .collect();

                let mut chain = Self::hull_chain(a, furthest, &left_of_af);
                chain.push(furthest);
                chain.extend(Self::hull_chain(furthest, b, &left_of_fb));
                chain
            }
        }
    }

    /// 2-D cross product of (b − a) × (p − a); positive when `p` lies left
    /// of the directed line a → b.
    #[inline]
    fn cross_product(a: Point2D, b: Point2D, p: Point2D) -> f64 {
        (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
    }
}
