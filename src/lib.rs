// src/lib.rs

//! Density-based fusion of per-resource metadata records.
//!
//! Multiple records describing the same or overlapping subject matter carry
//! redundant or conflicting timestamps and geographic locations. This crate
//! collapses them into one consolidated description: an outlier-aware
//! OPTICS-OF clustering engine detects groups of temporally or spatially
//! close records, and the geometric support (QuickHull convex hulls,
//! polygon union and containment) turns point clusters into merged area
//! descriptions.
//!
//! Entry points are the two orchestrators: [`fusion::TemporalFusion`]
//! consolidates timestamps into clusters with boundary ranges,
//! [`fusion::ArealFusion`] consolidates coordinates and geocoded polygons
//! into merged geographic regions. Record extraction, geocoding and result
//! serialization belong to the surrounding system, not to this crate.

pub mod clustering;
pub mod error;
pub mod fusion;
pub mod geometry;
pub mod types;

pub use error::{FusionError, FusionResult};
pub use types::*;

pub mod prelude {
    pub use super::{
        clustering::{
            ArealPoint, ClusterDetector, ClusterPoint, ClusteringResult, TemporalPoint,
        },
        error::{FusionError, FusionResult},
        fusion::{
            min_neighbors_for, ArealFusion, ArealFusionResult, TemporalFusion,
            TemporalFusionResult, TimeRange, MAX_OUTLIER_FACTOR,
        },
        geometry::{merge_region, ConvexHull, GeoArea},
        types::*,
    };
}
