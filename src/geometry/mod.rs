// src/geometry/mod.rs
pub mod convex_hull;
pub mod geo_area;

pub use convex_hull::*;
pub use geo_area::*;
