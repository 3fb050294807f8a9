// src/clustering/detector.rs

//! # Cluster Detection Module
//!
//! Implementation of the OPTICS-OF algorithm (Ankerst, Breunig, Kriegel,
//! Sander). Records are brought into an augmented ordering driven by
//! reachability distances, annotated with local reachability densities and
//! outlier factors, and finally partitioned into clusters, outliers and
//! records without usable metadata.
//!
//! See the papers "OPTICS: Ordering Points To Identify the Clustering
//! Structure" and "OPTICS-OF: Identifying Local Outliers" for the underlying
//! theory.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::debug;

use crate::clustering::object::ClusterPoint;
use crate::clustering::result::ClusteringResult;

/// Reachability sentinel: a record that was never reached from a processed
/// neighbor keeps this value.
const UNDEFINED_REACHABILITY: f64 = f64::INFINITY;

/// Detects clusters in a set of records via the OPTICS-OF algorithm.
///
/// The detector is parameterized by the radius in which neighbors are
/// searched, the minimal neighbor count for a record to be a core object,
/// and the outlier-factor ceiling up to which a record still belongs to a
/// cluster (default 1.5).
#[derive(Debug, Clone, Copy)]
pub struct ClusterDetector {
    neighborhood_radius: f64,
    min_neighbors: usize,
    max_outlier_factor: f64,
}

impl ClusterDetector {
    pub fn new(neighborhood_radius: f64, min_neighbors: usize) -> Self {
        Self {
            neighborhood_radius,
            min_neighbors,
            max_outlier_factor: 1.5,
        }
    }

    /// Sets the outlier-factor ceiling.
    pub fn with_max_outlier_factor(mut self, max_outlier_factor: f64) -> Self {
        self.max_outlier_factor = max_outlier_factor;
        self
    }

    /// Runs the full algorithm over `points` and reads the partition off the
    /// augmented ordering.
    ///
    /// `points` are visited in slice order; callers that need a
    /// deterministic ordering sort by the clustered attribute first. Inputs
    /// with fewer than `min_neighbors` usable records degenerate to
    /// singleton clusters and outliers rather than failing.
    pub fn detect_clusters<P: ClusterPoint>(&self, points: &[P]) -> ClusteringResult {
        let mut run = OpticsRun::new(
            points,
            self.neighborhood_radius,
            self.min_neighbors,
            self.max_outlier_factor,
        );
        run.compute_core_distances();
        debug!("computed all core distances");
        run.compute_reachabilities();
        debug!("computed all reachability distances");
        run.compute_outlier_factors();
        debug!("computed all outlier factors");
        run.into_result()
    }
}

/// A neighbor reference: arena slot of the neighbor plus the query distance
/// from the record whose neighborhood this entry belongs to.
struct Neighbor {
    slot: usize,
    distance: f64,
}

/// Mutable per-record algorithm state, held in a dense arena parallel to the
/// input slice. All three phases address records by slot.
struct ObjectState {
    core_distance: Option<f64>,
    reachability: f64,
    /// Set once the record received its first reachability assignment; a
    /// seeded record is already queued and is never re-inserted unless its
    /// reachability strictly improves.
    seeded: bool,
    local_reachability_density: f64,
    outlier_factor: f64,
    neighbors: Vec<Neighbor>,
    processed: bool,
}

impl ObjectState {
    fn new() -> Self {
        Self {
            core_distance: None,
            reachability: UNDEFINED_REACHABILITY,
            seeded: false,
            local_reachability_density: 0.0,
            outlier_factor: 0.0,
            neighbors: Vec::new(),
            processed: false,
        }
    }

    fn has_reachability(&self) -> bool {
        self.reachability.is_finite()
    }
}

/// Heap key ordered by a distance value first and the record's metadata
/// index second, so equal distances resolve deterministically.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    value: f64,
    index: usize,
    slot: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .partial_cmp(&other.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// State of one detector invocation. Built fresh per run and discarded with
/// the run; nothing survives into a later invocation.
struct OpticsRun<'a, P: ClusterPoint> {
    points: &'a [P],
    neighborhood_radius: f64,
    min_neighbors: usize,
    max_outlier_factor: f64,
    states: Vec<ObjectState>,
    /// Slots of records that carry the clustered attribute, in input order.
    working: Vec<usize>,
    /// The augmented ordering; attribute-less records come first, then the
    /// reachability-driven visiting order.
    augmented_order: Vec<usize>,
}

impl<'a, P: ClusterPoint> OpticsRun<'a, P> {
    fn new(
        points: &'a [P],
        neighborhood_radius: f64,
        min_neighbors: usize,
        max_outlier_factor: f64,
    ) -> Self {
        let states = points.iter().map(|_| ObjectState::new()).collect();

        // Records without the clustered attribute never participate as
        // neighbors; they are routed straight into the augmented order.
        let mut working = Vec::with_capacity(points.len());
        let mut augmented_order = Vec::with_capacity(points.len());
        for (slot, point) in points.iter().enumerate() {
            if point.has_metadata() {
                working.push(slot);
            } else {
                augmented_order.push(slot);
            }
        }

        Self {
            points,
            neighborhood_radius,
            min_neighbors,
            max_outlier_factor,
            states,
            working,
            augmented_order,
        }
    }

    /// Phase 1: build every record's neighborhood and set its core distance,
    /// the distance to its `min_neighbors`-th nearest neighbor.
    fn compute_core_distances(&mut self) {
        for i in 0..self.working.len() {
            let slot = self.working[i];
            let neighbors = self.neighborhood_of(slot);
            let core_distance = if neighbors.len() >= self.min_neighbors {
                Some(neighbors[self.min_neighbors - 1].distance)
            } else {
                None
            };

            let state = &mut self.states[slot];
            state.neighbors = neighbors;
            state.core_distance = core_distance;
        }
    }

    /// Builds the neighbor list of `slot`: every other working record within
    /// `neighborhood_radius`, backfilled with the closest records beyond the
    /// radius until at least `min_neighbors` neighbors exist (or the
    /// candidates run out). The result is ordered by distance, then index.
    fn neighborhood_of(&self, slot: usize) -> Vec<Neighbor> {
        let mut neighbors = Vec::new();
        let mut distant: BinaryHeap<Reverse<QueueEntry>> = BinaryHeap::new();

        for &other in &self.working {
            if other == slot {
                continue;
            }
            let distance = self.points[slot].distance_to(&self.points[other]);
            if distance <= self.neighborhood_radius {
                neighbors.push(Neighbor { slot: other, distance });
            } else {
                distant.push(Reverse(QueueEntry {
                    value: distance,
                    index: self.points[other].index(),
                    slot: other,
                }));
            }
        }

        while neighbors.len() < self.min_neighbors {
            match distant.pop() {
                Some(Reverse(entry)) => neighbors.push(Neighbor {
                    slot: entry.slot,
                    distance: entry.value,
                }),
                None => break,
            }
        }

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.points[a.slot].index().cmp(&self.points[b.slot].index()))
        });
        neighbors
    }

    /// Phase 2: produce the augmented ordering. Every record not yet reached
    /// starts a fresh local neighborhood with undefined reachability; its
    /// unprocessed neighbors are inserted into the seed queue (or improved
    /// in place) and drained in reachability order.
    fn compute_reachabilities(&mut self) {
        let mut seed_queue: BinaryHeap<Reverse<QueueEntry>> = BinaryHeap::new();

        for i in 0..self.working.len() {
            let slot = self.working[i];
            if self.states[slot].processed {
                continue;
            }
            self.states[slot].processed = true;
            self.states[slot].reachability = UNDEFINED_REACHABILITY;
            self.augmented_order.push(slot);

            self.update_seed_queue(slot, &mut seed_queue);
            while let Some(Reverse(entry)) = seed_queue.pop() {
                // stale entry from a later improvement or an earlier drain
                if self.states[entry.slot].processed {
                    continue;
                }
                self.states[entry.slot].processed = true;
                self.augmented_order.push(entry.slot);
                self.update_seed_queue(entry.slot, &mut seed_queue);
            }
        }
    }

    /// Offers every unprocessed neighbor of `center` the reachability
    /// candidate `max(center core distance, distance)`, inserting it into
    /// the seed queue or re-positioning it when the candidate strictly
    /// improves. While walking the neighbors, the reachability sum over the
    /// first `min_neighbors` of them is accumulated and the center's local
    /// reachability density is set from it.
    fn update_seed_queue(
        &mut self,
        center: usize,
        seed_queue: &mut BinaryHeap<Reverse<QueueEntry>>,
    ) {
        let core_distance = self.states[center]
            .core_distance
            .unwrap_or(UNDEFINED_REACHABILITY);
        let mut reachability_sum = 0.0;

        let neighbors = std::mem::take(&mut self.states[center].neighbors);
        for (rank, neighbor) in neighbors.iter().enumerate() {
            if !self.states[neighbor.slot].processed {
                let candidate = core_distance.max(neighbor.distance);
                let state = &mut self.states[neighbor.slot];
                if !state.seeded {
                    state.seeded = true;
                    state.reachability = candidate;
                    seed_queue.push(Reverse(QueueEntry {
                        value: candidate,
                        index: self.points[neighbor.slot].index(),
                        slot: neighbor.slot,
                    }));
                } else if candidate < state.reachability {
                    state.reachability = candidate;
                    seed_queue.push(Reverse(QueueEntry {
                        value: candidate,
                        index: self.points[neighbor.slot].index(),
                        slot: neighbor.slot,
                    }));
                }
            }

            // reachability sum from the center to its min_neighbors nearest;
            // here the neighbor's own core distance caps from below
            if rank < self.min_neighbors {
                let neighbor_core = self.states[neighbor.slot]
                    .core_distance
                    .unwrap_or(UNDEFINED_REACHABILITY);
                reachability_sum += neighbor_core.max(neighbor.distance);
            }
        }
        self.states[center].neighbors = neighbors;

        // inverse of the mean reachability distance to the nearest neighbors
        self.states[center].local_reachability_density =
            self.min_neighbors as f64 / reachability_sum;
    }

    /// Phase 3: once all densities are known, every record's outlier factor
    /// is the mean ratio of neighbor density to own density over its first
    /// `min_neighbors` neighbors.
    fn compute_outlier_factors(&mut self) {
        for i in 0..self.working.len() {
            let slot = self.working[i];
            let own_density = self.states[slot].local_reachability_density;

            let mut density_ratio_sum = 0.0;
            for neighbor in self.states[slot].neighbors.iter().take(self.min_neighbors) {
                density_ratio_sum +=
                    self.states[neighbor.slot].local_reachability_density / own_density;
            }

            self.states[slot].outlier_factor = density_ratio_sum / self.min_neighbors as f64;
        }
    }

    /// Walks the augmented ordering and reads off the partition. A record
    /// with undefined reachability marks a jump: it starts a new cluster if
    /// its outlier factor permits, otherwise it is an outlier. A cluster
    /// never silently resumes across an outlier run.
    fn into_result(self) -> ClusteringResult {
        let mut result = ClusteringResult::new();
        let mut was_previous_outlier = false;

        for &slot in &self.augmented_order {
            let index = self.points[slot].index();
            if !self.points[slot].has_metadata() {
                result.add_no_metadata(index);
                continue;
            }

            let state = &self.states[slot];
            let in_cluster_range =
                state.has_reachability() && state.outlier_factor <= self.max_outlier_factor;

            if !in_cluster_range {
                if state.outlier_factor <= self.max_outlier_factor {
                    result.add_to_new_cluster(index);
                    was_previous_outlier = false;
                } else {
                    result.add_outlier(index);
                    was_previous_outlier = true;
                }
            } else if was_previous_outlier {
                result.add_to_new_cluster(index);
                was_previous_outlier = false;
            } else {
                result.add_to_existing_cluster(index);
            }
        }

        result
    }
}
