//! Seeded per-layer (2D) clustering.
//!
//! Seeds are local energy maxima on the neighbor graph. Each growth pass
//! collects every unclaimed neighbor of every cluster against the state
//! frozen at the start of the pass, then applies all claims at once.
//! Hits wanted by several clusters are shared between them.
#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, BTreeSet};

use calocluster_core::clustering::{ClusteringConfig, ClusteringState};
use calocluster_core::{CellId, Cluster2d, Hit};

use crate::GeometryContext;

/// Scratch storage for clustering one layer.
///
/// Hits live in an arena; `claimed` is the per-hit tombstone used during
/// growth. Reused across layers and cleared by [`reset`](ClusteringState::reset).
#[derive(Debug, Default)]
pub struct LayerState {
    hits: Vec<Hit>,
    index: BTreeMap<CellId, usize>,
    claimed: Vec<bool>,
    replaced: usize,
}

impl LayerState {
    /// Number of hits in the last layer that overwrote an earlier hit on
    /// the same cell.
    #[must_use]
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    fn load(&mut self, hits: &[Hit]) {
        self.reset();
        for hit in hits {
            if let Some(&slot) = self.index.get(&hit.cell) {
                log::warn!(
                    "layer {}: cell {} hit twice, keeping the later hit ({:.3} MeV over {:.3} MeV)",
                    hit.layer,
                    hit.cell,
                    hit.energy,
                    self.hits[slot].energy
                );
                self.hits[slot] = *hit;
                self.replaced += 1;
            } else {
                self.index.insert(hit.cell, self.hits.len());
                self.hits.push(*hit);
            }
        }
        self.claimed.resize(self.hits.len(), false);
    }
}

impl ClusteringState for LayerState {
    fn reset(&mut self) {
        self.hits.clear();
        self.index.clear();
        self.claimed.clear();
        self.replaced = 0;
    }
}

/// Per-layer seed-and-grow clustering.
#[derive(Debug, Clone, Default)]
pub struct LayerClustering {
    config: ClusteringConfig,
}

impl LayerClustering {
    /// Create with custom configuration.
    #[must_use]
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Create a fresh scratch state.
    #[must_use]
    pub fn create_state(&self) -> LayerState {
        LayerState::default()
    }

    /// Clusters the hits of a single layer.
    ///
    /// All hits must share one layer. If a cell appears twice the later
    /// hit replaces the earlier one. Clusters are returned in seed-cell
    /// order.
    #[must_use]
    pub fn cluster(
        &self,
        geometry: &GeometryContext,
        hits: &[Hit],
        state: &mut LayerState,
    ) -> Vec<Cluster2d> {
        debug_assert!(
            hits.windows(2).all(|w| w[0].layer == w[1].layer),
            "hits from several layers passed to LayerClustering::cluster"
        );
        state.load(hits);
        if state.hits.is_empty() {
            return Vec::new();
        }

        let mut clusters = self.find_seeds(geometry, state);
        for pass in 0..self.config.n_neighbors {
            if !self.grow(geometry, state, &mut clusters) {
                log::trace!("layer growth settled after {pass} pass(es)");
                break;
            }
        }
        clusters
    }

    /// A hit seeds a cluster if it exceeds `seed_thresh` and no neighbor is
    /// strictly more energetic. Equal neighbors both seed.
    fn find_seeds(&self, geometry: &GeometryContext, state: &mut LayerState) -> Vec<Cluster2d> {
        let LayerState {
            hits,
            index,
            claimed,
            ..
        } = state;

        let mut clusters = Vec::new();
        for &slot in index.values() {
            let hit = hits[slot];
            if hit.energy <= self.config.seed_thresh {
                continue;
            }
            let is_local_max = geometry
                .neighbors_of(hit.cell)
                .iter()
                .filter_map(|n| index.get(n))
                .all(|&other| hits[other].energy <= hit.energy);
            if is_local_max {
                log::trace!(
                    "layer {}: seed {} at {:.3} MeV",
                    hit.layer,
                    hit.cell,
                    hit.energy
                );
                claimed[slot] = true;
                clusters.push(Cluster2d::from_seed(hit, self.config.min_tp_energy));
            }
        }
        clusters
    }

    /// Runs one growth pass. Returns false if no cluster found anything to
    /// absorb, in which case later passes cannot either.
    fn grow(
        &self,
        geometry: &GeometryContext,
        state: &mut LayerState,
        clusters: &mut [Cluster2d],
    ) -> bool {
        let LayerState {
            hits,
            index,
            claimed,
            ..
        } = state;

        // Energies before this pass; splits are proportional to these.
        let snapshot: Vec<f64> = clusters.iter().map(|c| c.energy).collect();

        let mut contenders: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut wanted = BTreeSet::new();
        for (ci, cluster) in clusters.iter().enumerate() {
            wanted.clear();
            for member in &cluster.hits {
                for n in geometry.neighbors_of(member.cell) {
                    if let Some(&slot) = index.get(n) {
                        if !claimed[slot] && hits[slot].energy > self.config.neighb_thresh {
                            wanted.insert(slot);
                        }
                    }
                }
            }
            for &slot in &wanted {
                contenders.entry(slot).or_default().push(ci);
            }
        }

        if contenders.is_empty() {
            return false;
        }

        for (slot, owners) in contenders {
            claimed[slot] = true;
            self.absorb(clusters, &snapshot, hits[slot], &owners);
        }
        for cluster in clusters.iter_mut() {
            cluster.refresh(self.config.min_tp_energy);
        }
        true
    }

    fn absorb(&self, clusters: &mut [Cluster2d], snapshot: &[f64], hit: Hit, owners: &[usize]) {
        if let [only] = owners {
            clusters[*only].push(hit);
            return;
        }

        if self.config.split_energy {
            let total: f64 = owners.iter().map(|&ci| snapshot[ci]).sum();
            for &ci in owners {
                let share = if total > 0.0 {
                    hit.energy * snapshot[ci] / total
                } else {
                    hit.energy / owners.len() as f64
                };
                clusters[ci].push(hit.with_energy(share));
            }
        } else {
            // Every contender takes the full energy; the layer total is
            // no longer conserved.
            for &ci in owners {
                clusters[ci].push(hit);
            }
        }
        log::trace!(
            "layer {}: cell {} ({:.3} MeV) shared by {} clusters",
            hit.layer,
            hit.cell,
            hit.energy,
            owners.len()
        );
    }
}
