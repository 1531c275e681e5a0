//! Cross-layer (3D) linking of 2D clusters.
//!
//! Each candidate is built by one sweep over all layers, starting at shower
//! max and walking to the back, then turning round to walk the front layers
//! towards the face. The first unclaimed 2D cluster met inside the seed
//! band starts the chain; every later layer contributes at most its most
//! energetic cluster whose seed cell equals or neighbors the anchor.
//! Sweeps repeat until one finds no seed.

use calocluster_core::clustering::{ClusteringConfig, ClusteringState};
use calocluster_core::layers::{in_seed_band, LAYER_MAX, LAYER_SHOWERMAX};
use calocluster_core::{CellId, Cluster2d, Cluster3d};

use crate::GeometryContext;

/// Direction of the sweep relative to shower max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    /// Shower max to the back. The anchor is the seed of the most recently
    /// appended member.
    OutwardFromShowerMax,
    /// Just in front of shower max to the face. The anchor restarts at the
    /// seed of the chain head, then follows members appended in this phase.
    InwardToFront,
}

/// One layer visit of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepStep {
    /// Layer visited.
    pub layer: usize,
    /// Phase the visit belongs to.
    pub phase: SweepPhase,
}

/// Fixed layer visiting order: `LAYER_SHOWERMAX..LAYER_MAX`, then
/// `LAYER_SHOWERMAX - 1` down to 0.
pub fn sweep_order() -> impl Iterator<Item = SweepStep> {
    let outward = (LAYER_SHOWERMAX..LAYER_MAX).map(|layer| SweepStep {
        layer,
        phase: SweepPhase::OutwardFromShowerMax,
    });
    let inward = (0..LAYER_SHOWERMAX).rev().map(|layer| SweepStep {
        layer,
        phase: SweepPhase::InwardToFront,
    });
    outward.chain(inward)
}

/// A 3D candidate under construction: arena indices plus the anchor.
struct Chain {
    members: Vec<usize>,
    phase: SweepPhase,
    anchor: Option<CellId>,
}

impl Chain {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            phase: SweepPhase::OutwardFromShowerMax,
            anchor: None,
        }
    }

    fn depth(&self) -> usize {
        self.members.len()
    }

    /// Switches phase. Turning inward re-anchors on the head, the member
    /// nearest shower max, since extension now runs the other way.
    fn enter(&mut self, phase: SweepPhase, arena: &[Cluster2d]) {
        if phase == self.phase {
            return;
        }
        self.phase = phase;
        if phase == SweepPhase::InwardToFront {
            self.anchor = self.members.first().map(|&i| arena[i].seed);
        }
    }

    fn append(&mut self, index: usize, seed: CellId) {
        self.members.push(index);
        self.anchor = Some(seed);
    }
}

/// Scratch storage for linking one event.
///
/// 2D clusters stay in their arena; `by_layer` lists arena indices per
/// layer in descending energy and `claimed` tombstones those taken by a
/// candidate.
#[derive(Debug, Default)]
pub struct LinkingState {
    by_layer: Vec<Vec<usize>>,
    claimed: Vec<bool>,
}

impl LinkingState {
    fn load(&mut self, clusters: &[Cluster2d]) {
        self.reset();
        self.by_layer.resize_with(LAYER_MAX, Vec::new);
        self.claimed.resize(clusters.len(), false);
        for (i, c) in clusters.iter().enumerate() {
            if let Some(bucket) = self.by_layer.get_mut(c.layer) {
                bucket.push(i);
            }
        }
        for bucket in &mut self.by_layer {
            bucket.sort_by(|&a, &b| clusters[b].energy.total_cmp(&clusters[a].energy));
        }
    }
}

impl ClusteringState for LinkingState {
    fn reset(&mut self) {
        for bucket in &mut self.by_layer {
            bucket.clear();
        }
        self.claimed.clear();
    }
}

/// Result of linking one event.
#[derive(Debug, Clone, Default)]
pub struct LinkingOutput {
    /// Kept 3D clusters, in the order they were built.
    pub clusters_3d: Vec<Cluster3d>,
    /// 2D clusters no candidate claimed.
    pub unclaimed: Vec<Cluster2d>,
    /// Candidates built, kept or discarded.
    pub candidates: usize,
    /// Candidates discarded below `depth_good`.
    pub discarded: usize,
}

/// Cross-layer linker.
#[derive(Debug, Clone)]
pub struct ShowerLinking {
    depth_good: usize,
    min_tp_energy: f64,
}

impl Default for ShowerLinking {
    fn default() -> Self {
        Self::new(&ClusteringConfig::default())
    }
}

impl ShowerLinking {
    /// Create from the shared clustering configuration.
    #[must_use]
    pub fn new(config: &ClusteringConfig) -> Self {
        Self {
            depth_good: config.depth_good,
            min_tp_energy: config.min_tp_energy,
        }
    }

    /// Minimum depth a candidate needs to be kept.
    #[must_use]
    pub fn depth_good(&self) -> usize {
        self.depth_good
    }

    /// Create a fresh scratch state.
    #[must_use]
    pub fn create_state(&self) -> LinkingState {
        LinkingState::default()
    }

    /// Chains `clusters` into 3D clusters.
    ///
    /// Members of discarded candidates are consumed: they appear neither in
    /// a 3D cluster nor among the unclaimed 2D clusters.
    #[must_use]
    pub fn link(
        &self,
        geometry: &GeometryContext,
        clusters: Vec<Cluster2d>,
        state: &mut LinkingState,
    ) -> LinkingOutput {
        state.load(&clusters);

        let mut kept = Vec::new();
        let mut candidates = 0;
        let mut discarded = 0;
        loop {
            let chain = Self::sweep(geometry, &clusters, state);
            if chain.depth() == 0 {
                break;
            }
            candidates += 1;
            if chain.depth() >= self.depth_good {
                log::trace!("3d candidate kept with depth {}", chain.depth());
                kept.push(chain.members);
            } else {
                log::trace!(
                    "3d candidate discarded with depth {} < {}",
                    chain.depth(),
                    self.depth_good
                );
                discarded += 1;
            }
        }

        let mut slots: Vec<Option<Cluster2d>> = clusters.into_iter().map(Some).collect();
        let clusters_3d = kept
            .into_iter()
            .filter_map(|members| {
                let members: Vec<Cluster2d> =
                    members.iter().filter_map(|&i| slots[i].take()).collect();
                Cluster3d::from_chain(members, self.min_tp_energy)
            })
            .collect();
        let unclaimed = slots
            .into_iter()
            .zip(&state.claimed)
            .filter(|(_, claimed)| !**claimed)
            .filter_map(|(slot, _)| slot)
            .collect();

        LinkingOutput {
            clusters_3d,
            unclaimed,
            candidates,
            discarded,
        }
    }

    /// Builds one candidate, claiming its members.
    fn sweep(geometry: &GeometryContext, arena: &[Cluster2d], state: &mut LinkingState) -> Chain {
        let mut chain = Chain::new();
        for step in sweep_order() {
            chain.enter(step.phase, arena);
            let layer = &state.by_layer[step.layer];
            let claimed = &state.claimed;

            let found = match chain.anchor {
                None if in_seed_band(step.layer) => layer.iter().copied().find(|&i| !claimed[i]),
                None => None,
                Some(anchor) => layer.iter().copied().find(|&i| {
                    let seed = arena[i].seed;
                    !claimed[i] && (seed == anchor || geometry.is_neighbor(anchor, seed))
                }),
            };

            if let Some(i) = found {
                log::trace!(
                    "3d {:?} layer {}: {} cluster {} ({:.3} MeV)",
                    step.phase,
                    step.layer,
                    if chain.depth() == 0 { "seed" } else { "extend with" },
                    arena[i].seed,
                    arena[i].energy
                );
                state.claimed[i] = true;
                chain.append(i, arena[i].seed);
            }
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calocluster_core::Hit;

    fn row(n: u32) -> GeometryContext {
        GeometryContext::build((0..n).map(|i| (CellId::new(0, i), (f64::from(i) * 10.0, 0.0))))
            .unwrap()
    }

    fn cluster(layer: usize, cell: u32, energy: f64) -> Cluster2d {
        let hit = Hit::new(
            CellId::new(0, cell),
            layer,
            energy,
            f64::from(cell) * 10.0,
            0.0,
            200.0 + 10.0 * layer as f64,
        );
        Cluster2d::from_seed(hit, 0.5)
    }

    fn link(depth_good: usize, clusters: Vec<Cluster2d>) -> LinkingOutput {
        let geo = row(12);
        let linker = ShowerLinking::new(&ClusteringConfig::new().with_depth_good(depth_good));
        let mut state = linker.create_state();
        linker.link(&geo, clusters, &mut state)
    }

    #[test]
    fn test_sweep_order() {
        let layers: Vec<usize> = sweep_order().map(|s| s.layer).collect();
        assert_eq!(layers.len(), LAYER_MAX);
        assert_eq!(&layers[..4], &[7, 8, 9, 10]);
        assert_eq!(layers[LAYER_MAX - LAYER_SHOWERMAX - 1], 34);
        assert_eq!(&layers[LAYER_MAX - LAYER_SHOWERMAX..], &[6, 5, 4, 3, 2, 1, 0]);

        let first_inward = sweep_order()
            .find(|s| s.phase == SweepPhase::InwardToFront)
            .unwrap();
        assert_eq!(first_inward.layer, LAYER_SHOWERMAX - 1);
    }

    #[test]
    fn test_acceptance_boundary() {
        let chain = || (5..=9).map(|l| cluster(l, 4, 100.0)).collect::<Vec<_>>();

        let kept = link(5, chain());
        assert_eq!(kept.clusters_3d.len(), 1);
        assert_eq!(kept.clusters_3d[0].depth(), 5);
        assert_eq!(kept.clusters_3d[0].seed_layer, 7);
        assert_eq!(kept.candidates, 1);
        assert!(kept.unclaimed.is_empty());

        let dropped = link(6, chain());
        assert!(dropped.clusters_3d.is_empty());
        assert_eq!(dropped.discarded, 1);
        // Consumed by the discarded candidate.
        assert!(dropped.unclaimed.is_empty());
    }

    #[test]
    fn test_inward_phase_anchors_on_head() {
        // Diagonal track: layer l sits at cell l - 3. The outward tail
        // (layer 9, cell 6) is far from layer 6 (cell 3); only the head
        // (layer 7, cell 4) neighbors it.
        let clusters = (5..=9).map(|l| cluster(l, l as u32 - 3, 80.0)).collect();
        let out = link(5, clusters);

        assert_eq!(out.clusters_3d.len(), 1);
        let c3 = &out.clusters_3d[0];
        assert_eq!(c3.depth(), 5);
        assert_eq!(c3.first_layer, 5);
        assert_eq!(c3.last_layer, 9);
    }

    #[test]
    fn test_head_anchor_survives_empty_first_inward_layer() {
        // Seed on layer 7 at cell 4, outward tail at cells 5..=7 on layers
        // 8..=10. Layer 6 is empty, so layer 5 (cell 3) must still match
        // against the head rather than the tail at cell 7.
        let mut clusters: Vec<Cluster2d> = (7..=10)
            .map(|l| cluster(l, l as u32 - 3, 80.0))
            .collect();
        clusters.push(cluster(5, 3, 80.0));
        let out = link(5, clusters);

        assert_eq!(out.clusters_3d.len(), 1);
        let c3 = &out.clusters_3d[0];
        assert_eq!(c3.depth(), 5);
        assert_eq!((c3.first_layer, c3.last_layer), (5, 10));
        assert!(out.unclaimed.is_empty());
    }

    #[test]
    fn test_gaps_are_skipped() {
        // Layers 8 and 10 are empty.
        let clusters = [7, 9, 11, 12, 13]
            .iter()
            .map(|&l| cluster(l, 5, 50.0))
            .collect();
        let out = link(5, clusters);
        assert_eq!(out.clusters_3d.len(), 1);
        assert_eq!(out.clusters_3d[0].first_layer, 7);
        assert_eq!(out.clusters_3d[0].last_layer, 13);
    }

    #[test]
    fn test_seed_band() {
        // Nothing in layers 3..=15: no candidate can start.
        let clusters = vec![cluster(1, 5, 90.0), cluster(2, 5, 90.0), cluster(20, 5, 90.0)];
        let out = link(1, clusters);
        assert_eq!(out.candidates, 0);
        assert_eq!(out.unclaimed.len(), 3);
    }

    #[test]
    fn test_highest_energy_seeds_first() {
        let clusters = vec![cluster(7, 1, 20.0), cluster(7, 8, 70.0)];
        let out = link(1, clusters);
        assert_eq!(out.clusters_3d.len(), 2);
        assert_eq!(out.clusters_3d[0].seed, CellId::new(0, 8));
        assert_eq!(out.clusters_3d[1].seed, CellId::new(0, 1));
    }

    #[test]
    fn test_extension_takes_first_match_only() {
        // Layer 8 holds two clusters next to the seed; the more energetic
        // one joins, the other is left for a later candidate.
        let clusters = vec![
            cluster(7, 5, 100.0),
            cluster(8, 4, 30.0),
            cluster(8, 6, 60.0),
        ];
        let out = link(1, clusters);
        assert_eq!(out.clusters_3d.len(), 2);
        let first = &out.clusters_3d[0];
        assert_eq!(first.depth(), 2);
        assert!(first
            .members
            .iter()
            .any(|c| c.layer == 8 && c.seed == CellId::new(0, 6)));
        assert_eq!(out.clusters_3d[1].seed, CellId::new(0, 4));
    }

    #[test]
    fn test_no_clusters() {
        let out = link(5, Vec::new());
        assert_eq!(out.candidates, 0);
        assert!(out.clusters_3d.is_empty());
        assert!(out.unclaimed.is_empty());
    }
}
