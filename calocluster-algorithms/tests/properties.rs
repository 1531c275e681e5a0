#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::unreadable_literal
)]
use approx::assert_relative_eq;
use calocluster_algorithms::{
    ClusteringConfig, GeometryContext, LayerClustering, ShowerClustering,
};
use calocluster_core::layers::LAYER_MAX;
use calocluster_core::{CellId, Cluster3d, EnergyDeposit, Hit};

const SIDE: u32 = 8;

/// Small linear congruential generator; reproducible without a rand dependency.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = (self.0.wrapping_mul(1103515245).wrapping_add(12345)) & 0x7fffffff;
        self.0 as u32
    }
}

/// 8x8 square grid, 10 mm pitch, cell = row * 8 + col.
fn square() -> Vec<(CellId, (f64, f64))> {
    (0..SIDE * SIDE)
        .map(|i| {
            let col = f64::from(i % SIDE);
            let row = f64::from(i / SIDE);
            (CellId::new(0, i), (col * 10.0, row * 10.0))
        })
        .collect()
}

/// Rhombic patch of a hexagonal lattice, 10 mm pitch, axial coordinates.
fn hexagonal() -> Vec<(CellId, (f64, f64))> {
    let mut cells = Vec::new();
    for r in 0..SIDE {
        for q in 0..SIDE {
            let x = 10.0 * (f64::from(q) + f64::from(r) / 2.0);
            let y = 10.0 * 3.0_f64.sqrt() / 2.0 * f64::from(r);
            cells.push((CellId::new(r, q), (x, y)));
        }
    }
    cells
}

/// Random deposits on `layer`, at most one per cell.
fn random_layer(rng: &mut Lcg, geometry: &GeometryContext, layer: usize) -> Vec<Hit> {
    geometry
        .cells()
        .filter_map(|id| {
            if rng.next() % 3 != 0 {
                return None;
            }
            let (x, y) = geometry.position(id).unwrap();
            let energy = f64::from(rng.next() % 1000) / 10.0 + 0.1;
            Some(Hit::new(id, layer, energy, x, y, 300.0 + 9.0 * layer as f64))
        })
        .collect()
}

fn random_event(rng: &mut Lcg, geometry: &GeometryContext) -> Vec<Hit> {
    let first = (rng.next() % 4) as usize;
    let last = 8 + (rng.next() % 20) as usize;
    (first..=last)
        .flat_map(|layer| random_layer(rng, geometry, layer))
        .collect()
}

#[test]
fn test_adjacency_is_symmetric() {
    for layout in [square(), hexagonal()] {
        let geo = GeometryContext::build(layout).unwrap();
        let cells: Vec<CellId> = geo.cells().collect();
        for &a in &cells {
            assert!(!geo.is_neighbor(a, a));
            for &b in &cells {
                assert_eq!(
                    geo.is_neighbor(a, b),
                    geo.is_neighbor(b, a),
                    "asymmetric pair {} / {}",
                    a,
                    b
                );
            }
            for &n in geo.neighbors_of(a) {
                assert!(geo.neighbors_of(n).contains(&a));
            }
        }
    }
}

#[test]
fn test_hexagonal_interior_has_two_rings() {
    let geo = GeometryContext::build(hexagonal()).unwrap();
    assert_relative_eq!(geo.nearest_neighbor_distance(), 10.0, epsilon = 1e-9);
    // First ring at 10 mm and second at 17.3 mm fall under the 18 mm cut;
    // the third at 20 mm does not.
    assert_eq!(geo.neighbors_of(CellId::new(4, 4)).len(), 12);
    assert!(!geo.is_neighbor(CellId::new(4, 4), CellId::new(4, 6)));
}

#[test]
fn test_geometry_build_is_idempotent() {
    let mut shuffled = hexagonal();
    shuffled.reverse();
    let first = GeometryContext::build(hexagonal()).unwrap();
    let second = GeometryContext::build(shuffled).unwrap();

    assert_eq!(first.pair_count(), second.pair_count());
    for id in first.cells() {
        assert_eq!(first.neighbors_of(id), second.neighbors_of(id));
    }
}

#[test]
fn test_layer_energy_is_conserved_when_splitting() {
    let geo = GeometryContext::build(square()).unwrap();
    let mut rng = Lcg(12345);

    for trial in 0..200 {
        let hits = random_layer(&mut rng, &geo, 6);
        let config = ClusteringConfig::new().with_n_neighbors(hits.len().max(1));
        let algo = LayerClustering::new(config);
        let mut state = algo.create_state();
        let clusters = algo.cluster(&geo, &hits, &mut state);

        let expected: f64 = hits.iter().map(|h| h.energy).sum();
        let found: f64 = clusters.iter().map(|c| c.energy).sum();
        assert_relative_eq!(found, expected, max_relative = 1e-9);
        assert!(
            clusters.iter().all(|c| !c.is_empty()),
            "trial {}: empty cluster",
            trial
        );
    }
}

#[test]
fn test_event_energy_is_conserved_when_nothing_is_discarded() {
    let geo = GeometryContext::build(hexagonal()).unwrap();
    let mut rng = Lcg(987654321);
    let engine = ShowerClustering::new(
        &geo,
        ClusteringConfig::new()
            .with_n_neighbors(64)
            .with_depth_good(1),
    )
    .unwrap();

    for _ in 0..50 {
        let hits = random_event(&mut rng, &geo);
        let out = engine.cluster_event(&hits);

        let expected: f64 = hits.iter().map(|h| h.energy).sum();
        let found: f64 = out.records().iter().map(EnergyDeposit::energy).sum();
        assert_relative_eq!(found, expected, max_relative = 1e-9);

        // Every 2D cluster ends up in exactly one place.
        let linked: usize = out.clusters_3d.iter().map(Cluster3d::depth).sum();
        assert_eq!(linked + out.clusters_2d.len(), out.statistics.clusters_2d);
    }
}

#[test]
fn test_outputs_non_increasing_and_depth_bounded() {
    let geo = GeometryContext::build(square()).unwrap();
    let mut rng = Lcg(42);

    for depth_good in [1, 3, 5, 8] {
        let config = ClusteringConfig::new()
            .with_seed_thresh(5.0)
            .with_neighb_thresh(1.0)
            .with_n_neighbors(2)
            .with_depth_good(depth_good);
        let engine = ShowerClustering::new(&geo, config).unwrap();

        for _ in 0..40 {
            let out = engine.cluster_event(&random_event(&mut rng, &geo));

            assert!(out.clusters_2d.windows(2).all(|w| w[0].energy >= w[1].energy));
            assert!(out.clusters_3d.windows(2).all(|w| w[0].energy >= w[1].energy));
            assert!(out.records().windows(2).all(|w| w[0].energy >= w[1].energy));

            for shower in &out.clusters_3d {
                assert!(
                    (depth_good..=LAYER_MAX).contains(&shower.depth()),
                    "depth {} outside {}..={}",
                    shower.depth(),
                    depth_good,
                    LAYER_MAX
                );
                assert!(shower.members.windows(2).all(|w| w[0].layer < w[1].layer));
            }
        }
    }
}
