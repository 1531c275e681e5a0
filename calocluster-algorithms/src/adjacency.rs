//! Nearest-neighbor adjacency between readout cells.
//!
//! Built once per run from one layer's cell layout and shared read-only by
//! every event. Layers are congruent, so one graph serves them all.

use std::collections::{HashMap, HashSet};

use calocluster_core::{CellId, GeometryError};

/// Cells closer than this multiple of the nearest-neighbor spacing are adjacent.
pub const NEIGHBOR_SCALE: f64 = 1.8;

/// Run-scoped cell geometry and its neighbor graph.
///
/// Immutable after [`build`](Self::build); pass it by reference into every
/// per-event call.
#[derive(Debug, Clone)]
pub struct GeometryContext {
    positions: HashMap<CellId, (f64, f64)>,
    neighbors: HashMap<CellId, Vec<CellId>>,
    /// Unordered pairs stored as (lower, higher).
    pairs: HashSet<(CellId, CellId)>,
    nearest_distance: f64,
    threshold: f64,
}

impl GeometryContext {
    /// Builds the adjacency graph from `(identity, (x, y))` pairs.
    ///
    /// Computes all pairwise distances, takes the smallest as the
    /// nearest-neighbor spacing and marks every pair strictly closer than
    /// [`NEIGHBOR_SCALE`] times that spacing as adjacent.
    ///
    /// Every identity must map to its own position, so a zero distance
    /// between two distinct cells is rejected rather than skipped when
    /// looking for the smallest spacing.
    ///
    /// # Errors
    /// Fails if fewer than two cells are given, an identity repeats, a
    /// position is not finite or two cells coincide.
    pub fn build<I>(cells: I) -> Result<Self, GeometryError>
    where
        I: IntoIterator<Item = (CellId, (f64, f64))>,
    {
        let mut positions = HashMap::new();
        let mut order = Vec::new();
        for (id, (x, y)) in cells {
            if !(x.is_finite() && y.is_finite()) {
                return Err(GeometryError::NonFinitePosition(id));
            }
            if positions.insert(id, (x, y)).is_some() {
                return Err(GeometryError::DuplicateCell(id));
            }
            order.push(id);
        }
        if order.len() < 2 {
            return Err(GeometryError::TooFewCells { cells: order.len() });
        }
        order.sort_unstable();

        // Pairwise distances, upper triangle only.
        let mut distances = Vec::with_capacity(order.len() * (order.len() - 1) / 2);
        let mut nearest_distance = f64::INFINITY;
        for (i, &a) in order.iter().enumerate() {
            let (ax, ay) = positions[&a];
            for &b in &order[i + 1..] {
                let (bx, by) = positions[&b];
                let d = (ax - bx).hypot(ay - by);
                if d == 0.0 {
                    return Err(GeometryError::CoincidentCells { a, b });
                }
                nearest_distance = nearest_distance.min(d);
                distances.push((a, b, d));
            }
        }

        let threshold = NEIGHBOR_SCALE * nearest_distance;
        let mut neighbors: HashMap<CellId, Vec<CellId>> =
            order.iter().map(|&id| (id, Vec::new())).collect();
        let mut pairs = HashSet::new();
        for (a, b, d) in distances {
            if d < threshold {
                neighbors.entry(a).or_default().push(b);
                neighbors.entry(b).or_default().push(a);
                pairs.insert((a, b));
            }
        }
        for list in neighbors.values_mut() {
            list.sort_unstable();
        }

        log::debug!(
            "geometry: {} cells, nearest-neighbor distance {:.3} mm, threshold {:.3} mm, {} neighbor pairs",
            order.len(),
            nearest_distance,
            threshold,
            pairs.len()
        );

        Ok(Self {
            positions,
            neighbors,
            pairs,
            nearest_distance,
            threshold,
        })
    }

    /// Returns the neighbors of `id`, sorted. Unknown identities have none.
    #[must_use]
    pub fn neighbors_of(&self, id: CellId) -> &[CellId] {
        self.neighbors.get(&id).map_or(&[][..], Vec::as_slice)
    }

    /// Returns true if `a` and `b` are adjacent. Symmetric; a cell is not
    /// its own neighbor.
    #[must_use]
    pub fn is_neighbor(&self, a: CellId, b: CellId) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.pairs.contains(&key)
    }

    /// Returns the transverse position of `id`.
    #[must_use]
    pub fn position(&self, id: CellId) -> Option<(f64, f64)> {
        self.positions.get(&id).copied()
    }

    /// Returns true if `id` is part of the layout.
    #[must_use]
    pub fn contains(&self, id: CellId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Smallest center-to-center spacing (mm).
    #[must_use]
    pub fn nearest_neighbor_distance(&self) -> f64 {
        self.nearest_distance
    }

    /// Adjacency cut (mm): [`NEIGHBOR_SCALE`] times the spacing.
    #[must_use]
    pub fn neighbor_threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of cells in the layout.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false for a successfully built context.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of unordered neighbor pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Iterates over all cell identities in ascending order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        let mut ids: Vec<CellId> = self.positions.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
    }
}
