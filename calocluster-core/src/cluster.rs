//! Per-layer and cross-layer cluster types.

use crate::fit::LinearFit;
use crate::layers::MIN_FIT_DEPTH;
use crate::{CellId, EnergyDeposit, Hit, Moments};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cluster of hits within one layer, grown around a local energy maximum.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster2d {
    /// Cell of the seed hit.
    pub seed: CellId,
    /// Layer of every hit in the cluster.
    pub layer: usize,
    /// Module of the seed cell.
    pub module: u32,
    /// Contributions in the order they were absorbed, seed first.
    ///
    /// A contribution's energy is the share this cluster received, which
    /// is less than the measured energy when the hit was split.
    pub hits: Vec<Hit>,
    /// Summed contribution energy (MeV).
    pub energy: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub x_rms: f64,
    pub y_rms: f64,
    pub z_rms: f64,
}

impl Cluster2d {
    /// Starts a cluster containing only `seed`.
    #[must_use]
    pub fn from_seed(seed: Hit, min_tp_energy: f64) -> Self {
        let mut cluster = Self {
            seed: seed.cell,
            layer: seed.layer,
            module: seed.cell.module,
            hits: vec![seed],
            energy: 0.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            x_rms: 0.0,
            y_rms: 0.0,
            z_rms: 0.0,
        };
        cluster.refresh(min_tp_energy);
        cluster
    }

    /// Appends a contribution. Aggregates are stale until [`refresh`](Self::refresh).
    pub fn push(&mut self, contribution: Hit) {
        self.hits.push(contribution);
    }

    /// Recomputes energy, centroid and RMS from the contributions.
    pub fn refresh(&mut self, min_tp_energy: f64) {
        let m = Moments::compute(&self.hits, min_tp_energy);
        self.energy = m.energy;
        self.x = m.x;
        self.y = m.y;
        self.z = m.z;
        self.x_rms = m.x_rms;
        self.y_rms = m.y_rms;
        self.z_rms = m.z_rms;
    }

    /// Returns the number of contributions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the cluster holds no contributions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl EnergyDeposit for Cluster2d {
    #[inline]
    fn energy(&self) -> f64 {
        self.energy
    }

    #[inline]
    fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    fn z(&self) -> f64 {
        self.z
    }
}

/// Transverse direction of a 3D cluster: slopes of x(z) and y(z).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DirectionFit {
    pub dxdz: f64,
    pub dxdz_err: f64,
    pub dydz: f64,
    pub dydz_err: f64,
}

impl DirectionFit {
    /// Fits x(z) and y(z) through the member centroids.
    ///
    /// Returns `None` below [`MIN_FIT_DEPTH`] members or when the members
    /// do not span any depth.
    #[must_use]
    pub fn from_members(members: &[Cluster2d]) -> Option<Self> {
        if members.len() < MIN_FIT_DEPTH {
            return None;
        }
        let xz: Vec<(f64, f64)> = members.iter().map(|c| (c.z, c.x)).collect();
        let yz: Vec<(f64, f64)> = members.iter().map(|c| (c.z, c.y)).collect();
        let fx = LinearFit::fit(&xz)?;
        let fy = LinearFit::fit(&yz)?;
        Some(Self {
            dxdz: fx.slope,
            dxdz_err: fx.slope_error,
            dydz: fy.slope,
            dydz_err: fy.slope_error,
        })
    }
}

/// A chain of 2D clusters across layers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster3d {
    /// Seed cell of the 2D cluster that started the chain.
    pub seed: CellId,
    /// Layer of that 2D cluster.
    pub seed_layer: usize,
    /// Members ordered by layer.
    pub members: Vec<Cluster2d>,
    pub first_layer: usize,
    pub last_layer: usize,
    /// Summed member energy (MeV).
    pub energy: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub x_rms: f64,
    pub y_rms: f64,
    pub z_rms: f64,
    /// Present when the chain is deep enough to fit.
    pub direction: Option<DirectionFit>,
}

impl Cluster3d {
    /// Finalizes a chain given in linking order (seed member first).
    ///
    /// Orders members by layer, then computes moments over member
    /// centroids and the direction fit. Returns `None` for an empty chain.
    #[must_use]
    pub fn from_chain(mut members: Vec<Cluster2d>, min_tp_energy: f64) -> Option<Self> {
        let head = members.first()?;
        let seed = head.seed;
        let seed_layer = head.layer;
        members.sort_by_key(|c| c.layer);

        let m = Moments::compute(&members, min_tp_energy);
        let direction = DirectionFit::from_members(&members);
        let first_layer = members.first().map_or(seed_layer, |c| c.layer);
        let last_layer = members.last().map_or(seed_layer, |c| c.layer);

        Some(Self {
            seed,
            seed_layer,
            members,
            first_layer,
            last_layer,
            energy: m.energy,
            x: m.x,
            y: m.y,
            z: m.z,
            x_rms: m.x_rms,
            y_rms: m.y_rms,
            z_rms: m.z_rms,
            direction,
        })
    }

    /// Number of chained layers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.members.len()
    }

    /// Total contributions over all members.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.members.iter().map(Cluster2d::len).sum()
    }
}

impl EnergyDeposit for Cluster3d {
    #[inline]
    fn energy(&self) -> f64 {
        self.energy
    }

    #[inline]
    fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    fn z(&self) -> f64 {
        self.z
    }
}

/// Flat cluster summary handed to downstream reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterRecord {
    pub is_2d: bool,
    pub energy: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub x_rms: f64,
    pub y_rms: f64,
    pub z_rms: f64,
    /// Zero for 2D clusters and unfitted 3D clusters.
    pub dxdz: f64,
    pub dxdz_err: f64,
    pub dydz: f64,
    pub dydz_err: f64,
    pub first_layer: usize,
    pub last_layer: usize,
    /// One for 2D clusters.
    pub depth: usize,
    pub n_hits: usize,
}

impl From<&Cluster2d> for ClusterRecord {
    fn from(c: &Cluster2d) -> Self {
        Self {
            is_2d: true,
            energy: c.energy,
            x: c.x,
            y: c.y,
            z: c.z,
            x_rms: c.x_rms,
            y_rms: c.y_rms,
            z_rms: c.z_rms,
            dxdz: 0.0,
            dxdz_err: 0.0,
            dydz: 0.0,
            dydz_err: 0.0,
            first_layer: c.layer,
            last_layer: c.layer,
            depth: 1,
            n_hits: c.len(),
        }
    }
}

impl From<&Cluster3d> for ClusterRecord {
    fn from(c: &Cluster3d) -> Self {
        let dir = c.direction.unwrap_or_default();
        Self {
            is_2d: false,
            energy: c.energy,
            x: c.x,
            y: c.y,
            z: c.z,
            x_rms: c.x_rms,
            y_rms: c.y_rms,
            z_rms: c.z_rms,
            dxdz: dir.dxdz,
            dxdz_err: dir.dxdz_err,
            dydz: dir.dydz,
            dydz_err: dir.dydz_err,
            first_layer: c.first_layer,
            last_layer: c.last_layer,
            depth: c.depth(),
            n_hits: c.hit_count(),
        }
    }
}

impl EnergyDeposit for ClusterRecord {
    #[inline]
    fn energy(&self) -> f64 {
        self.energy
    }

    #[inline]
    fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    fn z(&self) -> f64 {
        self.z
    }
}

/// Sorts by non-increasing energy. Stable, so equal energies keep their order.
pub fn sort_by_energy<T: EnergyDeposit>(items: &mut [T]) {
    items.sort_by(|a, b| b.energy().total_cmp(&a.energy()));
}
