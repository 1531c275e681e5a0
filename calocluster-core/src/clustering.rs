//! Clustering configuration, statistics and state traits.

use crate::error::ConfigError;
use crate::layers::LAYER_MAX;
use crate::moments::DEFAULT_MIN_TP_ENERGY;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the shower clustering engine.
///
/// Field names follow the options recognized by the trigger configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClusteringConfig {
    /// A hit must exceed this energy (MeV) to seed a 2D cluster.
    pub seed_thresh: f64,
    /// A hit must exceed this energy (MeV) to be absorbed during growth.
    pub neighb_thresh: f64,
    /// Number of growth passes per layer.
    pub n_neighbors: usize,
    /// Share contested hits between clusters in proportion to their energy.
    ///
    /// When false, every contending cluster receives the full energy of a
    /// contested hit, so energy is double-counted across clusters.
    pub split_energy: bool,
    /// Minimum depth (chained layers) for a 3D cluster to be kept.
    pub depth_good: usize,
    /// Energy floor (MeV) of the log weighting.
    pub min_tp_energy: f64,
    /// Project all layers onto one before clustering. Not supported.
    pub use_towers: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            seed_thresh: 0.0,
            neighb_thresh: 0.0,
            n_neighbors: 1,
            split_energy: true,
            depth_good: 5,
            min_tp_energy: DEFAULT_MIN_TP_ENERGY,
            use_towers: false,
        }
    }
}

impl ClusteringConfig {
    /// Creates a new clustering configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the seed threshold.
    #[must_use]
    pub fn with_seed_thresh(mut self, thresh: f64) -> Self {
        self.seed_thresh = thresh;
        self
    }

    /// Sets the neighbor threshold.
    #[must_use]
    pub fn with_neighb_thresh(mut self, thresh: f64) -> Self {
        self.neighb_thresh = thresh;
        self
    }

    /// Sets the number of growth passes.
    #[must_use]
    pub fn with_n_neighbors(mut self, passes: usize) -> Self {
        self.n_neighbors = passes;
        self
    }

    /// Enables or disables energy splitting.
    #[must_use]
    pub fn with_split_energy(mut self, split: bool) -> Self {
        self.split_energy = split;
        self
    }

    /// Sets the minimum 3D depth.
    #[must_use]
    pub fn with_depth_good(mut self, depth: usize) -> Self {
        self.depth_good = depth;
        self
    }

    /// Sets the log-weight energy floor.
    #[must_use]
    pub fn with_min_tp_energy(mut self, floor: f64) -> Self {
        self.min_tp_energy = floor;
        self
    }

    /// Checks the configuration before it is handed to the engine.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for non-finite thresholds, a non-positive
    /// energy floor, an unreachable `depth_good` or `use_towers = true`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.seed_thresh.is_finite() {
            return Err(ConfigError::NonFiniteThreshold {
                name: "seed_thresh",
                value: self.seed_thresh,
            });
        }
        if !self.neighb_thresh.is_finite() {
            return Err(ConfigError::NonFiniteThreshold {
                name: "neighb_thresh",
                value: self.neighb_thresh,
            });
        }
        if !(self.min_tp_energy.is_finite() && self.min_tp_energy > 0.0) {
            return Err(ConfigError::InvalidEnergyFloor(self.min_tp_energy));
        }
        if self.depth_good > LAYER_MAX {
            return Err(ConfigError::DepthOutOfRange {
                depth: self.depth_good,
                max: LAYER_MAX,
            });
        }
        if self.use_towers {
            return Err(ConfigError::TowersUnsupported);
        }
        Ok(())
    }
}

/// Per-event counters reported alongside the clusters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Hits accepted for clustering.
    pub hits_processed: usize,
    /// Hits dropped because their layer is out of range.
    pub hits_rejected: usize,
    /// Hits that replaced an earlier hit on the same cell and layer.
    pub hits_replaced: usize,
    /// Layers holding at least one hit.
    pub layers_with_hits: usize,
    /// 2D clusters built across all layers.
    pub clusters_2d: usize,
    /// 3D candidates built, kept or not.
    pub candidates_3d: usize,
    /// Candidates discarded for being shallower than `depth_good`.
    pub candidates_discarded: usize,
    /// 3D clusters kept.
    pub clusters_3d: usize,
    /// 2D clusters never claimed by a 3D candidate.
    pub unclaimed_2d: usize,
}

/// Trait for reusable per-stage scratch state.
///
/// Stages keep their buffers between layers and events; `reset` clears
/// contents without giving back capacity.
pub trait ClusteringState {
    /// Clears all per-call data.
    fn reset(&mut self);
}
