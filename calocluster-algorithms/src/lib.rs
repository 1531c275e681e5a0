//! calocluster-algorithms: Shower clustering for calorimeter trigger primitives.
//!
//! This crate provides the clustering stages:
//! - **Adjacency** - run-scoped nearest-neighbor cell graph
//! - **Layer** - seeded 2D region growth with energy splitting
//! - **Linking** - cross-layer chaining of 2D clusters swept out from shower max
//! - **Processing** - per-event driver returning energy-ordered clusters
//!
#![warn(missing_docs)]

mod adjacency;
mod layer;
mod linking;
mod processing;

pub use adjacency::{GeometryContext, NEIGHBOR_SCALE};
pub use layer::{LayerClustering, LayerState};
pub use linking::{
    sweep_order, LinkingOutput, LinkingState, ShowerLinking, SweepPhase, SweepStep,
};
pub use processing::{ClusterOutput, ShowerClustering};

// Re-export core clustering types
pub use calocluster_core::clustering::{ClusteringConfig, ClusteringStatistics};
