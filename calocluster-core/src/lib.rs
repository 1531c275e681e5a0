//! calocluster-core: Core types for calorimeter shower clustering.
//!
//! This crate provides the data model shared by the clustering stages:
//! cell identities, calibrated hits, per-layer and cross-layer clusters,
//! log-energy weighted moments and the straight-line direction fit.
//!

pub mod cell;
pub mod cluster;
pub mod clustering;
pub mod error;
pub mod fit;
pub mod hit;
pub mod layers;
pub mod moments;

pub use cell::CellId;
pub use cluster::{Cluster2d, Cluster3d, ClusterRecord, DirectionFit};
pub use clustering::{ClusteringConfig, ClusteringState, ClusteringStatistics};
pub use error::{ConfigError, Error, GeometryError, Result};
pub use fit::LinearFit;
pub use hit::{EnergyDeposit, Hit};
pub use moments::Moments;
