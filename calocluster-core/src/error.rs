//! Error types for calocluster-core.

use crate::CellId;
use thiserror::Error;

/// Result type alias for calocluster operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for calocluster operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The cell layout cannot produce an adjacency graph.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Invalid clustering configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while building the run-scoped cell geometry.
///
/// All of these are fatal for the run: without a nearest-neighbor spacing
/// there is no adjacency relation to cluster on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Fewer than two cells, so no spacing can be measured.
    #[error("cannot determine nearest-neighbor distance from {cells} cell(s)")]
    TooFewCells { cells: usize },

    /// The same identity was supplied twice.
    #[error("duplicate cell identity {0}")]
    DuplicateCell(CellId),

    /// Two distinct cells share a position.
    #[error("cells {a} and {b} are at the same position")]
    CoincidentCells { a: CellId, b: CellId },

    /// A cell position is NaN or infinite.
    #[error("cell {0} has a non-finite position")]
    NonFinitePosition(CellId),
}

/// Errors raised by [`ClusteringConfig::validate`](crate::ClusteringConfig::validate).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// An energy threshold is NaN or infinite.
    #[error("threshold {name} must be finite, got {value}")]
    NonFiniteThreshold { name: &'static str, value: f64 },

    /// The log-weight energy floor must be positive and finite.
    #[error("min_tp_energy must be positive and finite, got {0}")]
    InvalidEnergyFloor(f64),

    /// No chain can ever be this deep.
    #[error("depth_good {depth} exceeds the number of layers ({max})")]
    DepthOutOfRange { depth: usize, max: usize },

    /// Tower (z-projected) clustering is not provided by this engine.
    #[error("tower clustering (use_towers) is not supported")]
    TowersUnsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::from(GeometryError::TooFewCells { cells: 1 });
        assert_eq!(
            err.to_string(),
            "geometry error: cannot determine nearest-neighbor distance from 1 cell(s)"
        );

        let err = Error::from(ConfigError::DepthOutOfRange { depth: 40, max: 35 });
        assert!(err.to_string().contains("depth_good 40"));
    }
}
