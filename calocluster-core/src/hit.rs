//! Hit traits and types for calibrated calorimeter data.

use crate::CellId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trait for anything that deposits energy at a point.
///
/// Both raw hits (for per-layer moments) and per-layer clusters (for
/// cross-layer moments) are weighted the same way, so the moment code is
/// written once against this trait.
pub trait EnergyDeposit {
    /// Deposited energy in MeV.
    fn energy(&self) -> f64;

    /// X position in mm.
    fn x(&self) -> f64;

    /// Y position in mm.
    fn y(&self) -> f64;

    /// Z position in mm.
    fn z(&self) -> f64;
}

/// One calibrated trigger-primitive measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit {
    /// Cell that produced the measurement.
    pub cell: CellId,
    /// Layer index, counted from the front face.
    pub layer: usize,
    /// Calibrated energy (MeV).
    pub energy: f64,
    /// Position (mm).
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Hit {
    /// Creates a new hit.
    #[inline]
    #[must_use]
    pub fn new(cell: CellId, layer: usize, energy: f64, x: f64, y: f64, z: f64) -> Self {
        Self {
            cell,
            layer,
            energy,
            x,
            y,
            z,
        }
    }

    /// Returns a copy carrying `energy` instead of the measured value.
    ///
    /// Used for the share of a hit handed to one cluster when its energy
    /// is split between several.
    #[inline]
    #[must_use]
    pub fn with_energy(&self, energy: f64) -> Self {
        Self { energy, ..*self }
    }
}

impl EnergyDeposit for Hit {
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
