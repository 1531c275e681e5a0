//! Readout cell identities.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of one readout cell within a layer.
///
/// Layers share a congruent module layout, so the same identity names the
/// cell at the same transverse position in every layer. The layer itself
/// is carried by the [`Hit`](crate::Hit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellId {
    /// Module within the layer.
    pub module: u32,
    /// Cell within the module.
    pub cell: u32,
}

impl CellId {
    /// Creates a new cell identity.
    #[inline]
    #[must_use]
    pub fn new(module: u32, cell: u32) -> Self {
        Self { module, cell }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_ordering() {
        let a = CellId::new(0, 47);
        let b = CellId::new(1, 0);
        assert!(a < b);
        assert!(CellId::new(1, 2) < CellId::new(1, 3));
    }

    #[test]
    fn test_cell_id_display() {
        assert_eq!(CellId::new(3, 12).to_string(), "3:12");
    }
}
