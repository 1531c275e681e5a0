//! Fixed longitudinal layout of the calorimeter.

/// Number of layers; hits at or beyond this index are rejected at ingestion.
pub const LAYER_MAX: usize = 35;

/// Layer where electromagnetic showers typically peak. The cross-layer
/// sweep starts here.
pub const LAYER_SHOWERMAX: usize = 7;

/// First layer allowed to seed a 3D cluster.
pub const LAYER_SEEDMIN: usize = 3;

/// Last layer allowed to seed a 3D cluster.
pub const LAYER_SEEDMAX: usize = 15;

/// Fewest members for which a direction fit is attempted.
pub const MIN_FIT_DEPTH: usize = 4;

/// Returns true if `layer` may hold hits.
#[inline]
#[must_use]
pub fn is_valid_layer(layer: usize) -> bool {
    layer < LAYER_MAX
}

/// Returns true if a 3D cluster may be seeded in `layer`.
#[inline]
#[must_use]
pub fn in_seed_band(layer: usize) -> bool {
    (LAYER_SEEDMIN..=LAYER_SEEDMAX).contains(&layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_bounds() {
        assert!(is_valid_layer(0));
        assert!(is_valid_layer(34));
        assert!(!is_valid_layer(35));
    }

    #[test]
    fn test_seed_band() {
        assert!(!in_seed_band(2));
        assert!(in_seed_band(3));
        assert!(in_seed_band(LAYER_SHOWERMAX));
        assert!(in_seed_band(15));
        assert!(!in_seed_band(16));
    }
}
