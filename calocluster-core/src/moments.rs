//! Log-energy weighted centroids and widths.
#![allow(clippy::cast_precision_loss)]

use crate::EnergyDeposit;

/// Default floor (MeV) below which a deposit carries no log weight.
pub const DEFAULT_MIN_TP_ENERGY: f64 = 0.5;

/// Log-energy weight of a single deposit: `max(0, ln(energy / floor))`.
///
/// Non-positive energies weigh zero.
#[inline]
#[must_use]
pub fn log_weight(energy: f64, floor: f64) -> f64 {
    let w = (energy / floor).ln();
    if w.is_nan() {
        0.0
    } else {
        w.max(0.0)
    }
}

/// Aggregate energy, weighted centroid and per-axis RMS of a set of deposits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    /// Summed energy (MeV). Unweighted.
    pub energy: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub x_rms: f64,
    pub y_rms: f64,
    pub z_rms: f64,
}

impl Moments {
    /// Computes moments over `deposits` with weights from [`log_weight`].
    ///
    /// When no deposit exceeds `floor` every weight is zero; the centroid
    /// then falls back to equal weights. An empty slice yields all zeros.
    #[must_use]
    pub fn compute<D: EnergyDeposit>(deposits: &[D], floor: f64) -> Self {
        if deposits.is_empty() {
            return Self::default();
        }

        let log_weights: Vec<f64> = deposits
            .iter()
            .map(|d| log_weight(d.energy(), floor))
            .collect();
        let log_sum: f64 = log_weights.iter().sum();
        let uniform = log_sum <= 0.0;

        let weight = |lw: f64| if uniform { 1.0 } else { lw };

        let mut m = Self::default();
        let mut sum_w = 0.0;
        for (d, &lw) in deposits.iter().zip(&log_weights) {
            let w = weight(lw);
            m.energy += d.energy();
            m.x += d.x() * w;
            m.y += d.y() * w;
            m.z += d.z() * w;
            sum_w += w;
        }
        m.x /= sum_w;
        m.y /= sum_w;
        m.z /= sum_w;

        // Second moments about the centroid; equal to <p²> - <p>² without
        // the cancellation.
        let (mut vx, mut vy, mut vz) = (0.0, 0.0, 0.0);
        for (d, &lw) in deposits.iter().zip(&log_weights) {
            let w = weight(lw);
            vx += (d.x() - m.x).powi(2) * w;
            vy += (d.y() - m.y).powi(2) * w;
            vz += (d.z() - m.z).powi(2) * w;
        }
        m.x_rms = (vx / sum_w).max(0.0).sqrt();
        m.y_rms = (vy / sum_w).max(0.0).sqrt();
        m.z_rms = (vz / sum_w).max(0.0).sqrt();
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellId, Hit};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn hit(energy: f64, x: f64, y: f64) -> Hit {
        Hit::new(CellId::new(0, 0), 0, energy, x, y, 100.0)
    }

    #[test]
    fn test_log_weight() {
        assert_relative_eq!(log_weight(100.0, 0.5), 200.0_f64.ln());
        assert_eq!(log_weight(0.5, 0.5), 0.0);
        assert_eq!(log_weight(0.2, 0.5), 0.0);
        assert_eq!(log_weight(0.0, 0.5), 0.0);
        assert_eq!(log_weight(-3.0, 0.5), 0.0);
    }

    #[test]
    fn test_single_deposit() {
        let m = Moments::compute(&[hit(100.0, 12.0, -4.0)], 0.5);
        assert_relative_eq!(m.energy, 100.0);
        assert_relative_eq!(m.x, 12.0, epsilon = 1e-12);
        assert_relative_eq!(m.y, -4.0, epsilon = 1e-12);
        assert_relative_eq!(m.z, 100.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.x_rms, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.z_rms, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_weighted_centroid() {
        let hits = [hit(100.0, 0.0, 0.0), hit(50.0, 10.0, 0.0)];
        let m = Moments::compute(&hits, 0.5);

        let wa = 200.0_f64.ln();
        let wb = 100.0_f64.ln();
        let mean = 10.0 * wb / (wa + wb);
        let mean_sq = 100.0 * wb / (wa + wb);

        assert_relative_eq!(m.energy, 150.0);
        assert_relative_eq!(m.x, mean, epsilon = 1e-12);
        assert_relative_eq!(m.x_rms, (mean_sq - mean * mean).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.y_rms, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_below_floor_falls_back_to_uniform() {
        let hits = [hit(0.3, 0.0, 0.0), hit(0.4, 10.0, 0.0)];
        let m = Moments::compute(&hits, 0.5);
        assert_relative_eq!(m.energy, 0.7, epsilon = 1e-12);
        assert_relative_eq!(m.x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(m.x_rms, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty() {
        let m = Moments::compute::<Hit>(&[], 0.5);
        assert_eq!(m, Moments::default());
    }
}
