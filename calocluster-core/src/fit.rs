//! Ordinary least-squares straight-line fit.
#![allow(clippy::cast_precision_loss)]

/// Result of fitting `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    /// Standard error of the slope, from the residual variance.
    pub slope_error: f64,
}

impl LinearFit {
    /// Fits a line through `points` given as `(x, y)` pairs.
    ///
    /// Returns `None` with fewer than three points (no residual degree of
    /// freedom) or when all `x` coincide.
    #[must_use]
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        let n = points.len();
        if n < 3 {
            return None;
        }
        let x0 = points[0].0;
        if points.iter().all(|&(x, _)| x == x0) {
            return None;
        }

        let nf = n as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / nf;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / nf;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for &(x, y) in points {
            let dx = x - mean_x;
            sxx += dx * dx;
            sxy += dx * (y - mean_y);
        }
        if sxx <= 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let ssr: f64 = points
            .iter()
            .map(|&(x, y)| {
                let r = y - (intercept + slope * x);
                r * r
            })
            .sum();
        let slope_error = (ssr / (nf - 2.0) / sxx).sqrt();

        Some(Self {
            intercept,
            slope,
            slope_error,
        })
    }
}
