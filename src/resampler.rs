//! Fixed-length resampling
//!
//! Fits an interpolating curve through a sequence parameterized over [0, 1]
//! and evaluates it at N evenly spaced positions. Sequences with enough
//! samples get a not-a-knot cubic spline; shorter ones are interpolated
//! piecewise-linearly. Point sequences are fit one coordinate at a time.

use crate::config::{
    AveragingConfig, DEFAULT_SMOOTH_MIN_SAMPLES, DEFAULT_TARGET_LEN, MIN_SMOOTH_SAMPLES,
};
use crate::error::ComputeError;
use crate::types::{CanonicalSequence, Point};

/// Curve family used by an [`Interpolant`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMethod {
    Linear,
    /// Cubic spline with not-a-knot end conditions
    CubicSpline,
}

/// Interpolating curve through (position, value) knots
#[derive(Debug, Clone)]
pub struct Interpolant {
    positions: Vec<f64>,
    values: Vec<f64>,
    /// Second derivative at each knot (cubic only)
    second_derivatives: Option<Vec<f64>>,
}

impl Interpolant {
    /// Fit a curve, choosing the cubic spline when at least
    /// `smooth_min_samples` knots are available
    pub fn fit(
        positions: &[f64],
        values: &[f64],
        smooth_min_samples: usize,
    ) -> Result<Self, ComputeError> {
        if positions.len() >= smooth_min_samples.max(MIN_SMOOTH_SAMPLES) {
            Self::cubic(positions, values)
        } else {
            Self::linear(positions, values)
        }
    }

    /// Piecewise-linear interpolant (at least 2 knots)
    pub fn linear(positions: &[f64], values: &[f64]) -> Result<Self, ComputeError> {
        validate_knots(positions, values, 2)?;
        Ok(Self {
            positions: positions.to_vec(),
            values: values.to_vec(),
            second_derivatives: None,
        })
    }

    /// Not-a-knot cubic spline (at least 4 knots)
    pub fn cubic(positions: &[f64], values: &[f64]) -> Result<Self, ComputeError> {
        validate_knots(positions, values, MIN_SMOOTH_SAMPLES)?;
        let second_derivatives = not_a_knot_second_derivatives(positions, values);
        Ok(Self {
            positions: positions.to_vec(),
            values: values.to_vec(),
            second_derivatives: Some(second_derivatives),
        })
    }

    pub fn method(&self) -> InterpolationMethod {
        if self.second_derivatives.is_some() {
            InterpolationMethod::CubicSpline
        } else {
            InterpolationMethod::Linear
        }
    }

    /// Evaluate the curve at `x`. Outside the knot range the boundary
    /// segment is extended.
    pub fn evaluate(&self, x: f64) -> f64 {
        let x_k = &self.positions;
        let y_k = &self.values;
        let i = segment_index(x_k, x);
        let h = x_k[i + 1] - x_k[i];
        let right = x_k[i + 1] - x;
        let left = x - x_k[i];

        match &self.second_derivatives {
            None => y_k[i] + (y_k[i + 1] - y_k[i]) * (left / h),
            Some(m) => {
                m[i] * right.powi(3) / (6.0 * h)
                    + m[i + 1] * left.powi(3) / (6.0 * h)
                    + (y_k[i] / h - m[i] * h / 6.0) * right
                    + (y_k[i + 1] / h - m[i + 1] * h / 6.0) * left
            }
        }
    }

    pub fn evaluate_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

/// Resampler producing fixed-length sequences
#[derive(Debug, Clone)]
pub struct Resampler {
    target_len: usize,
    smooth_min_samples: usize,
}

impl Default for Resampler {
    fn default() -> Self {
        Self {
            target_len: DEFAULT_TARGET_LEN,
            smooth_min_samples: DEFAULT_SMOOTH_MIN_SAMPLES,
        }
    }
}

impl Resampler {
    /// Create a resampler from a validated config
    pub fn new(config: &AveragingConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            target_len: config.target_len,
            smooth_min_samples: config.smooth_min_samples,
        })
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    pub fn smooth_min_samples(&self) -> usize {
        self.smooth_min_samples
    }

    /// Resample a canonical sequence to exactly `target_len` samples.
    ///
    /// Empty input yields empty output; a single sample is repeated.
    pub fn resample(
        &self,
        sequence: &CanonicalSequence,
    ) -> Result<CanonicalSequence, ComputeError> {
        match sequence {
            CanonicalSequence::Scalars(values) => {
                self.resample_values(values).map(CanonicalSequence::Scalars)
            }
            CanonicalSequence::Points(points) => {
                let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
                let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
                let new_xs = self.resample_values(&xs)?;
                let new_ys = self.resample_values(&ys)?;
                Ok(CanonicalSequence::Points(
                    new_xs
                        .into_iter()
                        .zip(new_ys)
                        .map(|(x, y)| Point::new(x, y))
                        .collect(),
                ))
            }
        }
    }

    /// Resample one coordinate track
    pub fn resample_values(&self, values: &[f64]) -> Result<Vec<f64>, ComputeError> {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ComputeError::ResamplingError(format!(
                "non-finite value {} at sample {}",
                values[index], index
            )));
        }

        match values.len() {
            0 => Ok(Vec::new()),
            1 => Ok(vec![values[0]; self.target_len]),
            len => {
                let positions = evenly_spaced(len);
                let interpolant = Interpolant::fit(&positions, values, self.smooth_min_samples)?;
                Ok(interpolant.evaluate_all(&evenly_spaced(self.target_len)))
            }
        }
    }
}

/// `count` evenly spaced positions covering [0, 1] inclusive
pub fn evenly_spaced(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let last = (count - 1) as f64;
            (0..count).map(|i| i as f64 / last).collect()
        }
    }
}

fn validate_knots(positions: &[f64], values: &[f64], min_knots: usize) -> Result<(), ComputeError> {
    if positions.len() != values.len() {
        return Err(ComputeError::ResamplingError(format!(
            "{} positions for {} values",
            positions.len(),
            values.len()
        )));
    }
    if positions.len() < min_knots {
        return Err(ComputeError::ResamplingError(format!(
            "need at least {} knots, got {}",
            min_knots,
            positions.len()
        )));
    }
    if positions.iter().chain(values).any(|v| !v.is_finite()) {
        return Err(ComputeError::ResamplingError(
            "knots contain non-finite values".to_string(),
        ));
    }
    if let Some(i) = positions.windows(2).position(|w| w[1] <= w[0]) {
        return Err(ComputeError::ResamplingError(format!(
            "positions not strictly increasing at knot {}",
            i + 1
        )));
    }
    Ok(())
}

/// Index of the segment [x_i, x_{i+1}] used to evaluate `x`
fn segment_index(positions: &[f64], x: f64) -> usize {
    let upper = positions.partition_point(|&p| p <= x);
    upper.saturating_sub(1).min(positions.len() - 2)
}

/// Solve for knot second derivatives of a not-a-knot cubic spline.
///
/// The two not-a-knot conditions (continuous third derivative at the second
/// and second-to-last knots) are folded into the first and last interior
/// rows, leaving a tridiagonal system in M_1..M_{n-2}. Requires n >= 4.
fn not_a_knot_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    let m = n - 2;
    let mut sub = vec![0.0; m];
    let mut diag = vec![0.0; m];
    let mut sup = vec![0.0; m];
    let mut rhs = vec![0.0; m];
    for k in 0..m {
        let i = k + 1;
        sub[k] = h[i - 1];
        diag[k] = 2.0 * (h[i - 1] + h[i]);
        sup[k] = h[i];
        rhs[k] = 6.0 * (slope[i] - slope[i - 1]);
    }

    let (h0, h1) = (h[0], h[1]);
    sub[0] = 0.0;
    diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
    sup[0] = (h1 * h1 - h0 * h0) / h1;

    let (a, b) = (h[n - 3], h[n - 2]);
    sub[m - 1] = (a * a - b * b) / a;
    diag[m - 1] = (a + b) * (2.0 * a + b) / a;
    sup[m - 1] = 0.0;

    // Thomas algorithm
    for k in 1..m {
        let w = sub[k] / diag[k - 1];
        diag[k] -= w * sup[k - 1];
        rhs[k] -= w * rhs[k - 1];
    }
    let mut inner = vec![0.0; m];
    inner[m - 1] = rhs[m - 1] / diag[m - 1];
    for k in (0..m - 1).rev() {
        inner[k] = (rhs[k] - sup[k] * inner[k + 1]) / diag[k];
    }

    let first = ((h0 + h1) * inner[0] - h0 * inner[1]) / h1;
    let last = ((a + b) * inner[m - 1] - b * inner[m - 2]) / a;

    let mut second_derivatives = Vec::with_capacity(n);
    second_derivatives.push(first);
    second_derivatives.extend(inner);
    second_derivatives.push(last);
    second_derivatives
}
