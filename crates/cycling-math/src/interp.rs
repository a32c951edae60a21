//! Piecewise-linear interpolation on a 1-D breakpoint table.
//!
//! Below the first breakpoint the table evaluates to a fill value; at or
//! above the last breakpoint it holds the last value.

use cycling_types::error::{CyclingError, CyclingResult};
use ndarray::Array1;

/// Breakpoint/value table with strictly increasing breakpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTable {
    xs: Vec<f64>,
    ys: Vec<f64>,
    fill_below: f64,
}

impl LinearTable {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, fill_below: f64) -> CyclingResult<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return Err(CyclingError::ConfigError(format!(
                "interpolation table needs matching non-empty columns, got {} breakpoints and {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(CyclingError::ConfigError(
                "interpolation table entries must be finite".to_string(),
            ));
        }
        if let Some(i) = (1..xs.len()).find(|&i| xs[i] <= xs[i - 1]) {
            return Err(CyclingError::ConfigError(format!(
                "breakpoints must be strictly increasing: x[{}]={} <= x[{}]={}",
                i,
                xs[i],
                i - 1,
                xs[i - 1]
            )));
        }
        Ok(LinearTable { xs, ys, fill_below })
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.xs
    }

    pub fn values(&self) -> &[f64] {
        &self.ys
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Interpolated value at `x`. NaN in, NaN out.
    pub fn eval(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let n = self.xs.len();
        if x < self.xs[0] {
            return self.fill_below;
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        // xs[0] <= x < xs[n-1], so 1 <= upper <= n-1
        let upper = self.xs.partition_point(|&b| b <= x);
        let i = upper - 1;
        let (x0, x1) = (self.xs[i], self.xs[upper]);
        let (y0, y1) = (self.ys[i], self.ys[upper]);
        let w = (x - x0) / (x1 - x0);
        y0 + (y1 - y0) * w
    }

    /// Evaluate at every entry of `xs`.
    pub fn eval_many(&self, xs: &Array1<f64>) -> Array1<f64> {
        xs.mapv(|x| self.eval(x))
    }
}
