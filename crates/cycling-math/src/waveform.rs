// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Cyclic Waveform
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Periodic piecewise-linear driving signal.
//!
//! A 4-value pattern gives the signal level at the start of ramp-up,
//! plateau, ramp-down and rest. The pattern is replicated over every cycle
//! of a [`CycleGeometry`] and closed by one trailing breakpoint at the end
//! of the last rest period holding the last pattern value.

use cycling_types::cycle::CycleGeometry;
use cycling_types::error::{CyclingError, CyclingResult};
use ndarray::Array1;

use crate::interp::LinearTable;

/// Number of pattern values per cycle, one per phase.
pub const PATTERN_LEN: usize = 4;

/// Immutable cyclic waveform. Safe to share across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclicWaveform {
    pattern: [f64; PATTERN_LEN],
    geometry: CycleGeometry,
    table: LinearTable,
}

impl CyclicWaveform {
    /// Build the breakpoint table. Fails with `InvalidPattern` unless
    /// `pattern` holds exactly 4 finite values.
    pub fn build(pattern: &[f64], geometry: CycleGeometry) -> CyclingResult<Self> {
        let pattern: [f64; PATTERN_LEN] = pattern
            .try_into()
            .map_err(|_| CyclingError::InvalidPattern { len: pattern.len() })?;
        if pattern.iter().any(|v| !v.is_finite()) {
            return Err(CyclingError::InvalidPattern { len: PATTERN_LEN });
        }

        let times = geometry.phase_boundaries();
        let mut values = Vec::with_capacity(times.len());
        for _ in 0..geometry.nb_cycles() {
            values.extend_from_slice(&pattern);
        }
        values.push(pattern[PATTERN_LEN - 1]);

        let table = LinearTable::new(times, values, 0.0)?;
        Ok(CyclicWaveform {
            pattern,
            geometry,
            table,
        })
    }

    /// Signal value at time `t`: 0 before the first breakpoint, the last
    /// pattern value from the last breakpoint on.
    pub fn evaluate(&self, t: f64) -> f64 {
        self.table.eval(t)
    }

    pub fn evaluate_many(&self, times: &Array1<f64>) -> Array1<f64> {
        self.table.eval_many(times)
    }

    pub fn pattern(&self) -> &[f64; PATTERN_LEN] {
        &self.pattern
    }

    pub fn geometry(&self) -> &CycleGeometry {
        &self.geometry
    }

    pub fn breakpoints(&self) -> &[f64] {
        self.table.breakpoints()
    }

    pub fn values(&self) -> &[f64] {
        self.table.values()
    }

    /// Smallest and largest value the signal can take, including the
    /// zero fill before the table starts.
    pub fn range(&self) -> (f64, f64) {
        self.pattern
            .iter()
            .fold((0.0_f64, 0.0_f64), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}
