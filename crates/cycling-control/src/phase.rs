//! Phase clock: which part of the pulse cycle a time falls in.
//!
//! Each phase occupies the half-open interval `[start, start + duration)`,
//! so a boundary instant belongs to the phase that begins there. Times at
//! or after the end of the last defined cycle keep repeating the cycle
//! pattern; the clock itself has no upper bound.

use cycling_types::cycle::{CycleGeometry, Phase};

/// Index of the cycle containing `t` (0-based, unbounded).
pub fn cycle_index(t: f64, geometry: &CycleGeometry) -> f64 {
    let n = (t / geometry.cycle_length()).floor();
    // the quotient can round across a cycle start
    if geometry.phase_start(n, Phase::RampUp) > t {
        n - 1.0
    } else if geometry.phase_start(n + 1.0, Phase::RampUp) <= t {
        n + 1.0
    } else {
        n
    }
}

/// Classify `t` into exactly one phase: the last phase of its cycle that
/// starts at or before `t`.
pub fn classify(t: f64, geometry: &CycleGeometry) -> Phase {
    let cycle = cycle_index(t, geometry);
    Phase::ALL
        .into_iter()
        .rev()
        .find(|&phase| geometry.phase_start(cycle, phase) <= t)
        .unwrap_or(Phase::Rest)
}

/// Whether `t` lies in `phase`.
pub fn during(phase: Phase, t: f64, geometry: &CycleGeometry) -> bool {
    classify(t, geometry) == phase
}

/// Stateless clock bound to one geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseClock {
    geometry: CycleGeometry,
}

impl PhaseClock {
    pub fn new(geometry: CycleGeometry) -> Self {
        PhaseClock { geometry }
    }

    pub fn geometry(&self) -> &CycleGeometry {
        &self.geometry
    }

    pub fn classify(&self, t: f64) -> Phase {
        classify(t, &self.geometry)
    }

    pub fn during(&self, phase: Phase, t: f64) -> bool {
        during(phase, t, &self.geometry)
    }

    pub fn cycle_index(&self, t: f64) -> f64 {
        cycle_index(t, &self.geometry)
    }

    /// Whether `t` is still inside the defined cycles.
    pub fn within_schedule(&self, t: f64) -> bool {
        t >= 0.0 && t < self.geometry.final_time()
    }
}
