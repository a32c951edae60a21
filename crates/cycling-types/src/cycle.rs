// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Cycle Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Pulse cycle geometry and the four operational phases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CyclingError, CyclingResult};

/// Operational phase of one plasma pulse cycle, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    RampUp,
    Plateau,
    RampDown,
    Rest,
}

impl Phase {
    /// All phases in the order they occur within a cycle.
    pub const ALL: [Phase; 4] = [Phase::RampUp, Phase::Plateau, Phase::RampDown, Phase::Rest];

    pub fn name(self) -> &'static str {
        match self {
            Phase::RampUp => "rampup",
            Phase::Plateau => "plateau",
            Phase::RampDown => "rampdown",
            Phase::Rest => "rest",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Phase {
    type Err = CyclingError;

    fn from_str(s: &str) -> CyclingResult<Self> {
        Phase::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| CyclingError::ConfigError(format!("unknown phase '{s}'")))
    }
}

/// Durations [s] of the four phases and the number of cycles.
///
/// Immutable once built; every duration is finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeometry", into = "RawGeometry")]
pub struct CycleGeometry {
    rampup: f64,
    plateau: f64,
    rampdown: f64,
    rest: f64,
    nb_cycles: usize,
}

/// Unchecked serde form of [`CycleGeometry`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawGeometry {
    rampup: f64,
    plateau: f64,
    rampdown: f64,
    rest: f64,
    nb_cycles: usize,
}

impl TryFrom<RawGeometry> for CycleGeometry {
    type Error = CyclingError;

    fn try_from(raw: RawGeometry) -> CyclingResult<Self> {
        CycleGeometry::new(raw.rampup, raw.plateau, raw.rampdown, raw.rest, raw.nb_cycles)
    }
}

impl From<CycleGeometry> for RawGeometry {
    fn from(g: CycleGeometry) -> Self {
        RawGeometry {
            rampup: g.rampup,
            plateau: g.plateau,
            rampdown: g.rampdown,
            rest: g.rest,
            nb_cycles: g.nb_cycles,
        }
    }
}

impl CycleGeometry {
    pub fn new(
        rampup: f64,
        plateau: f64,
        rampdown: f64,
        rest: f64,
        nb_cycles: usize,
    ) -> CyclingResult<Self> {
        for (name, value) in [
            ("rampup", rampup),
            ("plateau", plateau),
            ("rampdown", rampdown),
            ("rest", rest),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CyclingError::ConfigError(format!(
                    "cycle {name} duration must be finite and > 0, got {value}"
                )));
            }
        }
        if nb_cycles == 0 {
            return Err(CyclingError::ConfigError(
                "cycle geometry requires nb_cycles >= 1".to_string(),
            ));
        }
        Ok(CycleGeometry {
            rampup,
            plateau,
            rampdown,
            rest,
            nb_cycles,
        })
    }

    pub fn rampup(&self) -> f64 {
        self.rampup
    }

    pub fn plateau(&self) -> f64 {
        self.plateau
    }

    pub fn rampdown(&self) -> f64 {
        self.rampdown
    }

    pub fn rest(&self) -> f64 {
        self.rest
    }

    pub fn nb_cycles(&self) -> usize {
        self.nb_cycles
    }

    pub fn cycle_length(&self) -> f64 {
        self.rampup + self.plateau + self.rampdown + self.rest
    }

    /// End of the last defined cycle.
    pub fn final_time(&self) -> f64 {
        self.nb_cycles as f64 * self.cycle_length()
    }

    /// Duration of `phase` within one cycle.
    pub fn duration(&self, phase: Phase) -> f64 {
        match phase {
            Phase::RampUp => self.rampup,
            Phase::Plateau => self.plateau,
            Phase::RampDown => self.rampdown,
            Phase::Rest => self.rest,
        }
    }

    /// Offset of the start of `phase` from the start of its cycle.
    pub fn offset(&self, phase: Phase) -> f64 {
        match phase {
            Phase::RampUp => 0.0,
            Phase::Plateau => self.rampup,
            Phase::RampDown => self.rampup + self.plateau,
            Phase::Rest => self.rampup + self.plateau + self.rampdown,
        }
    }

    /// Absolute start time of `phase` in cycle `cycle` (0-based). Every
    /// phase boundary in the workspace is computed here so that boundary
    /// times and phase classification round identically.
    pub fn phase_start(&self, cycle: f64, phase: Phase) -> f64 {
        self.offset(phase) + cycle * self.cycle_length()
    }

    /// Start times of every phase of every cycle, followed by the end of the
    /// last rest period: `4 * nb_cycles + 1` strictly increasing entries.
    pub fn phase_boundaries(&self) -> Vec<f64> {
        let mut times = Vec::with_capacity(4 * self.nb_cycles + 1);
        for n in 0..self.nb_cycles {
            for phase in Phase::ALL {
                times.push(self.phase_start(n as f64, phase));
            }
        }
        times.push(self.phase_start(self.nb_cycles as f64, Phase::RampUp));
        times
    }
}
