// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Flux Sources
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Incident flux sources and flux boundary conditions.

use cycling_math::waveform::CyclicWaveform;
use cycling_types::config::{FluxConfig, ScenarioConfig};
use cycling_types::cycle::CycleGeometry;
use cycling_types::error::{CyclingError, CyclingResult};

/// Time dependence of an incident flux.
#[derive(Debug, Clone, PartialEq)]
pub enum FluxSource {
    /// Steady exposure.
    Constant(f64),
    /// One level per phase, interpolated over every cycle.
    Cyclic(CyclicWaveform),
}

impl FluxSource {
    pub fn constant(value: f64) -> CyclingResult<Self> {
        if !value.is_finite() {
            return Err(CyclingError::InvalidWaveform { time: 0.0, value });
        }
        Ok(FluxSource::Constant(value))
    }

    pub fn cyclic(pattern: &[f64], geometry: CycleGeometry) -> CyclingResult<Self> {
        Ok(FluxSource::Cyclic(CyclicWaveform::build(pattern, geometry)?))
    }

    pub fn from_config(config: &FluxConfig, geometry: CycleGeometry) -> CyclingResult<Self> {
        match config {
            FluxConfig::Constant { value } => Self::constant(*value),
            FluxConfig::Cyclic { pattern } => Self::cyclic(pattern, geometry),
        }
    }

    pub fn evaluate(&self, t: f64) -> f64 {
        match self {
            FluxSource::Constant(value) => *value,
            FluxSource::Cyclic(waveform) => waveform.evaluate(t),
        }
    }

    pub fn waveform(&self) -> Option<&CyclicWaveform> {
        match self {
            FluxSource::Constant(_) => None,
            FluxSource::Cyclic(waveform) => Some(waveform),
        }
    }
}

/// Neumann flux boundary on an arbitrary field, e.g. the heat flux
/// reaching the plasma-facing surface of the temperature problem.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclicFluxBoundary {
    field: String,
    source: FluxSource,
}

impl CyclicFluxBoundary {
    pub fn new(field: impl Into<String>, source: FluxSource) -> Self {
        CyclicFluxBoundary {
            field: field.into(),
            source,
        }
    }

    /// Heat flux boundary of a scenario, if it defines one.
    pub fn heat_from_config(config: &ScenarioConfig) -> CyclingResult<Option<Self>> {
        config
            .heat_flux
            .as_ref()
            .map(|heat| {
                FluxSource::from_config(heat, config.geometry).map(|s| Self::new("T", s))
            })
            .transpose()
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn source(&self) -> &FluxSource {
        &self.source
    }

    /// Imposed flux at time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        self.source.evaluate(t)
    }
}
