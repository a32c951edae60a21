// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Implantation Boundary
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Surface concentration of implanted hydrogen isotopes.
//!
//! Particles stopped at depth `R_p` diffuse back to the surface; at
//! steady state the mobile concentration there is `phi * R_p / D(T)`.
//! When molecular recombination limits the release, the term
//! `sqrt(phi / Kr(T))` is added.

use cycling_types::config::{ImplantationConfig, RecombinationConfig, ScenarioConfig};
use cycling_types::constants::K_B_EV;
use cycling_types::error::{CyclingError, CyclingResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::flux::FluxSource;

/// Arrhenius law `pre_factor * exp(-activation / (k_B T))`.
fn arrhenius(pre_factor: f64, activation_ev: f64, temperature: f64) -> f64 {
    pre_factor * (-activation_ev / (K_B_EV * temperature)).exp()
}

/// Surface recombination coefficient parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recombination {
    /// Pre-factor [m⁴/s].
    pub kr_0: f64,
    /// Activation energy [eV].
    pub e_kr: f64,
}

impl Recombination {
    /// Coefficients of the second-order recombination measured on the
    /// coolant-facing copper alloy, reused as a preset for the `Kr(T)` term
    /// of the surface concentration. This is a coefficient set only; no
    /// `-Kr c²` flux boundary is modelled.
    pub fn coolant() -> Self {
        Recombination {
            kr_0: 2.9e-14,
            e_kr: 1.92,
        }
    }

    pub fn rate(&self, temperature: f64) -> f64 {
        arrhenius(self.kr_0, self.e_kr, temperature)
    }
}

impl From<RecombinationConfig> for Recombination {
    fn from(c: RecombinationConfig) -> Self {
        Recombination {
            kr_0: c.kr_0,
            e_kr: c.e_kr,
        }
    }
}

/// Material and implantation parameters of one exposed surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryModel {
    /// Diffusivity pre-factor [m²/s].
    pub d_0: f64,
    /// Diffusion activation energy [eV].
    pub e_d: f64,
    /// Implantation depth [m].
    pub r_p: f64,
    pub recombination: Option<Recombination>,
}

/// Deuterium implantation depth in tungsten used by the presets [m].
pub const DEFAULT_IMPLANTATION_DEPTH: f64 = 9.52e-10;

impl BoundaryModel {
    /// Tungsten armour.
    pub fn tungsten() -> Self {
        BoundaryModel {
            d_0: 1.9e-7,
            e_d: 0.2,
            r_p: DEFAULT_IMPLANTATION_DEPTH,
            recombination: None,
        }
    }

    /// Copper interlayer.
    pub fn copper() -> Self {
        BoundaryModel {
            d_0: 6.6e-7,
            e_d: 0.39,
            ..Self::tungsten()
        }
    }

    /// CuCrZr heat sink.
    pub fn cucrzr() -> Self {
        BoundaryModel {
            d_0: 3.9e-7,
            e_d: 0.42,
            ..Self::tungsten()
        }
    }

    pub fn with_implantation_depth(mut self, r_p: f64) -> Self {
        self.r_p = r_p;
        self
    }

    pub fn with_recombination(mut self, recombination: Recombination) -> Self {
        self.recombination = Some(recombination);
        self
    }

    pub fn from_config(config: &ImplantationConfig) -> CyclingResult<Self> {
        let model = BoundaryModel {
            d_0: config.d_0,
            e_d: config.e_d,
            r_p: config.r_p,
            recombination: config.recombination.map(Recombination::from),
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> CyclingResult<()> {
        let positive = [("D_0", self.d_0), ("R_p", self.r_p)];
        for (what, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CyclingError::ConfigError(format!(
                    "{what} must be finite and > 0, got {value}"
                )));
            }
        }
        if !self.e_d.is_finite() {
            return Err(CyclingError::ConfigError(format!(
                "E_D must be finite, got {}",
                self.e_d
            )));
        }
        if let Some(rec) = &self.recombination {
            if !rec.kr_0.is_finite() || rec.kr_0 <= 0.0 || !rec.e_kr.is_finite() {
                return Err(CyclingError::ConfigError(format!(
                    "invalid recombination: Kr_0={}, E_Kr={}",
                    rec.kr_0, rec.e_kr
                )));
            }
        }
        Ok(())
    }

    /// Diffusion coefficient [m²/s] at `temperature` [K].
    pub fn diffusivity(&self, temperature: f64) -> f64 {
        arrhenius(self.d_0, self.e_d, temperature)
    }

    /// Recombination coefficient [m⁴/s], if recombination is modelled.
    pub fn recombination_rate(&self, temperature: f64) -> Option<f64> {
        self.recombination.map(|r| r.rate(temperature))
    }
}

/// Turns the incident flux and the local temperature into the Dirichlet
/// value of the mobile concentration at the exposed surface.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryValueSynthesizer {
    flux: FluxSource,
    model: BoundaryModel,
}

impl BoundaryValueSynthesizer {
    pub fn new(flux: FluxSource, model: BoundaryModel) -> Self {
        BoundaryValueSynthesizer { flux, model }
    }

    /// Particle flux and surface model of a scenario.
    pub fn from_config(config: &ScenarioConfig) -> CyclingResult<Self> {
        let flux = FluxSource::from_config(&config.implantation.flux, config.geometry)?;
        let model = BoundaryModel::from_config(&config.implantation)?;
        Ok(Self::new(flux, model))
    }

    pub fn flux(&self) -> &FluxSource {
        &self.flux
    }

    pub fn model(&self) -> &BoundaryModel {
        &self.model
    }

    /// Surface concentration [m⁻³] at time `t` and temperature [K].
    pub fn value_at(&self, t: f64, temperature: f64) -> CyclingResult<f64> {
        let phi = self.flux.evaluate(t);
        if !phi.is_finite() || phi < 0.0 {
            return Err(CyclingError::InvalidWaveform { time: t, value: phi });
        }
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(CyclingError::InvalidTemperature { temperature });
        }

        let d = self.model.diffusivity(temperature);
        if !d.is_finite() || d == 0.0 {
            return Err(CyclingError::InvalidTemperature { temperature });
        }
        let mut value = phi * self.model.r_p / d;

        if let Some(kr) = self.model.recombination_rate(temperature) {
            if !kr.is_finite() || kr == 0.0 {
                return Err(CyclingError::InvalidTemperature { temperature });
            }
            value += (phi / kr).sqrt();
        }

        if !value.is_finite() {
            return Err(CyclingError::InvalidTemperature { temperature });
        }
        Ok(value)
    }

    /// Evaluate over a nodal temperature field. The first failing node
    /// aborts the whole evaluation.
    pub fn value_on_field(
        &self,
        t: f64,
        temperatures: &Array1<f64>,
    ) -> CyclingResult<Array1<f64>> {
        temperatures
            .iter()
            .map(|&temperature| self.value_at(t, temperature))
            .collect::<CyclingResult<Vec<f64>>>()
            .map(Array1::from)
    }
}
