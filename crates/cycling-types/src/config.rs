// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cycle::{CycleGeometry, Phase};
use crate::error::{CyclingError, CyclingResult};

/// Top-level wall-loading scenario.
/// Units: seconds, particles/(m²·s), W/m², eV, m²/s, m.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub geometry: CycleGeometry,
    /// Overrides the end of the run; defaults to the end of the last cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_time: Option<f64>,
    pub stepsize: StepsizeConfig,
    pub implantation: ImplantationConfig,
    /// Optional cyclic heat flux on the temperature problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_flux: Option<FluxConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepsizeConfig {
    pub initial_value: f64,
    #[serde(default = "default_change_ratio")]
    pub change_ratio: f64,
    #[serde(default = "default_dt_min")]
    pub dt_min: f64,
    /// Maximum step per phase. Phases absent from the map are uncapped.
    #[serde(default)]
    pub max_per_phase: BTreeMap<Phase, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopConfig>,
    /// Force the stepping to land on every phase boundary.
    #[serde(default)]
    pub use_phase_milestones: bool,
}

/// Late-run cap: from `t_stop` on, steps never exceed `stepsize_stop_max`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StopConfig {
    pub t_stop: f64,
    pub stepsize_stop_max: f64,
}

fn default_change_ratio() -> f64 {
    1.1
}
fn default_dt_min() -> f64 {
    0.1
}

/// Incident particle flux, either constant or one value per phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FluxConfig {
    Constant { value: f64 },
    Cyclic { pattern: Vec<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplantationConfig {
    pub flux: FluxConfig,
    /// Implantation depth [m].
    #[serde(rename = "R_p")]
    pub r_p: f64,
    /// Diffusivity pre-factor [m²/s].
    #[serde(rename = "D_0")]
    pub d_0: f64,
    /// Diffusion activation energy [eV].
    #[serde(rename = "E_D")]
    pub e_d: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recombination: Option<RecombinationConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecombinationConfig {
    /// Recombination pre-factor [m⁴/s].
    #[serde(rename = "Kr_0")]
    pub kr_0: f64,
    /// Recombination activation energy [eV].
    #[serde(rename = "E_Kr")]
    pub e_kr: f64,
}

fn require_positive(what: &str, value: f64) -> CyclingResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CyclingError::ConfigError(format!(
            "{what} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

impl FluxConfig {
    fn validate(&self, what: &str) -> CyclingResult<()> {
        match self {
            FluxConfig::Constant { value } => {
                if !value.is_finite() {
                    return Err(CyclingError::ConfigError(format!(
                        "{what} constant flux must be finite, got {value}"
                    )));
                }
            }
            FluxConfig::Cyclic { pattern } => {
                if pattern.len() != 4 || pattern.iter().any(|v| !v.is_finite()) {
                    return Err(CyclingError::InvalidPattern { len: pattern.len() });
                }
            }
        }
        Ok(())
    }
}

impl ScenarioConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: &str) -> CyclingResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> CyclingResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> CyclingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// End of the run.
    pub fn final_time(&self) -> f64 {
        self.final_time.unwrap_or_else(|| self.geometry.final_time())
    }

    /// Check every value the controller and synthesizer rely on.
    pub fn validate(&self) -> CyclingResult<()> {
        if let Some(t) = self.final_time {
            require_positive("final_time", t)?;
        }

        let s = &self.stepsize;
        require_positive("stepsize dt_min", s.dt_min)?;
        if !s.change_ratio.is_finite() || s.change_ratio <= 1.0 {
            return Err(CyclingError::ConfigError(format!(
                "stepsize change_ratio must be finite and > 1, got {}",
                s.change_ratio
            )));
        }
        if !s.initial_value.is_finite() || s.initial_value < s.dt_min {
            return Err(CyclingError::ConfigError(format!(
                "stepsize initial_value {} must be finite and >= dt_min {}",
                s.initial_value, s.dt_min
            )));
        }
        for (phase, cap) in &s.max_per_phase {
            require_positive(&format!("stepsize cap for {phase}"), *cap)?;
        }
        if let Some(stop) = &s.stop {
            if !stop.t_stop.is_finite() || stop.t_stop < 0.0 {
                return Err(CyclingError::ConfigError(format!(
                    "stepsize t_stop must be finite and >= 0, got {}",
                    stop.t_stop
                )));
            }
            require_positive("stepsize_stop_max", stop.stepsize_stop_max)?;
        }

        let imp = &self.implantation;
        imp.flux.validate("implantation")?;
        if let FluxConfig::Constant { value } = imp.flux {
            if value < 0.0 {
                return Err(CyclingError::InvalidWaveform { time: 0.0, value });
            }
        }
        require_positive("implantation R_p", imp.r_p)?;
        require_positive("implantation D_0", imp.d_0)?;
        if !imp.e_d.is_finite() {
            return Err(CyclingError::ConfigError(format!(
                "implantation E_D must be finite, got {}",
                imp.e_d
            )));
        }
        if let Some(rec) = &imp.recombination {
            require_positive("recombination Kr_0", rec.kr_0)?;
            if !rec.e_kr.is_finite() {
                return Err(CyclingError::ConfigError(format!(
                    "recombination E_Kr must be finite, got {}",
                    rec.e_kr
                )));
            }
        }

        if let Some(heat) = &self.heat_flux {
            heat.validate("heat")?;
        }
        Ok(())
    }

    /// 20 ITER-like pulses: 100 s ramp-up, 400 s flat-top, 100 s ramp-down,
    /// 1000 s dwell, 5e21 D/(m²·s) and 5 MW/m² on tungsten.
    pub fn iter_like_cycling() -> Self {
        let geometry = CycleGeometry::new(100.0, 400.0, 100.0, 1000.0, 20)
            .expect("preset cycle durations must be valid");
        let part_flux = 5e21;
        let heat_flux = 5e6;
        ScenarioConfig {
            name: "ITER-like-cycling".to_string(),
            geometry,
            final_time: None,
            stepsize: StepsizeConfig {
                initial_value: 0.1,
                change_ratio: 1.1,
                dt_min: 0.1,
                max_per_phase: BTreeMap::from([
                    (Phase::RampUp, 5.0),
                    (Phase::Plateau, 20.0),
                    (Phase::RampDown, 5.0),
                    (Phase::Rest, 50.0),
                ]),
                stop: None,
                use_phase_milestones: false,
            },
            implantation: ImplantationConfig {
                flux: FluxConfig::Cyclic {
                    pattern: vec![0.0, part_flux, part_flux, 0.0],
                },
                r_p: 9.52e-10,
                d_0: 1.9e-7,
                e_d: 0.2,
                recombination: None,
            },
            heat_flux: Some(FluxConfig::Cyclic {
                pattern: vec![0.0, heat_flux, heat_flux, 0.0],
            }),
        }
    }

    /// Steady exposure at 1.61e22 D/(m²·s) and 10 MW/m² for the cumulative
    /// burn time of 30 pulses (dwell excluded), with no phase caps.
    pub fn continuous_exposure() -> Self {
        let geometry = CycleGeometry::new(100.0, 400.0, 100.0, 1000.0, 30)
            .expect("preset cycle durations must be valid");
        ScenarioConfig {
            name: "continuous".to_string(),
            geometry,
            final_time: Some(30.0 * (100.0 + 400.0 + 100.0)),
            stepsize: StepsizeConfig {
                initial_value: 1.0,
                change_ratio: 1.1,
                dt_min: 0.1,
                max_per_phase: BTreeMap::new(),
                stop: None,
                use_phase_milestones: false,
            },
            implantation: ImplantationConfig {
                flux: FluxConfig::Constant { value: 1.61e22 },
                r_p: 9.52e-10,
                d_0: 1.9e-7,
                e_d: 0.2,
                recombination: None,
            },
            heat_flux: Some(FluxConfig::Constant { value: 10e6 }),
        }
    }
}
