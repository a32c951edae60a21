// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Adaptive Step Size
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Phase-aware adaptive step-size controller.
//!
//! Each solver attempt reports its iteration count and whether it
//! converged. The step is shrunk on failure, then grown or shrunk again
//! depending on how cheap the solve was, and finally capped by the limit
//! of the phase the attempt time falls in. Small caps on the ramps keep
//! the linear-interpolation error of the driving signal bounded.

use std::collections::BTreeMap;

use cycling_types::config::{ScenarioConfig, StopConfig};
use cycling_types::cycle::{CycleGeometry, Phase};
use cycling_types::error::{CyclingError, CyclingResult};
use serde::{Deserialize, Serialize};

use crate::phase::classify;

/// Solves needing fewer Newton iterations than this let the step grow.
pub const CHEAP_ITERATIONS: usize = 5;

/// Relative tolerance when deciding that `t` already sits on a milestone.
const MILESTONE_RTOL: f64 = 1e-9;

/// Maximum step size per phase. Absent phases are uncapped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepLimits {
    caps: BTreeMap<Phase, f64>,
}

impl StepLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(caps: BTreeMap<Phase, f64>) -> CyclingResult<Self> {
        caps.into_iter()
            .try_fold(Self::new(), |limits, (phase, cap)| limits.with(phase, cap))
    }

    /// Add or replace the cap of one phase.
    pub fn with(mut self, phase: Phase, cap: f64) -> CyclingResult<Self> {
        if !cap.is_finite() || cap <= 0.0 {
            return Err(CyclingError::ConfigError(format!(
                "step cap for {phase} must be finite and > 0, got {cap}"
            )));
        }
        self.caps.insert(phase, cap);
        Ok(self)
    }

    pub fn cap(&self, phase: Phase) -> Option<f64> {
        self.caps.get(&phase).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }
}

/// Current step size and its adaptation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    value: f64,
    change_ratio: f64,
    dt_min: f64,
}

impl StepState {
    pub fn new(value: f64, change_ratio: f64, dt_min: f64) -> CyclingResult<Self> {
        if !dt_min.is_finite() || dt_min <= 0.0 {
            return Err(CyclingError::ConfigError(format!(
                "dt_min must be finite and > 0, got {dt_min}"
            )));
        }
        if !change_ratio.is_finite() || change_ratio <= 1.0 {
            return Err(CyclingError::ConfigError(format!(
                "change_ratio must be finite and > 1, got {change_ratio}"
            )));
        }
        if !value.is_finite() || value < dt_min {
            return Err(CyclingError::ConfigError(format!(
                "initial step {value} must be finite and >= dt_min {dt_min}"
            )));
        }
        Ok(StepState {
            value,
            change_ratio,
            dt_min,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn change_ratio(&self) -> f64 {
        self.change_ratio
    }

    pub fn dt_min(&self) -> f64 {
        self.dt_min
    }
}

/// Owns the step size of one simulation run.
///
/// The value only changes through [`AdaptiveStepController::adapt`].
/// Once `adapt` has reported `StepSizeUnderflow` the controller stays
/// exhausted and every further call fails the same way.
#[derive(Debug, Clone)]
pub struct AdaptiveStepController {
    state: StepState,
    geometry: Option<CycleGeometry>,
    limits: StepLimits,
    stop: Option<StopConfig>,
    milestones: Vec<f64>,
    exhausted: bool,
}

impl AdaptiveStepController {
    /// Controller clamped by `limits` according to the phase of `geometry`.
    pub fn new(state: StepState, geometry: CycleGeometry, limits: StepLimits) -> Self {
        AdaptiveStepController {
            state,
            geometry: Some(geometry),
            limits,
            stop: None,
            milestones: Vec::new(),
            exhausted: false,
        }
    }

    /// Convergence-driven adaptation only, without phase caps.
    pub fn unphased(state: StepState) -> Self {
        AdaptiveStepController {
            state,
            geometry: None,
            limits: StepLimits::new(),
            stop: None,
            milestones: Vec::new(),
            exhausted: false,
        }
    }

    /// Build from the step settings of a scenario.
    pub fn from_config(config: &ScenarioConfig) -> CyclingResult<Self> {
        let s = &config.stepsize;
        let state = StepState::new(s.initial_value, s.change_ratio, s.dt_min)?;
        let limits = StepLimits::from_map(s.max_per_phase.clone())?;
        let mut controller = Self::new(state, config.geometry, limits);
        if let Some(stop) = s.stop {
            controller = controller.with_stop(stop.t_stop, stop.stepsize_stop_max)?;
        }
        if s.use_phase_milestones {
            controller = controller.with_phase_milestones();
        }
        Ok(controller)
    }

    /// From `t_stop` on, never step further than `stepsize_stop_max`.
    pub fn with_stop(mut self, t_stop: f64, stepsize_stop_max: f64) -> CyclingResult<Self> {
        if !t_stop.is_finite() || !stepsize_stop_max.is_finite() || stepsize_stop_max <= 0.0 {
            return Err(CyclingError::ConfigError(format!(
                "invalid stop settings: t_stop={t_stop}, stepsize_stop_max={stepsize_stop_max}"
            )));
        }
        self.stop = Some(StopConfig {
            t_stop,
            stepsize_stop_max,
        });
        Ok(self)
    }

    /// Times the stepping must land on exactly.
    pub fn with_milestones(mut self, mut milestones: Vec<f64>) -> CyclingResult<Self> {
        if milestones.iter().any(|m| !m.is_finite()) {
            return Err(CyclingError::ConfigError(
                "milestones must be finite".to_string(),
            ));
        }
        milestones.sort_by(f64::total_cmp);
        milestones.dedup();
        self.milestones = milestones;
        Ok(self)
    }

    /// Add every phase boundary of the geometry as a milestone.
    pub fn with_phase_milestones(mut self) -> Self {
        if let Some(geometry) = &self.geometry {
            self.milestones.extend(geometry.phase_boundaries());
            self.milestones.sort_by(f64::total_cmp);
            self.milestones.dedup();
        }
        self
    }

    /// Current step size.
    pub fn value(&self) -> f64 {
        self.state.value
    }

    pub fn state(&self) -> &StepState {
        &self.state
    }

    pub fn geometry(&self) -> Option<&CycleGeometry> {
        self.geometry.as_ref()
    }

    pub fn limits(&self) -> &StepLimits {
        &self.limits
    }

    pub fn milestones(&self) -> &[f64] {
        &self.milestones
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Phase of `t`, if the controller is phase-aware.
    pub fn phase_at(&self, t: f64) -> Option<Phase> {
        self.geometry.as_ref().map(|g| classify(t, g))
    }

    /// First milestone strictly after `t` (and not within rounding of it).
    pub fn next_milestone(&self, t: f64) -> Option<f64> {
        self.milestones
            .iter()
            .copied()
            .find(|&m| m > t && (m - t).abs() > MILESTONE_RTOL * m.abs().max(t.abs()))
    }

    /// Update the step after one solver attempt that started at `t` and
    /// return it. `t` selects the phase cap, the stop cap and the next
    /// milestone.
    ///
    /// A failed attempt with a cheap iteration count is shrunk and then
    /// grown back in the same call; the two adjustments always compose.
    pub fn adapt(&mut self, t: f64, nb_iterations: usize, converged: bool) -> CyclingResult<f64> {
        self.adapt_across(t, t, nb_iterations, converged)
    }

    /// Like [`adapt`](Self::adapt), for a caller that already knows where
    /// the next step begins. The phase cap is taken at `t_start`, the start
    /// of the attempt just made; the stop cap and milestones are measured
    /// from `t_next`, the start of the step about to be taken.
    pub fn adapt_across(
        &mut self,
        t_start: f64,
        t_next: f64,
        nb_iterations: usize,
        converged: bool,
    ) -> CyclingResult<f64> {
        if self.exhausted {
            return Err(CyclingError::StepSizeUnderflow {
                value: self.state.value,
                dt_min: self.state.dt_min,
            });
        }

        let ratio = self.state.change_ratio;
        if !converged {
            self.state.value /= ratio;
            if self.state.value < self.state.dt_min {
                self.exhausted = true;
                return Err(CyclingError::StepSizeUnderflow {
                    value: self.state.value,
                    dt_min: self.state.dt_min,
                });
            }
        }

        if nb_iterations < CHEAP_ITERATIONS {
            self.state.value *= ratio;
        } else {
            self.state.value /= ratio;
        }

        if let Some(phase) = self.phase_at(t_start) {
            if let Some(cap) = self.limits.cap(phase) {
                if self.state.value > cap {
                    log::trace!(
                        "t={t_start:.4e}: step {:.4e} clamped to {phase} cap {cap:.4e}",
                        self.state.value
                    );
                    self.state.value = cap;
                }
            }
        }

        if let Some(stop) = self.stop {
            if t_next >= stop.t_stop && self.state.value > stop.stepsize_stop_max {
                self.state.value = stop.stepsize_stop_max;
            }
        }

        if let Some(next) = self.next_milestone(t_next) {
            if t_next + self.state.value > next {
                log::trace!("t={t_next:.4e}: step shortened to reach milestone {next:.4e}");
                self.state.value = next - t_next;
            }
        }

        Ok(self.state.value)
    }

    /// Shorten the step to at most `dt`, e.g. to land on the end of a run.
    /// The shortened value is what the next `adapt` starts from.
    pub fn truncate_to(&mut self, dt: f64) {
        if self.state.value > dt {
            self.state.value = dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_cycle() -> CycleGeometry {
        CycleGeometry::new(2.0, 10.0, 3.0, 50.0, 2).unwrap()
    }

    fn controller(value: f64, limits: StepLimits) -> AdaptiveStepController {
        AdaptiveStepController::new(StepState::new(value, 1.1, 0.1).unwrap(), short_cycle(), limits)
    }

    #[test]
    fn test_cheap_converged_step_grows() {
        let mut c = controller(1.0, StepLimits::new());
        let v = c.adapt(40.0, 3, true).unwrap();
        assert!((v - 1.1).abs() < 1e-12, "{v}");
        assert_eq!(v, c.value());
    }

    #[test]
    fn test_expensive_converged_step_shrinks() {
        let mut c = controller(1.0, StepLimits::new());
        let v = c.adapt(40.0, 5, true).unwrap();
        assert!((v - 1.0 / 1.1).abs() < 1e-12, "{v}");
    }

    #[test]
    fn test_growth_pinned_at_phase_cap() {
        let limits = StepLimits::new().with(Phase::Rest, 20.0).unwrap();
        let mut c = controller(1.0, limits);
        let mut previous = c.value();
        let mut pinned = false;
        for _ in 0..100 {
            let v = c.adapt(40.0, 3, true).unwrap();
            if pinned {
                assert_eq!(v, 20.0, "must stay at the cap");
            } else if v == 20.0 {
                pinned = true;
            } else {
                assert!(v > previous, "must grow strictly: {v} <= {previous}");
            }
            previous = v;
        }
        assert!(pinned, "cap never reached");
    }

    #[test]
    fn test_failed_cheap_attempt_is_net_neutral() {
        // shrink for the failure, then grow for the low iteration count
        let mut c = controller(1.0, StepLimits::new());
        let v = c.adapt(40.0, 2, false).unwrap();
        assert!((v - 1.0).abs() < 1e-12, "{v}");
    }

    #[test]
    fn test_failed_expensive_attempt_shrinks_twice() {
        let mut c = controller(1.0, StepLimits::new());
        let v = c.adapt(40.0, 8, false).unwrap();
        assert!((v - 1.0 / (1.1 * 1.1)).abs() < 1e-12, "{v}");
    }

    #[test]
    fn test_underflow_on_first_call() {
        // 0.105 / 1.1 < 0.1, and ceil(ln(1.05)/ln(1.1)) = 1
        let mut c = controller(0.105, StepLimits::new());
        let expected = ((0.105_f64 / 0.1).ln() / 1.1_f64.ln()).ceil() as usize;
        assert_eq!(expected, 1);
        let err = c.adapt(40.0, 0, false).unwrap_err();
        assert!(matches!(err, CyclingError::StepSizeUnderflow { .. }), "{err}");
    }

    #[test]
    fn test_underflow_at_predicted_call() {
        // Two shrinks per expensive failure; the floor is checked after the first.
        let (v0, dt_min, ratio) = (1.0_f64, 0.1_f64, 1.1_f64);
        let shrinks = ((v0 / dt_min).ln() / ratio.ln()).ceil() as usize;
        let predicted_call = (shrinks + 1).div_ceil(2);
        assert_eq!(shrinks, 25);
        assert_eq!(predicted_call, 13);

        let mut c = AdaptiveStepController::unphased(StepState::new(v0, ratio, dt_min).unwrap());
        let mut failed_at = None;
        for call in 1..=100 {
            if let Err(err) = c.adapt(1.0, 10, false) {
                assert!(matches!(err, CyclingError::StepSizeUnderflow { .. }));
                failed_at = Some(call);
                break;
            }
        }
        assert_eq!(failed_at, Some(predicted_call));
        assert!(c.is_exhausted());
    }

    #[test]
    fn test_underflow_is_terminal() {
        let mut c = controller(0.105, StepLimits::new());
        assert!(c.adapt(40.0, 0, false).is_err());
        assert!(c.adapt(40.0, 0, true).is_err(), "no recovery after underflow");
    }

    #[test]
    fn test_failed_cheap_attempts_never_underflow() {
        let mut c = controller(1.0, StepLimits::new());
        for _ in 0..1000 {
            c.adapt(40.0, 0, false).unwrap();
        }
        assert!((c.value() - 1.0).abs() < 1e-9, "{}", c.value());
    }

    #[test]
    fn test_step_landing_on_boundary_keeps_start_phase_cap() {
        let limits = StepLimits::new()
            .with(Phase::RampUp, 1.0)
            .unwrap()
            .with(Phase::Plateau, 5.0)
            .unwrap();

        // the attempt started at t = 1 in the ramp-up and landed on 2.0
        let mut from_ramp = controller(4.0, limits.clone());
        let v = from_ramp.adapt_across(1.0, 2.0, 6, true).unwrap();
        assert_eq!(v, 1.0, "ramp-up cap must bite");

        // an attempt starting at the boundary instant is in the plateau
        let mut from_plateau = controller(4.0, limits);
        let v = from_plateau.adapt(2.0, 6, true).unwrap();
        assert!((v - 4.0 / 1.1).abs() < 1e-12, "plateau cap must not bite: {v}");
    }

    #[test]
    fn test_truncate_only_shortens() {
        let mut c = controller(4.0, StepLimits::new());
        c.truncate_to(10.0);
        assert_eq!(c.value(), 4.0);
        c.truncate_to(0.5);
        assert_eq!(c.value(), 0.5);
        let v = c.adapt(40.0, 10, false).unwrap();
        assert!((v - 0.5 / 1.21).abs() < 1e-12, "{v}");
    }

    #[test]
    fn test_missing_phase_is_uncapped() {
        let limits = StepLimits::new().with(Phase::RampUp, 0.5).unwrap();
        let mut c = controller(100.0, limits);
        let v = c.adapt(40.0, 1, true).unwrap();
        assert!((v - 110.0).abs() < 1e-9, "{v}");
    }

    #[test]
    fn test_unphased_ignores_caps() {
        let mut c = AdaptiveStepController::unphased(StepState::new(10.0, 1.1, 0.1).unwrap());
        assert!(c.phase_at(1.0).is_none());
        let v = c.adapt(1.0, 0, true).unwrap();
        assert!((v - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_cap_applies_after_t_stop() {
        let mut c = controller(10.0, StepLimits::new()).with_stop(100.0, 2.0).unwrap();
        let v = c.adapt(99.0, 0, true).unwrap();
        assert!((v - 11.0).abs() < 1e-9);
        let v = c.adapt(100.0, 0, true).unwrap();
        assert_eq!(v, 2.0);
    }

    #[test]
    fn test_milestone_shortens_step() {
        let mut c = controller(1.0, StepLimits::new()).with_phase_milestones();
        assert_eq!(c.milestones().len(), 9);
        // from t=11.5 the next boundary is 12
        let v = c.adapt(11.5, 0, true).unwrap();
        assert!((v - 0.5).abs() < 1e-12, "{v}");
        // sitting on a boundary targets the following one
        assert_eq!(c.next_milestone(12.0), Some(15.0));
        assert_eq!(c.next_milestone(130.0), None);
    }

    #[test]
    fn test_from_config() {
        let cfg = ScenarioConfig::iter_like_cycling();
        let mut c = AdaptiveStepController::from_config(&cfg).unwrap();
        assert_eq!(c.value(), 0.1);
        assert_eq!(c.limits().cap(Phase::Plateau), Some(20.0));
        assert_eq!(c.phase_at(150.0), Some(Phase::Plateau));
        // ramp-up cap of 5 s
        for _ in 0..100 {
            c.adapt(50.0, 1, true).unwrap();
        }
        assert_eq!(c.value(), 5.0);
    }

    #[test]
    fn test_state_validation() {
        assert!(StepState::new(1.0, 1.0, 0.1).is_err());
        assert!(StepState::new(1.0, 1.1, 0.0).is_err());
        assert!(StepState::new(0.05, 1.1, 0.1).is_err());
        assert!(StepLimits::new().with(Phase::Rest, -1.0).is_err());
    }
}
