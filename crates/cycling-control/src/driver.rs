// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Cycle Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Time loop coupling an external transient solver to the step controller.
//!
//! The solver attempts a step, the controller adapts the step size from
//! the outcome, and the loop either accepts the new time or retries from
//! the old one with the adapted step.

use cycling_types::cycle::Phase;
use cycling_types::error::{CyclingError, CyclingResult};
use serde::{Deserialize, Serialize};

use crate::stepsize::AdaptiveStepController;

/// Default bound on consecutive rejected attempts before the run stalls.
pub const DEFAULT_MAX_REJECTIONS: usize = 50;

/// Convergence report of one solver attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveOutcome {
    pub converged: bool,
    pub iterations: usize,
}

impl SolveOutcome {
    pub fn converged(iterations: usize) -> Self {
        SolveOutcome {
            converged: true,
            iterations,
        }
    }

    pub fn diverged(iterations: usize) -> Self {
        SolveOutcome {
            converged: false,
            iterations,
        }
    }
}

/// The transient solver being driven.
///
/// `solve` advances the solution from `t` to `t + dt`. On a non-converged
/// outcome the implementation must leave its state at `t`. Errors (for
/// example an invalid boundary value) abort the run.
pub trait StepSolver {
    fn solve(&mut self, t: f64, dt: f64) -> CyclingResult<SolveOutcome>;
}

impl<F> StepSolver for F
where
    F: FnMut(f64, f64) -> CyclingResult<SolveOutcome>,
{
    fn solve(&mut self, t: f64, dt: f64) -> CyclingResult<SolveOutcome> {
        self(t, dt)
    }
}

/// One solver attempt as seen by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Time the attempt tried to reach.
    pub time: f64,
    pub dt: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Phase whose cap bounded `dt`: the start phase of the previous
    /// attempt, or the start phase of the run for the first attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

/// Every attempt of a run, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepHistory {
    pub records: Vec<StepRecord>,
}

impl StepHistory {
    pub fn accepted(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(|r| r.converged)
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted().count()
    }

    pub fn rejected_count(&self) -> usize {
        self.records.len() - self.accepted_count()
    }

    /// Time reached by the last accepted step.
    pub fn final_time(&self) -> Option<f64> {
        self.accepted().last().map(|r| r.time)
    }

    /// Largest accepted step taken in `phase`.
    pub fn max_dt_in(&self, phase: Phase) -> Option<f64> {
        self.accepted()
            .filter(|r| r.phase == Some(phase))
            .map(|r| r.dt)
            .fold(None, |acc, dt| Some(acc.map_or(dt, |m: f64| m.max(dt))))
    }
}

/// Drives a [`StepSolver`] from `t_start` to `t_end`.
#[derive(Debug, Clone)]
pub struct CycleDriver {
    controller: AdaptiveStepController,
    max_rejections: usize,
}

impl CycleDriver {
    pub fn new(controller: AdaptiveStepController) -> Self {
        CycleDriver {
            controller,
            max_rejections: DEFAULT_MAX_REJECTIONS,
        }
    }

    pub fn with_max_rejections(mut self, max_rejections: usize) -> Self {
        self.max_rejections = max_rejections.max(1);
        self
    }

    pub fn controller(&self) -> &AdaptiveStepController {
        &self.controller
    }

    pub fn into_controller(self) -> AdaptiveStepController {
        self.controller
    }

    /// Run until `t_end` is reached.
    ///
    /// The step is shortened to land exactly on `t_end`, and the shortened
    /// value is what a rejected final attempt shrinks from. After every
    /// attempt the controller is adapted with the attempt's start time, so
    /// a step that lands on a phase boundary is still capped by the phase
    /// it started in. `StepSizeUnderflow` from the controller ends the run.
    pub fn run<S: StepSolver>(
        &mut self,
        solver: &mut S,
        t_start: f64,
        t_end: f64,
    ) -> CyclingResult<StepHistory> {
        if !t_start.is_finite() || !t_end.is_finite() || t_end <= t_start {
            return Err(CyclingError::ConfigError(format!(
                "cycle run requires finite t_start < t_end, got [{t_start}, {t_end}]"
            )));
        }

        log::info!(
            "cycle run: t = {t_start:.4e} -> {t_end:.4e}, dt0 = {:.3e}",
            self.controller.value()
        );

        let mut history = StepHistory::default();
        let mut t = t_start;
        let mut rejections = 0usize;
        let mut cap_phase = self.controller.phase_at(t_start);

        while t < t_end {
            let remaining = t_end - t;
            self.controller.truncate_to(remaining);
            let dt = self.controller.value();
            let t_attempt = if dt >= remaining { t_end } else { t + dt };

            let outcome = solver.solve(t, dt)?;
            history.records.push(StepRecord {
                time: t_attempt,
                dt,
                iterations: outcome.iterations,
                converged: outcome.converged,
                phase: cap_phase,
            });

            let t_begin = t;
            if outcome.converged {
                t = t_attempt;
                rejections = 0;
                log::debug!(
                    "t = {t:.4e} | dt = {dt:.3e} | iters = {}",
                    outcome.iterations
                );
            } else {
                rejections += 1;
                log::warn!(
                    "attempt to t = {t_attempt:.4e} rejected after {} iterations (dt = {dt:.3e})",
                    outcome.iterations
                );
                if rejections >= self.max_rejections {
                    return Err(CyclingError::SolverStalled {
                        time: t,
                        attempts: rejections,
                    });
                }
            }

            self.controller
                .adapt_across(t_begin, t, outcome.iterations, outcome.converged)?;
            cap_phase = self.controller.phase_at(t_begin);
        }

        log::info!(
            "cycle run finished: {} accepted, {} rejected",
            history.accepted_count(),
            history.rejected_count()
        );
        Ok(history)
    }
}
