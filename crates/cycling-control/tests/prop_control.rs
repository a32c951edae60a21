// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Property-Based Tests (proptest) for cycling-control
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for cycling-control using proptest.
//!
//! Covers: phase classification against the boundary table, phase caps
//! after arbitrary feedback sequences, unphased growth, driver coverage.

use cycling_control::driver::{CycleDriver, SolveOutcome};
use cycling_control::phase::PhaseClock;
use cycling_control::stepsize::{AdaptiveStepController, StepLimits, StepState};
use cycling_types::cycle::{CycleGeometry, Phase};
use cycling_types::error::{CyclingError, CyclingResult};
use proptest::prelude::*;

fn geometry_strategy() -> impl Strategy<Value = CycleGeometry> {
    (
        0.5f64..50.0,
        0.5f64..200.0,
        0.5f64..50.0,
        0.5f64..500.0,
        1usize..6,
    )
        .prop_map(|(up, flat, down, rest, n)| {
            CycleGeometry::new(up, flat, down, rest, n).unwrap()
        })
}

fn limits_strategy() -> impl Strategy<Value = StepLimits> {
    (0.2f64..5.0, 0.5f64..20.0, 0.2f64..5.0, 1.0f64..50.0).prop_map(|(up, flat, down, rest)| {
        StepLimits::new()
            .with(Phase::RampUp, up)
            .and_then(|l| l.with(Phase::Plateau, flat))
            .and_then(|l| l.with(Phase::RampDown, down))
            .and_then(|l| l.with(Phase::Rest, rest))
            .unwrap()
    })
}

// ── Phase Clock ──────────────────────────────────────────────────────

proptest! {
    /// Away from the boundaries, the phase of `t` is the one whose
    /// boundary-table segment contains it.
    #[test]
    fn classify_matches_boundary_table(g in geometry_strategy(), frac in 0.0f64..1.0) {
        let boundaries = g.phase_boundaries();
        let t = frac * g.final_time();
        let tol = 1e-9 * g.final_time();
        prop_assume!(boundaries.iter().all(|b| (b - t).abs() > tol));

        let segment = boundaries.partition_point(|&b| b <= t) - 1;
        let clock = PhaseClock::new(g);
        prop_assert_eq!(clock.classify(t), Phase::ALL[segment % 4]);
    }

    /// Every generated boundary belongs to the phase that starts there.
    #[test]
    fn boundaries_start_their_phase(g in geometry_strategy()) {
        let clock = PhaseClock::new(g);
        for (i, &b) in g.phase_boundaries().iter().enumerate() {
            prop_assert_eq!(clock.classify(b), Phase::ALL[i % 4], "i={} t={}", i, b);
        }
    }

    /// `during` is true for exactly one phase.
    #[test]
    fn exactly_one_phase(g in geometry_strategy(), t in 0.0f64..5000.0) {
        let clock = PhaseClock::new(g);
        let hits = Phase::ALL.iter().filter(|&&p| clock.during(p, t)).count();
        prop_assert_eq!(hits, 1);
    }
}

// ── Step Controller ──────────────────────────────────────────────────

proptest! {
    /// Whatever the feedback, a returned step never exceeds the cap of the
    /// phase it was adapted at.
    #[test]
    fn step_never_exceeds_phase_cap(
        g in geometry_strategy(),
        limits in limits_strategy(),
        v0 in 0.2f64..10.0,
        feedback in prop::collection::vec((0.0f64..1.0, 0usize..12, any::<bool>()), 1..200),
    ) {
        let state = StepState::new(v0, 1.1, 0.1).unwrap();
        let mut c = AdaptiveStepController::new(state, g, limits.clone());
        for (frac, iterations, converged) in feedback {
            let t = frac * g.final_time();
            match c.adapt(t, iterations, converged) {
                Ok(v) => {
                    let phase = c.phase_at(t).unwrap();
                    let cap = limits.cap(phase).unwrap();
                    prop_assert!(v <= cap, "t={} phase={} v={} cap={}", t, phase, v, cap);
                }
                Err(CyclingError::StepSizeUnderflow { .. }) => {
                    prop_assert!(c.is_exhausted());
                    break;
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }

    /// Without caps, cheap converged solves grow the step geometrically.
    #[test]
    fn unphased_cheap_solves_grow(v0 in 0.1f64..10.0, ratio in 1.01f64..2.0, n in 1usize..30) {
        let state = StepState::new(v0, ratio, 0.01).unwrap();
        let mut c = AdaptiveStepController::unphased(state);
        let mut previous = c.value();
        for _ in 0..n {
            let v = c.adapt(0.0, 0, true).unwrap();
            prop_assert!(v > previous);
            prop_assert!((v / previous - ratio).abs() < 1e-9);
            previous = v;
        }
    }

    /// Any converged feedback never underflows, however expensive.
    #[test]
    fn converged_feedback_never_underflows(
        iterations in prop::collection::vec(0usize..50, 1..100),
    ) {
        let state = StepState::new(1.0, 1.1, 0.1).unwrap();
        let mut c = AdaptiveStepController::unphased(state);
        for nb in iterations {
            prop_assert!(c.adapt(0.0, nb, true).is_ok());
        }
    }
}

// ── Cycle Driver ─────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A well-behaved solver carries the run to the end of the schedule
    /// without any accepted step exceeding the largest cap.
    #[test]
    fn driver_covers_schedule(
        g in geometry_strategy(),
        limits in limits_strategy(),
        v0 in 0.1f64..2.0,
    ) {
        let state = StepState::new(v0, 1.1, 0.1).unwrap();
        let controller = AdaptiveStepController::new(state, g, limits.clone());
        let mut driver = CycleDriver::new(controller);
        let mut solver = |_t: f64, _dt: f64| -> CyclingResult<SolveOutcome> {
            Ok(SolveOutcome::converged(2))
        };

        let history = driver.run(&mut solver, 0.0, g.final_time()).unwrap();
        prop_assert_eq!(history.final_time(), Some(g.final_time()));
        prop_assert_eq!(history.rejected_count(), 0);

        let largest_cap = Phase::ALL
            .iter()
            .filter_map(|&p| limits.cap(p))
            .fold(v0, f64::max);
        for record in history.accepted() {
            prop_assert!(record.dt <= largest_cap + 1e-12, "dt {} > {}", record.dt, largest_cap);
        }
        for record in history.records.iter().skip(1) {
            let phase = record.phase.unwrap();
            let cap = limits.cap(phase).unwrap();
            prop_assert!(record.dt <= cap + 1e-12, "{}: dt {} > cap {}", phase, record.dt, cap);
        }
    }
}
