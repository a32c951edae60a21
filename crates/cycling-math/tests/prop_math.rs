// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Property-Based Tests (proptest) for cycling-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for cycling-math using proptest.
//!
//! Covers: linear table bounds, cyclic waveform layout, periodicity,
//! fill/hold semantics and idempotent evaluation.

use cycling_math::interp::LinearTable;
use cycling_math::waveform::CyclicWaveform;
use cycling_types::cycle::CycleGeometry;
use proptest::prelude::*;

fn geometry_strategy() -> impl Strategy<Value = CycleGeometry> {
    (
        0.5f64..200.0,
        0.5f64..800.0,
        0.5f64..200.0,
        0.5f64..2000.0,
        1usize..25,
    )
        .prop_map(|(up, flat, down, rest, n)| {
            CycleGeometry::new(up, flat, down, rest, n).unwrap()
        })
}

fn pattern_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1e22f64..1e22, 4)
}

// ── LinearTable Properties ───────────────────────────────────────────

proptest! {
    /// Interpolated values stay within the bracketing values.
    #[test]
    fn table_value_between_neighbours(
        ys in prop::collection::vec(-100.0f64..100.0, 2..20),
        frac in 0.0f64..1.0,
    ) {
        let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64 * 1.5).collect();
        let table = LinearTable::new(xs.clone(), ys.clone(), 0.0).unwrap();
        for i in 0..ys.len() - 1 {
            let x = xs[i] + frac * (xs[i + 1] - xs[i]);
            let v = table.eval(x);
            let lo = ys[i].min(ys[i + 1]) - 1e-9;
            let hi = ys[i].max(ys[i + 1]) + 1e-9;
            prop_assert!(v >= lo && v <= hi, "v={} not in [{}, {}]", v, lo, hi);
        }
    }
}

// ── CyclicWaveform Properties ────────────────────────────────────────

proptest! {
    /// 4 breakpoints per cycle plus one, strictly increasing.
    #[test]
    fn waveform_table_shape(g in geometry_strategy(), p in pattern_strategy()) {
        let w = CyclicWaveform::build(&p, g).unwrap();
        let b = w.breakpoints();
        prop_assert_eq!(b.len(), 4 * g.nb_cycles() + 1);
        prop_assert_eq!(w.values().len(), b.len());
        for i in 1..b.len() {
            prop_assert!(b[i] > b[i - 1]);
        }
    }

    /// Every breakpoint evaluates exactly to its pattern value.
    #[test]
    fn waveform_hits_pattern_on_breakpoints(g in geometry_strategy(), p in pattern_strategy()) {
        let w = CyclicWaveform::build(&p, g).unwrap();
        for (i, &t) in w.breakpoints().iter().enumerate() {
            let expected = if i == w.breakpoints().len() - 1 { p[3] } else { p[i % 4] };
            prop_assert_eq!(w.evaluate(t), expected, "breakpoint {} at t={}", i, t);
        }
    }

    /// Before the table the signal is zero; after it, the last pattern value.
    #[test]
    fn waveform_fill_and_hold(
        g in geometry_strategy(),
        p in pattern_strategy(),
        before in 1e-6f64..1e6,
        after in 0.0f64..1e6,
    ) {
        let w = CyclicWaveform::build(&p, g).unwrap();
        let end = w.breakpoints()[w.breakpoints().len() - 1];
        prop_assert_eq!(w.evaluate(-before), 0.0);
        prop_assert_eq!(w.evaluate(end + after), p[3]);
    }

    /// The same offset in the first two cycles gives the same value (the
    /// last cycle differs: its rest period holds instead of ramping).
    #[test]
    fn waveform_is_periodic(
        g in geometry_strategy().prop_filter("needs three cycles", |g| g.nb_cycles() >= 3),
        p in prop::collection::vec(0.0f64..1e3, 4),
        frac in 0.0f64..0.999,
    ) {
        let w = CyclicWaveform::build(&p, g).unwrap();
        let tau = frac * g.cycle_length();
        let first = w.evaluate(tau);
        let second = w.evaluate(tau + g.cycle_length());
        prop_assert!((first - second).abs() < 1e-6 * (1.0 + first.abs()),
            "first={} second={}", first, second);
    }

    /// Repeated evaluation is bit-identical.
    #[test]
    fn waveform_idempotent(g in geometry_strategy(), p in pattern_strategy(), t in -10.0f64..1e5) {
        let w = CyclicWaveform::build(&p, g).unwrap();
        prop_assert_eq!(w.evaluate(t).to_bits(), w.evaluate(t).to_bits());
    }
}
