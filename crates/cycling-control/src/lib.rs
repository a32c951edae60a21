// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Cycling Control
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Time-stepping control for cyclic wall loading.
//!
//! Phase clock, phase-aware adaptive step size and the driver loop that
//! couples them to an external transient solver.

pub mod driver;
pub mod phase;
pub mod stepsize;
