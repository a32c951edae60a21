// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Plasma-Wall Boundaries
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Boundary values imposed on the wall by the plasma.
//!
//! Cyclic particle and heat fluxes, and the implanted surface
//! concentration they produce.

pub mod flux;
pub mod implantation;
