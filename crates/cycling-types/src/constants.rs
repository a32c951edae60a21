// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Boltzmann constant (eV/K). Activation energies are given in eV.
pub const K_B_EV: f64 = 8.617333262e-5;
