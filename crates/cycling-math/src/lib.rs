//! Interpolation primitives and cyclic driving waveforms.

pub mod interp;
pub mod waveform;
