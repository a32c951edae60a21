// ─────────────────────────────────────────────────────────────────────
// SCPN Wall Cycling — Python Bindings
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! PyO3 Python bindings for SCPN Wall Cycling.
//!
//! The finite-element solver stays in Python; it holds the step-size
//! controller and the boundary synthesizer by reference and calls them
//! once per attempted step.

use std::collections::{BTreeMap, HashMap};

use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use cycling_control::phase::PhaseClock;
use cycling_control::stepsize::{AdaptiveStepController, StepLimits, StepState};
use cycling_math::waveform::CyclicWaveform;
use cycling_pwi::flux::{CyclicFluxBoundary, FluxSource};
use cycling_pwi::implantation::{BoundaryModel, BoundaryValueSynthesizer, Recombination};
use cycling_types::config::ScenarioConfig;
use cycling_types::cycle::{CycleGeometry, Phase};
use cycling_types::error::CyclingError;

fn to_py_err(e: CyclingError) -> PyErr {
    match e {
        CyclingError::StepSizeUnderflow { .. } => PyRuntimeError::new_err(e.to_string()),
        CyclingError::Io(_) => PyIOError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

/// `from_file` already validates the scenario.
fn load_scenario(path: &str) -> PyResult<ScenarioConfig> {
    ScenarioConfig::from_file(path).map_err(to_py_err)
}

// ─── Cycle geometry ───

/// Durations of the four phases and the number of cycles.
#[pyclass(name = "CycleGeometry")]
#[derive(Clone)]
struct PyCycleGeometry {
    inner: CycleGeometry,
}

#[pymethods]
impl PyCycleGeometry {
    #[new]
    fn new(rampup: f64, plateau: f64, rampdown: f64, rest: f64, nb_cycles: usize) -> PyResult<Self> {
        let inner =
            CycleGeometry::new(rampup, plateau, rampdown, rest, nb_cycles).map_err(to_py_err)?;
        Ok(PyCycleGeometry { inner })
    }

    /// Phase name of time `t`: "rampup", "plateau", "rampdown" or "rest".
    fn classify(&self, t: f64) -> &'static str {
        PhaseClock::new(self.inner).classify(t).name()
    }

    fn cycle_length(&self) -> f64 {
        self.inner.cycle_length()
    }

    fn final_time(&self) -> f64 {
        self.inner.final_time()
    }

    /// Start of every phase of every cycle plus the end of the last rest.
    fn phase_boundaries<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        ndarray::Array1::from_vec(self.inner.phase_boundaries()).into_pyarray(py)
    }

    fn __repr__(&self) -> String {
        format!(
            "CycleGeometry(rampup={}, plateau={}, rampdown={}, rest={}, nb_cycles={})",
            self.inner.rampup(),
            self.inner.plateau(),
            self.inner.rampdown(),
            self.inner.rest(),
            self.inner.nb_cycles()
        )
    }
}

// ─── Step size ───

/// Phase-aware adaptive step size.
#[pyclass(name = "CyclingStepsize")]
struct PyCyclingStepsize {
    inner: AdaptiveStepController,
}

#[pymethods]
impl PyCyclingStepsize {
    /// `max_stepsize` maps phase names to caps; missing phases are uncapped.
    #[new]
    #[pyo3(signature = (initial_value, geometry, max_stepsize=None, change_ratio=1.1, dt_min=0.1))]
    fn new(
        initial_value: f64,
        geometry: PyRef<'_, PyCycleGeometry>,
        max_stepsize: Option<HashMap<String, f64>>,
        change_ratio: f64,
        dt_min: f64,
    ) -> PyResult<Self> {
        let state = StepState::new(initial_value, change_ratio, dt_min).map_err(to_py_err)?;
        let caps = max_stepsize
            .unwrap_or_default()
            .into_iter()
            .map(|(name, cap)| name.parse::<Phase>().map(|phase| (phase, cap)))
            .collect::<Result<BTreeMap<_, _>, CyclingError>>()
            .map_err(to_py_err)?;
        let limits = StepLimits::from_map(caps).map_err(to_py_err)?;
        Ok(PyCyclingStepsize {
            inner: AdaptiveStepController::new(state, geometry.inner, limits),
        })
    }

    /// Step settings of a scenario JSON file.
    #[staticmethod]
    fn from_config(path: &str) -> PyResult<Self> {
        let config = load_scenario(path)?;
        let inner = AdaptiveStepController::from_config(&config).map_err(to_py_err)?;
        Ok(PyCyclingStepsize { inner })
    }

    /// Update after one solver attempt starting at `t` and return the new step.
    /// Raises RuntimeError once the step falls below `dt_min`.
    fn adapt(&mut self, t: f64, nb_iterations: usize, converged: bool) -> PyResult<f64> {
        self.inner
            .adapt(t, nb_iterations, converged)
            .map_err(to_py_err)
    }

    #[getter]
    fn value(&self) -> f64 {
        self.inner.value()
    }

    fn classify(&self, t: f64) -> Option<&'static str> {
        self.inner.phase_at(t).map(Phase::name)
    }

    #[getter]
    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }
}

// ─── Waveforms and boundaries ───

/// Periodic piecewise-linear signal from one value per phase.
#[pyclass(name = "CyclicWaveform")]
struct PyCyclicWaveform {
    inner: CyclicWaveform,
}

#[pymethods]
impl PyCyclicWaveform {
    #[new]
    fn new(pattern: Vec<f64>, geometry: PyRef<'_, PyCycleGeometry>) -> PyResult<Self> {
        let inner = CyclicWaveform::build(&pattern, geometry.inner).map_err(to_py_err)?;
        Ok(PyCyclicWaveform { inner })
    }

    fn evaluate(&self, t: f64) -> f64 {
        self.inner.evaluate(t)
    }

    fn evaluate_many<'py>(
        &self,
        py: Python<'py>,
        times: PyReadonlyArray1<'py, f64>,
    ) -> Bound<'py, PyArray1<f64>> {
        let times = times.as_array().to_owned();
        self.inner.evaluate_many(&times).into_pyarray(py)
    }
}

/// Dirichlet value of the mobile concentration at the exposed surface.
#[pyclass(name = "ImplantationBoundary")]
struct PyImplantationBoundary {
    inner: BoundaryValueSynthesizer,
}

#[pymethods]
impl PyImplantationBoundary {
    /// Cyclic particle flux on tungsten. With `recombination=True` the
    /// coolant recombination term is added.
    #[new]
    #[pyo3(signature = (pattern, geometry, r_p=9.52e-10, d_0=1.9e-7, e_d=0.2, recombination=false))]
    fn new(
        pattern: Vec<f64>,
        geometry: PyRef<'_, PyCycleGeometry>,
        r_p: f64,
        d_0: f64,
        e_d: f64,
        recombination: bool,
    ) -> PyResult<Self> {
        let flux = FluxSource::cyclic(&pattern, geometry.inner).map_err(to_py_err)?;
        let mut model = BoundaryModel {
            d_0,
            e_d,
            r_p,
            recombination: None,
        };
        if recombination {
            model = model.with_recombination(Recombination::coolant());
        }
        model.validate().map_err(to_py_err)?;
        Ok(PyImplantationBoundary {
            inner: BoundaryValueSynthesizer::new(flux, model),
        })
    }

    #[staticmethod]
    fn from_config(path: &str) -> PyResult<Self> {
        let config = load_scenario(path)?;
        let inner = BoundaryValueSynthesizer::from_config(&config).map_err(to_py_err)?;
        Ok(PyImplantationBoundary { inner })
    }

    fn value_at(&self, t: f64, temperature: f64) -> PyResult<f64> {
        self.inner.value_at(t, temperature).map_err(to_py_err)
    }

    /// Evaluate on a nodal temperature field.
    fn value_on_field<'py>(
        &self,
        py: Python<'py>,
        t: f64,
        temperatures: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let field = temperatures.as_array().to_owned();
        let values = self.inner.value_on_field(t, &field).map_err(to_py_err)?;
        Ok(values.into_pyarray(py))
    }
}

/// Cyclic or constant Neumann flux on one field.
#[pyclass(name = "FluxBoundary")]
struct PyFluxBoundary {
    inner: CyclicFluxBoundary,
}

#[pymethods]
impl PyFluxBoundary {
    #[new]
    fn new(field: String, pattern: Vec<f64>, geometry: PyRef<'_, PyCycleGeometry>) -> PyResult<Self> {
        let source = FluxSource::cyclic(&pattern, geometry.inner).map_err(to_py_err)?;
        Ok(PyFluxBoundary {
            inner: CyclicFluxBoundary::new(field, source),
        })
    }

    /// Heat flux of a scenario JSON file, or None if it defines none.
    #[staticmethod]
    fn heat_from_config(path: &str) -> PyResult<Option<Self>> {
        let config = load_scenario(path)?;
        let heat = CyclicFluxBoundary::heat_from_config(&config).map_err(to_py_err)?;
        Ok(heat.map(|inner| PyFluxBoundary { inner }))
    }

    #[getter]
    fn field(&self) -> &str {
        self.inner.field()
    }

    fn value_at(&self, t: f64) -> f64 {
        self.inner.value_at(t)
    }
}

// ─── Module registration ───

/// SCPN Wall Cycling: step control and boundary values for cyclic wall loading.
#[pymodule]
fn scpn_cycling_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCycleGeometry>()?;
    m.add_class::<PyCyclingStepsize>()?;
    m.add_class::<PyCyclicWaveform>()?;
    m.add_class::<PyImplantationBoundary>()?;
    m.add_class::<PyFluxBoundary>()?;
    Ok(())
}
