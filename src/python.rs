use numpy::ndarray::{Array1, Array2};
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::path::PathBuf;

use crate::config::{Dimension, SimConfig};
use crate::core::{RunState, Simulation, SpeciesProperties};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn vectors_to_array<'a, I>(n: usize, rows: I) -> Array2<f64>
where
    I: Iterator<Item = &'a crate::core::Vec3>,
{
    let mut arr = Array2::<f64>::zeros((n, 3));
    for (i, v) in rows.enumerate() {
        for k in 0..3 {
            arr[[i, k]] = v[k];
        }
    }
    arr
}

/// Python-facing wrapper around the reactive hard-sphere simulation.
///
/// - __new__(num_particles=100, box_size=24.0, ..., seed=None, config_path=None)
/// - step() -> bool, run(max_steps=None) -> str, stop()
/// - positions() / velocities() -> np.ndarray, shape (N, 3)
/// - counts() -> (reagents, products), temperature(), speed_histogram()
/// - export(directory=None) -> (concentration_path, temperature_path)
#[pyclass]
pub struct ReactSim {
    sim: Simulation,
}

#[pymethods]
impl ReactSim {
    /// Build a run from keyword options, or from a TOML file when `config_path` is given.
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (
        num_particles=100,
        box_size=24.0,
        dt=1e-3,
        dim=2,
        radius=0.1,
        mass=4e-23,
        max_speed=40.0,
        reaction_probability=0.4,
        catalyst_boost=0,
        seed=None,
        config_path=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_particles: usize,
        box_size: f64,
        dt: f64,
        dim: u8,
        radius: f64,
        mass: f64,
        max_speed: f64,
        reaction_probability: f64,
        catalyst_boost: u32,
        seed: Option<u64>,
        config_path: Option<PathBuf>,
    ) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => SimConfig::load(path).map_err(py_err)?,
            None => SimConfig {
                particle_count: num_particles,
                box_size,
                dt,
                dimension: Dimension::try_from(dim).map_err(py_err)?,
                reagent: SpeciesProperties {
                    radius,
                    mass,
                    ..SpeciesProperties::reagent_default()
                },
                max_initial_speed: max_speed,
                reaction_probability,
                catalyst_boost,
                seed,
                ..SimConfig::default()
            },
        };
        let sim = Simulation::new(config).map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Advance one step. Returns False once the run has stopped.
    fn step(&mut self) -> PyResult<bool> {
        let state = self.sim.step().map_err(py_err)?;
        Ok(state == RunState::Running)
    }

    /// Step until the run stops (or `max_steps` more steps), releasing the GIL.
    ///
    /// Returns the stop reason, or "Running" if `max_steps` ran out first.
    #[pyo3(signature = (max_steps=None))]
    fn run(&mut self, py: Python<'_>, max_steps: Option<u64>) -> PyResult<String> {
        let sim = &mut self.sim;
        let state = py
            .detach(|| -> crate::error::Result<RunState> {
                match max_steps {
                    Some(n) => {
                        let mut state = sim.state();
                        for _ in 0..n {
                            state = sim.step()?;
                            if state != RunState::Running {
                                break;
                            }
                        }
                        Ok(state)
                    }
                    None => sim.run().map(RunState::Stopped),
                }
            })
            .map_err(py_err)?;
        Ok(match state {
            RunState::Running => "Running".to_string(),
            RunState::Stopped(reason) => format!("{reason:?}"),
        })
    }

    /// Raise the stop flag; the run ends after the current step.
    fn stop(&self) {
        self.sim.stop_handle().stop();
    }

    fn step_count(&self) -> u64 {
        self.sim.step_count()
    }

    /// Positions of the active particles as a NumPy array of shape (N, 3), dtype=float64.
    fn positions(&self, py: Python<'_>) -> Py<PyArray2<f64>> {
        let views = self.sim.frame().particles;
        vectors_to_array(views.len(), views.iter().map(|v| &v.position))
            .into_pyarray(py)
            .unbind()
    }

    /// Velocities of the active particles as a NumPy array of shape (N, 3), dtype=float64.
    fn velocities(&self, py: Python<'_>) -> Py<PyArray2<f64>> {
        let views = self.sim.frame().particles;
        vectors_to_array(views.len(), views.iter().map(|v| &v.velocity))
            .into_pyarray(py)
            .unbind()
    }

    /// Radii of the active particles as a NumPy array of shape (N,).
    fn radii(&self, py: Python<'_>) -> Py<PyArray1<f64>> {
        Array1::from_iter(self.sim.frame().particles.iter().map(|v| v.radius))
            .into_pyarray(py)
            .unbind()
    }

    /// (reagent count, product count) over active particles.
    fn counts(&self) -> (usize, usize) {
        (self.sim.reagent_count(), self.sim.product_count())
    }

    fn temperature(&self) -> f64 {
        self.sim.temperature()
    }

    /// Live speed histogram as (edges, fractions).
    fn speed_histogram(&self, py: Python<'_>) -> PyResult<(Py<PyArray1<f64>>, Py<PyArray1<f64>>)> {
        let h = self.sim.speed_histogram().map_err(py_err)?;
        Ok((
            Array1::from(h.edges).into_pyarray(py).unbind(),
            Array1::from(h.fractions).into_pyarray(py).unbind(),
        ))
    }

    /// Maxwell-Boltzmann overlay as a list of (v, fraction) points.
    fn maxwell_boltzmann_curve(&self) -> Vec<(f64, f64)> {
        self.sim.maxwell_boltzmann_curve()
    }

    /// (step, reagents, products, temperature) rows recorded so far.
    fn history(&self) -> Vec<(u64, usize, usize, f64)> {
        self.sim
            .samples()
            .iter()
            .map(|s| (s.step, s.reagents, s.products, s.temperature))
            .collect()
    }

    /// Write the time series; defaults to the configured export directory.
    #[pyo3(signature = (directory=None))]
    fn export(&self, directory: Option<PathBuf>) -> PyResult<(String, String)> {
        let dir = directory.unwrap_or_else(|| self.sim.config().export_dir.clone());
        let paths = self.sim.export_to(&dir).map_err(py_err)?;
        Ok((
            paths.concentration.display().to_string(),
            paths.temperature.display().to_string(),
        ))
    }
}

/// The reactsim Python module entry point.
#[pymodule]
fn reactsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ReactSim>()?;
    Ok(())
}
