//! Hard-sphere gas in a square (2D) or cubic (3D) box.
//!
//! Particles drift with a fixed time step, bounce elastically off each other
//! and the walls, and pairs of reagents may react into a single product
//! particle. Per-step statistics (species counts, temperature, speed
//! histogram) are recorded for plotting and export.
//!
//! ```no_run
//! use reactsim::config::SimConfig;
//! use reactsim::core::Simulation;
//!
//! # fn main() -> reactsim::error::Result<()> {
//! let mut sim = Simulation::new(SimConfig { seed: Some(1), ..SimConfig::default() })?;
//! let reason = sim.run()?;
//! sim.export_to(std::path::Path::new("dados"))?;
//! println!("stopped: {reason:?} after {} steps", sim.step_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod export;

#[cfg(feature = "python")]
mod python;
