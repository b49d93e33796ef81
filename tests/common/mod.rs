#![allow(dead_code)]

use reactsim::config::SimConfig;
use reactsim::core::{Particle, Species, SpeciesProperties, Vec3};
use reactsim::error::Result;

/// Reagent with unit mass and the given radius and reaction probability.
pub fn reagent(x: [f64; 3], v: [f64; 3], radius: f64, probability: f64) -> Result<Particle> {
    let props = SpeciesProperties {
        radius,
        mass: 1.0,
        ..SpeciesProperties::reagent_default()
    };
    Particle::of_species(0, Vec3::from(x), Vec3::from(v), Species::Reagent, &props)?
        .with_reaction_probability(probability)
}

/// Config for scripted scenarios: unit Boltzmann constant, fixed seed.
pub fn scenario_config(box_size: f64) -> SimConfig {
    SimConfig {
        box_size,
        boltzmann_constant: 1.0,
        histogram_bin_width: 1.0,
        histogram_max_speed: 20.0,
        seed: Some(2024),
        ..SimConfig::default()
    }
}
