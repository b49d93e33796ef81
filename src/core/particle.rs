use crate::core::species::{Color, Species, SpeciesProperties};
use crate::error::{Error, Result};
use nalgebra::Vector3;

/// Position/velocity vector. 2D runs keep `z == 0` throughout.
pub type Vec3 = Vector3<f64>;

/// A hard-sphere particle.
///
/// `id` is dense over the active set and is reassigned after every flush of
/// reacted-away particles, so it is not a lifetime identity.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Index of this particle in the active set at the start of the step.
    pub id: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Hard-sphere radius (> 0).
    pub radius: f64,
    /// Mass (> 0).
    pub mass: f64,
    pub species: Species,
    /// Render colour; follows the species' configured colour.
    pub color: Color,
    /// Current reaction probability in [0, 1], possibly boosted by a recent wall hit.
    pub reaction_probability: f64,
    /// Probability the particle relaxes back to once the catalytic boost runs out.
    pub base_probability: f64,
    /// Steps of catalytic boost remaining.
    pub catalyst_timer: u32,
    /// Indices of particles within the interaction radius, rebuilt every step.
    pub neighbors: Vec<usize>,
}

impl Particle {
    /// Create a new reagent particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` or `mass` is non-positive or any component is NaN/inf.
    pub fn new(id: usize, position: Vec3, velocity: Vec3, radius: f64, mass: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !position.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !velocity.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        let reagent = SpeciesProperties::reagent_default();
        Ok(Self {
            id,
            position,
            velocity,
            radius,
            mass,
            species: Species::Reagent,
            color: reagent.color,
            reaction_probability: 0.0,
            base_probability: 0.0,
            catalyst_timer: 0,
            neighbors: Vec::new(),
        })
    }

    /// Build a particle carrying a species' radius, mass and colour.
    pub fn of_species(
        id: usize,
        position: Vec3,
        velocity: Vec3,
        species: Species,
        props: &SpeciesProperties,
    ) -> Result<Self> {
        let mut p = Self::new(id, position, velocity, props.radius, props.mass)?;
        p.species = species;
        p.color = props.color;
        Ok(p)
    }

    /// Set both the baseline and the current reaction probability.
    pub fn with_reaction_probability(mut self, probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidParam(
                "reaction probability must lie in [0, 1]".into(),
            ));
        }
        self.base_probability = probability;
        self.reaction_probability = probability;
        Ok(self)
    }

    pub fn with_species(mut self, species: Species, color: Color) -> Self {
        self.species = species;
        self.color = color;
        self
    }

    /// Returns the particle's kinetic energy: 1/2 m |v|^2.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    #[inline]
    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }

    /// Position after drifting for `dt` without changing state.
    #[inline]
    pub fn predicted_position(&self, dt: f64) -> Vec3 {
        self.position + self.velocity * dt
    }

    /// Linear drift: `position += velocity * dt`.
    #[inline]
    pub fn integrate(&mut self, dt: f64) {
        self.position += self.velocity * dt;
    }

    /// Start a catalytic boost of `boost` steps after a wall hit.
    ///
    /// The boosted probability is `base * (1 + timer)`, capped at 1.
    pub fn arm_catalyst(&mut self, boost: u32) {
        if boost == 0 {
            return;
        }
        self.catalyst_timer = boost;
        self.refresh_probability();
    }

    /// Count the boost down by one step.
    pub fn decay_catalyst(&mut self) {
        self.catalyst_timer = self.catalyst_timer.saturating_sub(1);
        self.refresh_probability();
    }

    fn refresh_probability(&mut self) {
        let boosted = self.base_probability * (1.0 + f64::from(self.catalyst_timer));
        self.reaction_probability = boosted.min(1.0);
    }
}
