//! Collision response: elastic pair collisions, reactive merges and wall bounces.

use crate::core::particle::Particle;
use crate::core::species::{Species, SpeciesProperties};
use crate::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Squared separation, relative to the squared contact distance, below which
/// the line of centres is considered undefined.
const EPS_SEPARATION_REL: f64 = f64::EPSILON;

/// How the masses of two reacting particles combine into the product's mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MassRule {
    /// `m1 + m2`: total mass is conserved, and so is momentum.
    #[default]
    Sum,
    /// `(m1 + m2) / 2`: product keeps the average mass. Momentum is not conserved.
    Mean,
}

impl MassRule {
    #[inline]
    pub fn combine(self, m1: f64, m2: f64) -> f64 {
        match self {
            MassRule::Sum => m1 + m2,
            MassRule::Mean => 0.5 * (m1 + m2),
        }
    }
}

/// Resolve an elastic hard-sphere collision between `a` and `b`.
///
/// Only the velocity components along the line of centres change; positions
/// are untouched. Momentum and kinetic energy are conserved.
///
/// Errors:
/// - `Error::DegenerateCollision` if the centres coincide to within rounding of
///   the pair's contact distance.
pub fn elastic(a: &mut Particle, b: &mut Particle) -> Result<()> {
    let dx = a.position - b.position;
    let dist_sq = dx.norm_squared();
    let contact = a.radius + b.radius;
    if dist_sq <= EPS_SEPARATION_REL * contact * contact {
        return Err(Error::DegenerateCollision { i: a.id, j: b.id });
    }
    let (m1, m2) = (a.mass, b.mass);
    let dv = a.velocity - b.velocity;
    let proj = dv.dot(&dx) / dist_sq;
    if !proj.is_finite() {
        return Err(Error::DegenerateCollision { i: a.id, j: b.id });
    }

    // Same projection for both: dot(v2-v1, x2-x1) == dot(v1-v2, x1-x2).
    a.velocity -= dx * (2.0 * m2 / (m1 + m2) * proj);
    b.velocity += dx * (2.0 * m1 / (m1 + m2) * proj);
    Ok(())
}

/// Merge `consumed` into `survivor`, turning `survivor` into the product.
///
/// The survivor moves to the midpoint with velocity `(m1 v1 + m2 v2) / m'`
/// where `m'` is given by `rule`. `consumed` is left as-is; the caller must
/// schedule it for removal.
pub fn react(
    survivor: &mut Particle,
    consumed: &Particle,
    product: &SpeciesProperties,
    rule: MassRule,
) {
    let mass = rule.combine(survivor.mass, consumed.mass);
    let momentum = survivor.momentum() + consumed.momentum();

    survivor.velocity = momentum / mass;
    survivor.position = (survivor.position + consumed.position) * 0.5;
    survivor.mass = mass;
    survivor.radius = product.radius;
    survivor.color = product.color;
    survivor.species = Species::Product;
    survivor.catalyst_timer = 0;
    survivor.base_probability = 0.0;
    survivor.reaction_probability = 0.0;
}

/// Draw whether a collision between `a` and `b` reacts.
///
/// Only reagent-reagent collisions may react. The effective probability is the
/// larger of the two particles' current probabilities; the draw is uniform in [0, 1).
pub fn reaction_succeeds<R: Rng>(a: &Particle, b: &Particle, rng: &mut R) -> bool {
    if !(a.species.is_reactive() && b.species.is_reactive()) {
        return false;
    }
    let p = a.reaction_probability.max(b.reaction_probability);
    if p <= 0.0 {
        return false;
    }
    rng.random::<f64>() < p
}

/// Reflect the velocity on every flagged axis. Returns whether anything bounced.
pub fn bounce(p: &mut Particle, hits: [bool; 3]) -> bool {
    let mut any = false;
    for (k, &hit) in hits.iter().enumerate() {
        if hit {
            p.velocity[k] = -p.velocity[k];
            any = true;
        }
    }
    any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ball(x: Vec3, v: Vec3, m: f64) -> Result<Particle> {
        Particle::new(0, x, v, 0.5, m)
    }

    fn energy(ps: &[&Particle]) -> f64 {
        ps.iter().map(|p| p.kinetic_energy()).sum()
    }

    #[test]
    fn elastic_conserves_momentum_and_energy() -> Result<()> {
        let cases = [
            (Vec3::new(-0.4, 0.1, 0.0), Vec3::new(3.0, -1.0, 0.0), 1.0, Vec3::new(0.4, -0.2, 0.0), Vec3::new(-2.0, 0.5, 0.0), 3.0),
            (Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 3.0), 2.5, Vec3::new(0.3, 0.5, -0.6), Vec3::new(-4.0, 0.0, 1.0), 0.7),
            (Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 0.0), 1.0, Vec3::new(1.9, 1.0, 1.0), Vec3::new(-5.0, 0.0, 0.0), 1.0),
        ];
        for (x1, v1, m1, x2, v2, m2) in cases {
            let mut a = ball(x1, v1, m1)?;
            let mut b = ball(x2, v2, m2)?;
            let p0 = a.momentum() + b.momentum();
            let e0 = energy(&[&a, &b]);
            elastic(&mut a, &mut b)?;
            let p1 = a.momentum() + b.momentum();
            let e1 = energy(&[&a, &b]);
            assert!((p1 - p0).norm() < 1e-12, "momentum drift {}", (p1 - p0).norm());
            assert!(((e1 - e0) / e0).abs() < 1e-12, "energy drift E0={e0} E1={e1}");
            assert_eq!(a.position, x1);
            assert_eq!(b.position, x2);
        }
        Ok(())
    }

    #[test]
    fn equal_masses_head_on_swap_velocities() -> Result<()> {
        let mut a = ball(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), 1.0)?;
        let mut b = ball(Vec3::new(0.5, 0.0, 0.0), Vec3::new(-5.0, 0.0, 0.0), 1.0)?;
        elastic(&mut a, &mut b)?;
        assert!((a.velocity - Vec3::new(-5.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((b.velocity - Vec3::new(5.0, 0.0, 0.0)).norm() < 1e-12);
        Ok(())
    }

    #[test]
    fn coincident_centres_are_an_error() -> Result<()> {
        let mut a = ball(Vec3::new(1.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1.0)?;
        let mut b = ball(Vec3::new(1.0, 1.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 1.0)?;
        b.id = 1;
        let err = elastic(&mut a, &mut b).unwrap_err();
        assert!(matches!(err, Error::DegenerateCollision { i: 0, j: 1 }));
        // Nothing was mutated.
        assert_eq!(a.velocity, Vec3::new(1.0, 0.0, 0.0));
        Ok(())
    }

    #[test]
    fn microscopic_contact_is_not_degenerate() -> Result<()> {
        // Radii of 1e-7: touching centres are 2e-7 apart, well below any absolute cutoff.
        let mut a = Particle::new(0, Vec3::new(-1e-7, 0.0, 0.0), Vec3::new(1e-4, 0.0, 0.0), 1e-7, 4e-23)?;
        let mut b = Particle::new(1, Vec3::new(1e-7, 0.0, 0.0), Vec3::new(-1e-4, 0.0, 0.0), 1e-7, 4e-23)?;
        elastic(&mut a, &mut b)?;
        assert!((a.velocity.x + 1e-4).abs() < 1e-16, "a.vx = {}", a.velocity.x);
        assert!((b.velocity.x - 1e-4).abs() < 1e-16, "b.vx = {}", b.velocity.x);
        Ok(())
    }

    #[test]
    fn reaction_with_sum_rule_conserves_mass_and_momentum() -> Result<()> {
        let mut a = ball(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(5.0, 1.0, 0.0), 2.0)?;
        let b = ball(Vec3::new(1.0, 2.0, 0.0), Vec3::new(-3.0, 0.0, 0.0), 1.0)?;
        let p0 = a.momentum() + b.momentum();
        let product = SpeciesProperties::product_default();
        react(&mut a, &b, &product, MassRule::Sum);
        assert_eq!(a.species, Species::Product);
        assert_eq!(a.mass, 3.0);
        assert_eq!(a.radius, product.radius);
        assert_eq!(a.color, product.color);
        assert_eq!(a.position, Vec3::new(0.0, 1.0, 0.0));
        assert!((a.momentum() - p0).norm() < 1e-12);
        Ok(())
    }

    #[test]
    fn reaction_with_mean_rule_halves_mass_sum() -> Result<()> {
        let mut a = ball(Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), 1.0)?;
        let b = ball(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0), 3.0)?;
        react(&mut a, &b, &SpeciesProperties::product_default(), MassRule::Mean);
        assert_eq!(a.mass, 2.0);
        // v' = (1*2 + 3*0) / 2
        assert!((a.velocity.x - 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn reaction_gating() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let sure = ball(Vec3::zeros(), Vec3::zeros(), 1.0)?.with_reaction_probability(1.0)?;
        let never = ball(Vec3::zeros(), Vec3::zeros(), 1.0)?.with_reaction_probability(0.0)?;
        let product = ball(Vec3::zeros(), Vec3::zeros(), 1.0)?
            .with_reaction_probability(1.0)?
            .with_species(Species::Product, [0.0; 3]);

        for _ in 0..100 {
            assert!(reaction_succeeds(&sure, &never, &mut rng), "max of the two applies");
            assert!(!reaction_succeeds(&never, &never, &mut rng));
            assert!(!reaction_succeeds(&sure, &product, &mut rng));
        }
        Ok(())
    }

    #[test]
    fn partial_probability_reacts_sometimes() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(99);
        let a = ball(Vec3::zeros(), Vec3::zeros(), 1.0)?.with_reaction_probability(0.5)?;
        let hits = (0..1000).filter(|_| reaction_succeeds(&a, &a, &mut rng)).count();
        assert!((400..600).contains(&hits), "hits = {hits}");
        Ok(())
    }

    #[test]
    fn bounce_negates_only_flagged_axes() -> Result<()> {
        let mut p = ball(Vec3::zeros(), Vec3::new(3.0, -2.0, 1.5), 1.0)?;
        assert!(bounce(&mut p, [false, true, false]));
        assert_eq!(p.velocity, Vec3::new(3.0, 2.0, 1.5));
        assert!(!bounce(&mut p, [false; 3]));
        assert_eq!(p.velocity, Vec3::new(3.0, 2.0, 1.5));
        Ok(())
    }
}
