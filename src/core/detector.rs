//! Collision detection.
//!
//! Two strategies share one pair predicate:
//! - [`AllPairs`]: every unordered pair, O(N²)
//! - [`NeighborList`]: pairs within contact distance plus a slack margin
//!
//! The neighbour list is rebuilt by a linear scan every step, so it is still
//! O(N²) overall. That is fine for the tens-to-hundreds of particles this
//! engine targets; a spatial hash could replace the scan behind the same trait.

use crate::config::Dimension;
use crate::core::particle::Particle;
use std::collections::BTreeSet;

/// Closing-contact predicate for a pair.
///
/// True iff the spheres touch or overlap now AND their separation shrinks over
/// the next `dt`. Pairs already moving apart never fire, so a resolved contact
/// is not re-triggered while the spheres are still overlapping.
pub fn is_closing_contact(a: &Particle, b: &Particle, dt: f64) -> bool {
    let d_now = (a.position - b.position).norm();
    let d_next = (a.predicted_position(dt) - b.predicted_position(dt)).norm();
    d_now <= a.radius + b.radius && d_now > d_next
}

/// Which axes the particle is crossing outward this step.
///
/// Axis k is flagged iff `|x_k| >= L/2 - r` and `|x_k|` grows over `dt`.
/// Inactive axes (z in 2D) are never flagged.
pub fn wall_crossings(p: &Particle, half_box: f64, dt: f64, dim: Dimension) -> [bool; 3] {
    let mut hits = [false; 3];
    let limit = half_box - p.radius;
    for (k, hit) in hits.iter_mut().enumerate().take(dim.axes()) {
        let now = p.position[k].abs();
        let next = (p.position[k] + p.velocity[k] * dt).abs();
        *hit = now >= limit && now < next;
    }
    hits
}

/// A pair flagged by [`is_closing_contact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub i: usize,
    pub j: usize,
}

/// Collision detector trait
///
/// Implementations choose which pairs are worth testing; the predicate itself is fixed.
pub trait CollisionDetector: Send + Sync {
    /// Unique unordered candidate pairs `(i, j)` with `i < j`, ascending.
    ///
    /// May refresh per-particle bookkeeping (neighbour lists).
    fn candidate_pairs(&self, particles: &mut [Particle]) -> Vec<(usize, usize)>;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// All candidate pairs on a closing contact course this step.
    fn detect(&self, particles: &mut [Particle], dt: f64) -> Vec<Contact> {
        self.candidate_pairs(particles)
            .into_iter()
            .filter(|&(i, j)| is_closing_contact(&particles[i], &particles[j], dt))
            .map(|(i, j)| Contact { i, j })
            .collect()
    }
}

/// Direct O(N²) detector over all C(n, 2) pairs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllPairs;

impl CollisionDetector for AllPairs {
    fn candidate_pairs(&self, particles: &mut [Particle]) -> Vec<(usize, usize)> {
        let n = particles.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push((i, j));
            }
        }
        pairs
    }

    fn name(&self) -> &'static str {
        "all-pairs"
    }
}

/// Neighbour-list detector.
///
/// Particle j is a neighbour of i when `|x_i - x_j| <= r_i + r_j + slack`.
/// The slack must exceed the largest single-step displacement, otherwise a
/// fast pair could close from outside the list to overlap within one step.
#[derive(Debug, Clone, Copy)]
pub struct NeighborList {
    pub slack: f64,
}

impl NeighborList {
    pub fn new(slack: f64) -> Self {
        Self { slack }
    }

    /// Rebuild every particle's `neighbors` from scratch.
    pub fn refresh(&self, particles: &mut [Particle]) {
        let n = particles.len();
        for i in 0..n {
            let mut found = Vec::new();
            for j in 0..n {
                if i == j {
                    continue;
                }
                let reach = particles[i].radius + particles[j].radius + self.slack;
                if (particles[i].position - particles[j].position).norm_squared() <= reach * reach {
                    found.push(j);
                }
            }
            particles[i].neighbors = found;
        }
    }
}

impl CollisionDetector for NeighborList {
    fn candidate_pairs(&self, particles: &mut [Particle]) -> Vec<(usize, usize)> {
        self.refresh(particles);
        // Each pair appears in both lists; the set keeps one copy.
        let mut pairs = BTreeSet::new();
        for (i, p) in particles.iter().enumerate() {
            for &j in &p.neighbors {
                pairs.insert((i.min(j), i.max(j)));
            }
        }
        pairs.into_iter().collect()
    }

    fn name(&self) -> &'static str {
        "neighbor-list"
    }
}
