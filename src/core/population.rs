use crate::core::particle::Particle;
use crate::core::species::Species;
use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// The authoritative set of active particles plus pending removals.
///
/// Removals are deferred: a particle consumed by a reaction stays in the
/// vector (so indices held by the current step remain valid) until
/// [`Population::flush_removals`] runs at the start of the next step.
#[derive(Debug, Default, Clone)]
pub struct Population {
    particles: Vec<Particle>,
    scheduled: BTreeSet<usize>,
}

impl Population {
    /// Take ownership of `particles`, assigning dense ids.
    pub fn new(particles: Vec<Particle>) -> Self {
        let mut pop = Self {
            particles,
            scheduled: BTreeSet::new(),
        };
        pop.reindex();
        pop
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Number of particles currently stored, including any awaiting removal.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particles that still take part in dynamics.
    pub fn active_count(&self) -> usize {
        self.particles.len() - self.scheduled.len()
    }

    /// Whether `index` has been consumed this step.
    #[inline]
    pub fn is_scheduled(&self, index: usize) -> bool {
        self.scheduled.contains(&index)
    }

    /// Mark `index` for removal. Returns `false` if it was already scheduled.
    pub fn schedule_removal(&mut self, index: usize) -> Result<bool> {
        if index >= self.particles.len() {
            return Err(Error::InvalidParam(format!(
                "cannot schedule particle {index}: only {} present",
                self.particles.len()
            )));
        }
        Ok(self.scheduled.insert(index))
    }

    /// Drop every scheduled particle and renumber the rest `0..len`.
    ///
    /// Returns how many particles were removed.
    pub fn flush_removals(&mut self) -> usize {
        if self.scheduled.is_empty() {
            return 0;
        }
        let removed = self.scheduled.len();
        let scheduled = std::mem::take(&mut self.scheduled);
        let mut index = 0usize;
        self.particles.retain(|_| {
            let keep = !scheduled.contains(&index);
            index += 1;
            keep
        });
        self.reindex();
        removed
    }

    /// Two distinct particles mutably at once.
    pub fn pair_mut(&mut self, i: usize, j: usize) -> Result<(&mut Particle, &mut Particle)> {
        if i == j || i >= self.particles.len() || j >= self.particles.len() {
            return Err(Error::InvalidParam(format!("invalid particle pair ({i}, {j})")));
        }
        if i < j {
            let (lo, hi) = self.particles.split_at_mut(j);
            Ok((&mut lo[i], &mut hi[0]))
        } else {
            let (lo, hi) = self.particles.split_at_mut(i);
            Ok((&mut hi[0], &mut lo[j]))
        }
    }

    /// Active particles of `species`, excluding any scheduled for removal.
    pub fn count_species(&self, species: Species) -> usize {
        self.active().filter(|p| p.species == species).count()
    }

    pub fn reagent_count(&self) -> usize {
        self.count_species(Species::Reagent)
    }

    pub fn product_count(&self) -> usize {
        self.count_species(Species::Product)
    }

    /// Iterate over particles not scheduled for removal.
    pub fn active(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.particles
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.scheduled.contains(i))
            .map(|(_, p)| p)
    }

    fn reindex(&mut self) {
        for (i, p) in self.particles.iter_mut().enumerate() {
            p.id = i;
        }
    }
}
