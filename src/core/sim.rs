use crate::config::{Dimension, SimConfig};
use crate::core::detector::{is_closing_contact, wall_crossings, AllPairs, CollisionDetector, NeighborList};
use crate::core::particle::{Particle, Vec3};
use crate::core::population::Population;
use crate::core::resolver::{bounce, elastic, react, reaction_succeeds};
use crate::core::sink::{Frame, NullObserver, Observer, ParticleView, PlotSample};
use crate::core::species::Species;
use crate::core::stats::{self, Recorder, SpeedHistogram, StepSample};
use crate::error::{Error, Result};
use crate::export::{self, ExportPaths};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upper bound on rejection-sampling attempts per particle.
const MAX_PLACEMENT_ATTEMPTS: usize = 1_000_000;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every reagent has reacted away.
    ReagentsExhausted,
    /// The external stop flag was raised.
    StopSignal,
    /// `max_steps` was reached.
    StepLimit,
}

/// Stepper state. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped(StopReason),
}

/// Cooperative stop flag, polled once at the end of every step.
///
/// Clones share the same flag, so a handle can be given to a UI or signal handler.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Fixed-step hard-sphere simulation in a box of side L centred on the origin.
///
/// Walls sit at `±L/2` on every active axis. Each call to [`Simulation::step`] runs:
/// 1. flush particles consumed by the previous step's reactions
/// 2. push render/plot snapshots to the observer
/// 3. drift, detect and resolve pair collisions, bounce off walls, decay catalytic boosts
/// 4. record statistics
/// 5. advance the step counter and evaluate termination
pub struct Simulation {
    config: SimConfig,
    population: Population,
    detector: Box<dyn CollisionDetector>,
    rng: StdRng,
    step: u64,
    state: RunState,
    stop: StopHandle,
    recorder: Recorder,
    initial_count: usize,
}

impl Simulation {
    /// Create a run with `config.particle_count` randomly placed reagents.
    ///
    /// Positions are rejection-sampled within `[-L/2 + r, L/2 - r]` on every
    /// active axis so no two particles overlap; velocity components are uniform
    /// in `[-v_max, v_max]`. In 2D the z components are zero.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);

        let props = config.reagent;
        let axes = config.dimension.axes();
        let lo = -config.half_box() + props.radius;
        let hi = config.half_box() - props.radius;
        let vmax = config.max_initial_speed;

        let mut particles: Vec<Particle> = Vec::with_capacity(config.particle_count);
        for id in 0..config.particle_count {
            let mut attempts = 0usize;
            let position = loop {
                if attempts >= MAX_PLACEMENT_ATTEMPTS {
                    return Err(Error::Placement(format!(
                        "failed to place particle {id} without overlap; try fewer particles or a smaller radius"
                    )));
                }
                attempts += 1;
                let mut r = Vec3::zeros();
                for k in 0..axes {
                    r[k] = rng.random_range(lo..=hi);
                }
                if !overlaps_existing(&particles, &r, props.radius) {
                    break r;
                }
            };

            let mut v = Vec3::zeros();
            for k in 0..axes {
                v[k] = rng.random_range(-vmax..=vmax);
            }

            particles.push(
                Particle::of_species(id, position, v, Species::Reagent, &props)?
                    .with_reaction_probability(config.reaction_probability)?,
            );
        }

        Self::assemble(config, particles, rng)
    }

    /// Create a run from explicit particles, e.g. a scripted scenario.
    ///
    /// `config.particle_count` is ignored; ids are reassigned densely. In 2D every
    /// particle must have zero z position and velocity.
    pub fn from_particles(config: SimConfig, particles: Vec<Particle>) -> Result<Self> {
        config.validate()?;
        if particles.is_empty() {
            return Err(Error::InvalidParam("at least one particle is required".into()));
        }
        if config.dimension == Dimension::Two
            && particles.iter().any(|p| p.position.z != 0.0 || p.velocity.z != 0.0)
        {
            return Err(Error::InvalidParam(
                "2D runs require zero z position and velocity".into(),
            ));
        }
        let rng = seeded_rng(config.seed);
        Self::assemble(config, particles, rng)
    }

    fn assemble(config: SimConfig, particles: Vec<Particle>, rng: StdRng) -> Result<Self> {
        let detector: Box<dyn CollisionDetector> = if config.neighbor_list {
            Box::new(NeighborList::new(config.neighbor_slack))
        } else {
            Box::new(AllPairs)
        };

        let fastest = particles.iter().map(Particle::speed).fold(0.0_f64, f64::max);
        if config.neighbor_list && 2.0 * fastest * config.dt > config.neighbor_slack {
            warn!(
                slack = config.neighbor_slack,
                max_step_displacement = fastest * config.dt,
                "neighbor slack is smaller than the closing distance of two particles in one step"
            );
        }

        let initial_count = particles.len();
        let mut sim = Self {
            config,
            population: Population::new(particles),
            detector,
            rng,
            step: 0,
            state: RunState::Running,
            stop: StopHandle::default(),
            recorder: Recorder::default(),
            initial_count,
        };
        sim.record_sample();
        info!(
            particles = initial_count,
            dimension = sim.config.dimension.axes(),
            detector = sim.detector.name(),
            "simulation initialised"
        );
        Ok(sim)
    }

    /// Replace the collision detector.
    pub fn with_detector(mut self, detector: Box<dyn CollisionDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// All stored particles, including any consumed this step and not yet flushed.
    pub fn particles(&self) -> &[Particle] {
        self.population.particles()
    }

    /// Mutable access for scripted setups; call between steps only.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        self.population.particles_mut()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// A handle that stops the run at the end of the current step.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Number of particles the run started with.
    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    pub fn samples(&self) -> &[StepSample] {
        self.recorder.samples()
    }

    pub fn reagent_count(&self) -> usize {
        self.population.reagent_count()
    }

    pub fn product_count(&self) -> usize {
        self.population.product_count()
    }

    /// Instantaneous kinetic temperature of the active particles.
    pub fn temperature(&self) -> f64 {
        stats::temperature(self.population.active(), self.config.boltzmann_constant)
    }

    /// Total kinetic energy of the active particles (diagnostic).
    pub fn kinetic_energy(&self) -> f64 {
        self.population.active().map(Particle::kinetic_energy).sum()
    }

    /// Total momentum of the active particles (diagnostic).
    pub fn total_momentum(&self) -> Vec3 {
        self.population.active().map(Particle::momentum).sum()
    }

    /// Live speed histogram with the configured binning.
    pub fn speed_histogram(&self) -> Result<SpeedHistogram> {
        SpeedHistogram::from_particles(
            self.population.active(),
            self.config.histogram_bin_width,
            self.config.histogram_max_speed,
        )
    }

    /// Maxwell-Boltzmann reference for the current mean mass and temperature.
    pub fn maxwell_boltzmann_curve(&self) -> Vec<(f64, f64)> {
        stats::maxwell_boltzmann_curve(
            stats::mean_mass(self.population.active()),
            self.temperature(),
            self.config.boltzmann_constant,
            self.config.dimension,
            self.config.histogram_bin_width,
            self.config.histogram_max_speed,
        )
    }

    /// Render snapshot of the active particles.
    pub fn frame(&self) -> Frame {
        Frame {
            step: self.step,
            box_size: self.config.box_size,
            particles: self.population.active().map(ParticleView::from).collect(),
        }
    }

    /// Plot snapshot of the current state.
    pub fn plot_sample(&self) -> Result<PlotSample> {
        Ok(PlotSample {
            step: self.step,
            reagents: self.reagent_count(),
            products: self.product_count(),
            temperature: self.temperature(),
            histogram: self.speed_histogram()?,
        })
    }

    /// Advance one step without observers.
    pub fn step(&mut self) -> Result<RunState> {
        self.step_with(&mut NullObserver)
    }

    /// Advance one step, pushing snapshots to `observer` before any physics runs.
    ///
    /// A stopped simulation is left untouched.
    pub fn step_with(&mut self, observer: &mut dyn Observer) -> Result<RunState> {
        if self.state != RunState::Running {
            return Ok(self.state);
        }

        let removed = self.population.flush_removals();
        if removed > 0 {
            debug!(step = self.step, removed, "flushed reacted particles");
        }

        observer.render(&self.frame());
        observer.plot(&self.plot_sample()?);

        let dt = self.config.dt;
        for p in self.population.particles_mut() {
            p.integrate(dt);
        }

        let pairs = self.detector.candidate_pairs(self.population.particles_mut());
        for (i, j) in pairs {
            self.resolve_pair(i, j)?;
        }

        self.resolve_walls();

        self.record_sample();
        self.step += 1;
        self.state = self.evaluate_termination();
        if let RunState::Stopped(reason) = self.state {
            info!(
                step = self.step,
                ?reason,
                reagents = self.reagent_count(),
                products = self.product_count(),
                "simulation stopped"
            );
        }
        Ok(self.state)
    }

    /// Step until the run stops, returning why.
    pub fn run_with(&mut self, observer: &mut dyn Observer) -> Result<StopReason> {
        loop {
            if let RunState::Stopped(reason) = self.step_with(observer)? {
                return Ok(reason);
            }
        }
    }

    pub fn run(&mut self) -> Result<StopReason> {
        self.run_with(&mut NullObserver)
    }

    /// Run to termination, then write the time series once into `config.export_dir`.
    pub fn run_and_export(&mut self, observer: &mut dyn Observer) -> Result<(StopReason, ExportPaths)> {
        let reason = self.run_with(observer)?;
        let dir = self.config.export_dir.clone();
        let paths = self.export_to(&dir)?;
        Ok((reason, paths))
    }

    /// Write the recorded time series into `dir`.
    ///
    /// Failure leaves the simulation state untouched.
    pub fn export_to(&self, dir: &Path) -> Result<ExportPaths> {
        export::export_run(
            dir,
            &self.config.export_basename,
            self.initial_count,
            self.recorder.samples(),
        )
    }

    // ============ Internal helpers ============

    /// Re-check and resolve one candidate pair against the current state.
    ///
    /// A pair is visited at most once per step; pairs touching a particle
    /// consumed earlier this step are skipped.
    fn resolve_pair(&mut self, i: usize, j: usize) -> Result<()> {
        if self.population.is_scheduled(i) || self.population.is_scheduled(j) {
            return Ok(());
        }
        let dt = self.config.dt;
        let (a, b) = self.population.pair_mut(i, j)?;
        if !is_closing_contact(a, b, dt) {
            return Ok(());
        }

        if reaction_succeeds(a, b, &mut self.rng) {
            react(a, b, &self.config.product, self.config.mass_rule);
            debug!(step = self.step, survivor = i, consumed = j, "reaction");
            self.population.schedule_removal(j)?;
        } else {
            elastic(a, b)?;
            debug!(step = self.step, i, j, "elastic collision");
        }
        Ok(())
    }

    /// Decay catalytic boosts, then reflect particles leaving the box.
    fn resolve_walls(&mut self) {
        let half_box = self.config.half_box();
        let dt = self.config.dt;
        let dim = self.config.dimension;
        let boost = self.config.catalyst_boost;
        for idx in 0..self.population.len() {
            if self.population.is_scheduled(idx) {
                continue;
            }
            let p = &mut self.population.particles_mut()[idx];
            p.decay_catalyst();
            let hits = wall_crossings(p, half_box, dt, dim);
            if bounce(p, hits) {
                p.arm_catalyst(boost);
            }
        }
    }

    fn record_sample(&mut self) {
        let sample = StepSample {
            step: self.step,
            reagents: self.reagent_count(),
            products: self.product_count(),
            temperature: self.temperature(),
        };
        self.recorder.record(sample);
    }

    fn evaluate_termination(&self) -> RunState {
        if self.reagent_count() == 0 {
            RunState::Stopped(StopReason::ReagentsExhausted)
        } else if self.stop.is_stopped() {
            RunState::Stopped(StopReason::StopSignal)
        } else if self.config.max_steps.is_some_and(|m| self.step >= m) {
            RunState::Stopped(StopReason::StepLimit)
        } else {
            RunState::Running
        }
    }
}

// ============ Utility helpers ============

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => SeedableRng::seed_from_u64(s),
        None => SeedableRng::seed_from_u64(rng().random()),
    }
}

fn overlaps_existing(existing: &[Particle], r: &Vec3, radius: f64) -> bool {
    existing.iter().any(|p| {
        let min = radius + p.radius;
        (p.position - r).norm_squared() < min * min
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> SimConfig {
        SimConfig {
            box_size: 10.0,
            dt: 1e-3,
            particle_count: 20,
            max_initial_speed: 5.0,
            reagent: crate::core::species::SpeciesProperties {
                radius: 0.2,
                mass: 1.0,
                color: crate::core::species::RED,
            },
            boltzmann_constant: 1.0,
            seed: Some(seed),
            ..SimConfig::default()
        }
    }

    #[test]
    fn make_small_sim_ok() -> Result<()> {
        let mut sim = Simulation::new(small_config(1234))?;
        assert_eq!(sim.particles().len(), 20);
        assert_eq!(sim.reagent_count(), 20);
        assert!(sim.kinetic_energy().is_finite());
        sim.step()?;
        assert_eq!(sim.step_count(), 1);
        assert_eq!(sim.samples().len(), 2);
        Ok(())
    }

    #[test]
    fn initial_particles_inside_box_without_overlap() -> Result<()> {
        let cfg = SimConfig {
            dimension: Dimension::Three,
            ..small_config(5)
        };
        let sim = Simulation::new(cfg)?;
        let limit = 5.0 - 0.2;
        for p in sim.particles() {
            assert!(p.position.iter().all(|x| x.abs() <= limit), "{:?}", p.position);
            assert!(p.velocity.iter().all(|v| v.abs() <= 5.0));
            assert_eq!(p.reaction_probability, 0.4);
        }
        for (i, a) in sim.particles().iter().enumerate() {
            for b in &sim.particles()[i + 1..] {
                assert!((a.position - b.position).norm() >= 0.4);
            }
        }
        Ok(())
    }

    #[test]
    fn two_dimensional_runs_stay_planar() -> Result<()> {
        let mut sim = Simulation::new(small_config(9))?;
        for _ in 0..50 {
            sim.step()?;
        }
        assert!(sim.particles().iter().all(|p| p.position.z == 0.0 && p.velocity.z == 0.0));
        Ok(())
    }

    #[test]
    fn same_seed_same_trajectory() -> Result<()> {
        let mut a = Simulation::new(small_config(77))?;
        let mut b = Simulation::new(small_config(77))?;
        for _ in 0..100 {
            a.step()?;
            b.step()?;
        }
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.position, pb.position);
            assert_eq!(pa.velocity, pb.velocity);
        }
        Ok(())
    }

    #[test]
    fn overcrowded_box_fails_placement() {
        let cfg = SimConfig {
            box_size: 1.0,
            particle_count: 50,
            reagent: crate::core::species::SpeciesProperties {
                radius: 0.4,
                mass: 1.0,
                color: crate::core::species::RED,
            },
            ..SimConfig::default()
        };
        assert!(matches!(Simulation::new(cfg), Err(Error::Placement(_))));
    }

    #[test]
    fn oversized_histogram_is_rejected_before_stepping() {
        let cfg = SimConfig {
            histogram_bin_width: 1e-30,
            ..small_config(4)
        };
        assert!(matches!(Simulation::new(cfg), Err(Error::InvalidParam(_))));
    }

    #[test]
    fn planar_check_on_explicit_particles() -> Result<()> {
        let p = Particle::new(0, Vec3::new(0.0, 0.0, 1.0), Vec3::zeros(), 0.5, 1.0)?;
        assert!(Simulation::from_particles(SimConfig::default(), vec![p]).is_err());
        Ok(())
    }

    #[test]
    fn step_limit_stops_run() -> Result<()> {
        let cfg = SimConfig {
            max_steps: Some(25),
            reaction_probability: 0.0,
            ..small_config(3)
        };
        let mut sim = Simulation::new(cfg)?;
        assert_eq!(sim.run()?, StopReason::StepLimit);
        assert_eq!(sim.step_count(), 25);
        // Further steps are no-ops.
        assert_eq!(sim.step()?, RunState::Stopped(StopReason::StepLimit));
        assert_eq!(sim.step_count(), 25);
        Ok(())
    }

    #[test]
    fn detectors_produce_identical_runs() -> Result<()> {
        let cfg = SimConfig {
            particle_count: 40,
            reaction_probability: 0.0,
            ..small_config(21)
        };
        let mut listed = Simulation::new(cfg.clone())?;
        let mut direct = Simulation::new(cfg)?.with_detector(Box::new(AllPairs));
        for _ in 0..300 {
            listed.step()?;
            direct.step()?;
        }
        for (a, b) in listed.particles().iter().zip(direct.particles()) {
            assert_eq!(a.velocity, b.velocity);
        }
        Ok(())
    }
}
