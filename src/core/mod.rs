//! Physics core: particle state, collision detection and response, population
//! bookkeeping, statistics and the fixed-step stepper.

pub mod detector;
pub mod particle;
pub mod population;
pub mod resolver;
pub mod sim;
pub mod sink;
pub mod species;
pub mod stats;

pub use detector::{AllPairs, CollisionDetector, Contact, NeighborList};
pub use particle::{Particle, Vec3};
pub use population::Population;
pub use resolver::MassRule;
pub use sim::{RunState, Simulation, StopHandle, StopReason};
pub use sink::{Frame, NullObserver, Observer, ParticleView, PlotSample, RecordingObserver};
pub use species::{Species, SpeciesProperties};
pub use stats::{SpeedHistogram, StepSample};
