//! Interfaces for rendering and plotting collaborators.
//!
//! The engine pushes read-only snapshots once per step, before any physics of
//! that step runs. Implementors never get mutable access to particle state.

use crate::core::particle::{Particle, Vec3};
use crate::core::species::{Color, Species};
use crate::core::stats::SpeedHistogram;

/// What a renderer needs to draw one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleView {
    pub id: usize,
    pub position: Vec3,
    /// Direction indicator (velocity arrow).
    pub velocity: Vec3,
    pub radius: f64,
    pub color: Color,
    pub species: Species,
}

impl From<&Particle> for ParticleView {
    fn from(p: &Particle) -> Self {
        Self {
            id: p.id,
            position: p.position,
            velocity: p.velocity,
            radius: p.radius,
            color: p.color,
            species: p.species,
        }
    }
}

/// Per-step render snapshot of the active particles.
#[derive(Debug, Clone)]
pub struct Frame {
    pub step: u64,
    pub box_size: f64,
    pub particles: Vec<ParticleView>,
}

/// Per-step plot data: concentration, temperature and the live speed histogram.
#[derive(Debug, Clone)]
pub struct PlotSample {
    pub step: u64,
    pub reagents: usize,
    pub products: usize,
    pub temperature: f64,
    pub histogram: SpeedHistogram,
}

/// Receives snapshots from the stepper. Both hooks default to doing nothing.
pub trait Observer {
    fn render(&mut self, _frame: &Frame) {}

    fn plot(&mut self, _sample: &PlotSample) {}
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Observer that keeps every snapshot in memory; handy for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub frames: Vec<Frame>,
    pub plots: Vec<PlotSample>,
}

impl Observer for RecordingObserver {
    fn render(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }

    fn plot(&mut self, sample: &PlotSample) {
        self.plots.push(sample.clone());
    }
}
