//! Run configuration, loaded from TOML or built in code.
//!
//! Every field has a default, so a config file only needs to name what it changes:
//!
//! ```toml
//! box_size = 20.0
//! particle_count = 50
//! dimension = 3
//! reaction_probability = 0.25
//!
//! [reagent]
//! radius = 0.5
//! mass = 1.0
//! color = [1.0, 0.0, 0.0]
//! ```

use crate::core::resolver::MassRule;
use crate::core::species::SpeciesProperties;
use crate::core::stats::MAX_HISTOGRAM_BINS;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Spatial dimensionality of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimension {
    #[default]
    Two,
    Three,
}

impl Dimension {
    /// Number of active axes.
    #[inline]
    pub fn axes(self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }
}

impl TryFrom<u8> for Dimension {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            2 => Ok(Dimension::Two),
            3 => Ok(Dimension::Three),
            other => Err(format!("dimension must be 2 or 3, got {other}")),
        }
    }
}

impl From<Dimension> for u8 {
    fn from(d: Dimension) -> Self {
        d.axes() as u8
    }
}

/// Complete description of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Side length L of the box, centred on the origin.
    pub box_size: f64,
    /// Fixed time increment per step.
    pub dt: f64,
    /// Number of reagent particles created at start.
    pub particle_count: usize,
    /// Initial velocity components are drawn uniformly from [-v, v].
    pub max_initial_speed: f64,
    pub dimension: Dimension,
    pub reagent: SpeciesProperties,
    /// Radius and colour of the reaction product; its mass follows `mass_rule`.
    pub product: SpeciesProperties,
    /// Baseline reaction probability per reagent-reagent collision.
    pub reaction_probability: f64,
    /// Steps of catalytic boost granted by a wall hit (0 disables it).
    pub catalyst_boost: u32,
    pub mass_rule: MassRule,
    /// Restrict collision checks to per-particle neighbour lists.
    pub neighbor_list: bool,
    /// Extra distance beyond contact within which particles count as neighbours.
    pub neighbor_slack: f64,
    pub boltzmann_constant: f64,
    pub histogram_bin_width: f64,
    /// Upper edge of the speed histogram; the lower edge is 0.
    pub histogram_max_speed: f64,
    /// RNG seed; unset means a fresh, non-reproducible run.
    pub seed: Option<u64>,
    /// Optional hard cap on the number of steps.
    pub max_steps: Option<u64>,
    pub export_dir: PathBuf,
    pub export_basename: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            box_size: 24.0,
            dt: 1e-3,
            particle_count: 100,
            max_initial_speed: 40.0,
            dimension: Dimension::Two,
            reagent: SpeciesProperties::reagent_default(),
            product: SpeciesProperties::product_default(),
            reaction_probability: 0.4,
            catalyst_boost: 0,
            mass_rule: MassRule::Sum,
            neighbor_list: true,
            neighbor_slack: 2.5,
            boltzmann_constant: 1.38e-23,
            histogram_bin_width: 4.0,
            histogram_max_speed: 40.0,
            seed: None,
            max_steps: None,
            export_dir: PathBuf::from("dados"),
            export_basename: "dadosNum".to_string(),
        }
    }
}

impl SimConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: SimConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Half the box side; walls sit at `±half_box()` on every active axis.
    #[inline]
    pub fn half_box(&self) -> f64 {
        0.5 * self.box_size
    }

    /// Check every numeric invariant the engine relies on.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, v: f64) -> Result<()> {
            if !v.is_finite() || v <= 0.0 {
                return Err(Error::InvalidParam(format!("{name} must be finite and > 0")));
            }
            Ok(())
        }

        positive("box_size", self.box_size)?;
        positive("dt", self.dt)?;
        positive("reagent.radius", self.reagent.radius)?;
        positive("reagent.mass", self.reagent.mass)?;
        positive("product.radius", self.product.radius)?;
        positive("boltzmann_constant", self.boltzmann_constant)?;
        positive("histogram_bin_width", self.histogram_bin_width)?;
        positive("histogram_max_speed", self.histogram_max_speed)?;

        if self.particle_count == 0 {
            return Err(Error::InvalidParam("particle_count must be > 0".into()));
        }
        if !self.max_initial_speed.is_finite() || self.max_initial_speed < 0.0 {
            return Err(Error::InvalidParam(
                "max_initial_speed must be finite and >= 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.reaction_probability) {
            return Err(Error::InvalidParam(
                "reaction_probability must lie in [0, 1]".into(),
            ));
        }
        if !self.neighbor_slack.is_finite() || self.neighbor_slack < 0.0 {
            return Err(Error::InvalidParam(
                "neighbor_slack must be finite and >= 0".into(),
            ));
        }
        if self.box_size < 2.0 * self.reagent.radius.max(self.product.radius) {
            return Err(Error::InvalidParam(
                "box_size must be at least one particle diameter".into(),
            ));
        }
        if self.histogram_bin_width > self.histogram_max_speed {
            return Err(Error::InvalidParam(
                "histogram_bin_width cannot exceed histogram_max_speed".into(),
            ));
        }
        let bins = (self.histogram_max_speed / self.histogram_bin_width).floor();
        if bins > MAX_HISTOGRAM_BINS as f64 {
            return Err(Error::InvalidParam(format!(
                "histogram_bin_width is too small: at most {MAX_HISTOGRAM_BINS} bins are allowed"
            )));
        }
        Ok(())
    }
}
