use serde::{Deserialize, Serialize};

/// Chemical identity of a particle.
///
/// Two `Reagent` particles may react into one `Product`; everything else
/// collides elastically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Species {
    #[default]
    Reagent,
    Product,
}

impl Species {
    /// Whether this species takes part in the A + A -> B reaction.
    #[inline]
    pub fn is_reactive(self) -> bool {
        matches!(self, Species::Reagent)
    }
}

/// RGB colour handed to the render sink, components in [0, 1].
pub type Color = [f32; 3];

pub const RED: Color = [1.0, 0.0, 0.0];
pub const PURPLE: Color = [0.4, 0.2, 0.6];

/// Physical and display properties shared by every particle of one species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProperties {
    /// Hard-sphere radius (> 0).
    pub radius: f64,
    /// Mass (> 0). Ignored for the product, whose mass comes from the reaction's mass rule.
    pub mass: f64,
    pub color: Color,
}

impl SpeciesProperties {
    pub fn reagent_default() -> Self {
        Self {
            radius: 0.1,
            mass: 4e-23,
            color: RED,
        }
    }

    pub fn product_default() -> Self {
        Self {
            radius: 0.1,
            mass: 8e-23,
            color: PURPLE,
        }
    }
}
