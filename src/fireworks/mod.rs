//! Fireworks particle effect shown on the victory screen
//!
//! Three layers, each owning the next: `FireworksDirector` owns the live
//! `Firework`s, each `Firework` owns the `Particle`s of its burst.

pub mod director;
pub mod firework;
pub mod particle;

pub use director::FireworksDirector;
pub use firework::{Firework, FireworkStage};
pub use particle::Particle;

use serde::{Deserialize, Serialize};

use crate::tuning::DeviceProfile;

/// Fireworks balance (per-tick units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireworksTuning {
    /// Chance of launching a new shell each tick
    pub spawn_chance: f32,
    /// Particles per burst
    pub burst_count: u32,
    pub rise_speed_min: f32,
    pub rise_speed_range: f32,
    pub particle_speed_min: f32,
    pub particle_speed_range: f32,
    /// Added to particle vertical velocity each tick
    pub gravity: f32,
    /// Subtracted from particle life each tick
    pub alpha_decay: f32,
}

impl Default for FireworksTuning {
    fn default() -> Self {
        Self {
            spawn_chance: 0.05,
            burst_count: 50,
            rise_speed_min: 15.0,
            rise_speed_range: 5.0,
            particle_speed_min: 2.0,
            particle_speed_range: 5.0,
            gravity: 0.1,
            alpha_decay: 0.01,
        }
    }
}

impl FireworksTuning {
    /// Phones get a sparser show
    pub fn for_profile(profile: DeviceProfile) -> Self {
        match profile {
            DeviceProfile::Desktop => Self::default(),
            DeviceProfile::Mobile => Self {
                spawn_chance: 0.03,
                ..Self::default()
            },
        }
    }
}
