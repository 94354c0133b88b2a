//! Rising shell that bursts into particles at its target altitude

use glam::Vec2;
use rand::Rng;

use super::FireworksTuning;
use super::particle::Particle;

/// Lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireworkStage {
    /// Climbing toward `target_y`
    Rising,
    /// Burst happened, some particles still glowing
    Exploded,
    /// Burst happened and every particle has faded
    Spent,
}

#[derive(Debug, Clone)]
pub struct Firework {
    pub pos: Vec2,
    /// Altitude (canvas y, downward) at which the shell bursts
    pub target_y: f32,
    /// Upward distance per tick
    pub speed: f32,
    /// Colour hue in degrees, shared by the shell and its sparks
    pub hue: f32,
    pub exploded: bool,
    pub particles: Vec<Particle>,
}

impl Firework {
    pub fn new(pos: Vec2, target_y: f32, speed: f32, hue: f32) -> Self {
        Self {
            pos,
            target_y,
            speed,
            hue,
            exploded: false,
            particles: Vec::new(),
        }
    }

    /// Launch from the bottom edge at a random x, aiming for the upper half
    pub fn launch(width: f32, height: f32, tuning: &FireworksTuning, rng: &mut impl Rng) -> Self {
        let x = rng.random::<f32>() * width;
        let target_y = rng.random::<f32>() * height * 0.5;
        let speed = tuning.rise_speed_min + rng.random::<f32>() * tuning.rise_speed_range;
        let hue = rng.random::<f32>() * 360.0;
        Self::new(Vec2::new(x, height), target_y, speed, hue)
    }

    pub fn stage(&self) -> FireworkStage {
        match (self.exploded, self.particles.is_empty()) {
            (false, _) => FireworkStage::Rising,
            (true, false) => FireworkStage::Exploded,
            (true, true) => FireworkStage::Spent,
        }
    }

    #[inline]
    pub fn is_spent(&self) -> bool {
        self.stage() == FireworkStage::Spent
    }

    /// One tick of the state machine
    pub fn update(&mut self, tuning: &FireworksTuning, rng: &mut impl Rng) {
        if !self.exploded {
            self.pos.y -= self.speed;
            if self.pos.y <= self.target_y {
                self.explode(tuning, rng);
            }
        } else {
            for particle in &mut self.particles {
                particle.update(tuning.gravity, tuning.alpha_decay);
            }
            self.particles.retain(Particle::is_alive);
        }
    }

    fn explode(&mut self, tuning: &FireworksTuning, rng: &mut impl Rng) {
        self.exploded = true;
        let origin = self.pos;
        self.particles.extend((0..tuning.burst_count).map(|_| {
            Particle::burst(
                origin,
                tuning.particle_speed_min,
                tuning.particle_speed_range,
                rng,
            )
        }));
        log::debug!(
            "Firework burst at ({:.0}, {:.0}) with {} particles",
            origin.x,
            origin.y,
            self.particles.len()
        );
    }
}
