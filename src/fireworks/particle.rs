//! A single spark thrown out by an exploding firework

use glam::Vec2;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life, starts at 1.0 and doubles as the draw alpha
    pub alpha: f32,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self { pos, vel, alpha: 1.0 }
    }

    /// Spark leaving `origin` in a uniformly random direction
    pub fn burst(origin: Vec2, speed_min: f32, speed_range: f32, rng: &mut impl Rng) -> Self {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let speed = speed_min + rng.random::<f32>() * speed_range;
        Self::new(origin, Vec2::from_angle(angle) * speed)
    }

    /// One tick: move, fall, fade
    pub fn update(&mut self, gravity: f32, alpha_decay: f32) {
        self.pos += self.vel;
        self.vel.y += gravity;
        self.alpha -= alpha_decay;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alpha > 0.0
    }

    /// Alpha to draw with, never negative
    #[inline]
    pub fn visible_alpha(&self) -> f32 {
        self.alpha.clamp(0.0, 1.0)
    }
}
