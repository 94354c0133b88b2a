//! Victory-screen fireworks show
//!
//! The director runs on its own frame loop, separate from the race clock. It
//! owns every live firework and the stop flag the victory overlay uses to end
//! the show. Each tick first checks that it is still wanted (flag not raised,
//! drawing surface still attached) and reports `Schedule::Stop` otherwise, so
//! a dismissed overlay can never leave a loop drawing into a detached canvas.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::FireworksTuning;
use super::firework::Firework;
use crate::platform::{Schedule, StopFlag};

#[derive(Debug)]
pub struct FireworksDirector {
    pub width: f32,
    pub height: f32,
    pub tuning: FireworksTuning,
    /// Live fireworks in launch order
    pub fireworks: Vec<Firework>,
    /// Shells launched since the show began
    pub launched: u32,
    /// Ticks run since the show began
    pub ticks: u64,
    stop: StopFlag,
    rng: Pcg32,
}

impl FireworksDirector {
    pub fn new(width: f32, height: f32, tuning: FireworksTuning, seed: u64) -> Self {
        log::info!("Fireworks show started on a {width}x{height} surface");
        Self {
            width,
            height,
            tuning,
            fireworks: Vec::new(),
            launched: 0,
            ticks: 0,
            stop: StopFlag::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Handle for whoever may need to end the show
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Cancel the loop; the next tick returns `Stop` without doing anything
    pub fn stop(&mut self) {
        if !self.stop.is_stopped() {
            log::info!("Fireworks show stopped after {} launches", self.launched);
        }
        self.stop.stop();
    }

    /// Stop and release every firework
    pub fn teardown(&mut self) {
        self.stop();
        self.fireworks.clear();
    }

    /// Total particles currently alive across all fireworks
    pub fn particle_count(&self) -> usize {
        self.fireworks.iter().map(|f| f.particles.len()).sum()
    }

    /// One frame of the show.
    ///
    /// `surface_attached` is false once the canvas has been removed from the
    /// page; the director then stops itself instead of rescheduling.
    pub fn tick(&mut self, surface_attached: bool) -> Schedule {
        if self.stop.is_stopped() {
            return Schedule::Stop;
        }
        if !surface_attached {
            log::warn!("Fireworks surface detached; ending show");
            self.teardown();
            return Schedule::Stop;
        }

        self.ticks += 1;

        if self.rng.random::<f32>() < self.tuning.spawn_chance {
            let firework = Firework::launch(self.width, self.height, &self.tuning, &mut self.rng);
            self.fireworks.push(firework);
            self.launched += 1;
        }

        let tuning = &self.tuning;
        let rng = &mut self.rng;
        for firework in &mut self.fireworks {
            firework.update(tuning, rng);
        }
        self.fireworks.retain(|f| !f.is_spent());

        Schedule::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fireworks::FireworkStage;
    use glam::Vec2;

    fn director() -> FireworksDirector {
        FireworksDirector::new(800.0, 600.0, FireworksTuning::default(), 77)
    }

    #[test]
    fn test_launches_at_roughly_spawn_chance() {
        let mut d = director();
        for _ in 0..4000 {
            assert_eq!(d.tick(true), Schedule::Continue);
        }
        // 0.05 per tick over 4000 ticks, expect ~200
        assert!(d.launched > 140 && d.launched < 260, "launched {}", d.launched);
        assert_eq!(d.ticks, 4000);
    }

    #[test]
    fn test_removes_only_spent_fireworks() {
        let mut d = director();
        d.tuning.spawn_chance = 0.0;
        // One rising, one about to burst, one already spent
        d.fireworks.push(Firework::new(Vec2::new(10.0, 600.0), 100.0, 15.0, 0.0));
        d.fireworks.push(Firework::new(Vec2::new(20.0, 110.0), 100.0, 15.0, 90.0));
        let mut spent = Firework::new(Vec2::new(30.0, 50.0), 100.0, 15.0, 180.0);
        spent.exploded = true;
        d.fireworks.push(spent);

        d.tick(true);
        assert_eq!(d.fireworks.len(), 2);
        assert_eq!(d.fireworks[0].stage(), FireworkStage::Rising);
        assert_eq!(d.fireworks[1].stage(), FireworkStage::Exploded);

        // Run until everything is spent; each removal only once spent
        for _ in 0..300 {
            d.tick(true);
            assert!(d.fireworks.iter().all(|f| !f.is_spent()));
        }
        assert!(d.fireworks.is_empty());
        assert_eq!(d.particle_count(), 0);
    }

    #[test]
    fn test_detached_surface_stops_show() {
        let mut d = director();
        for _ in 0..200 {
            d.tick(true);
        }
        assert_eq!(d.tick(false), Schedule::Stop);
        assert!(d.is_stopped());
        assert!(d.fireworks.is_empty());
        let ticks = d.ticks;
        // Stays stopped even if the surface comes back
        assert_eq!(d.tick(true), Schedule::Stop);
        assert_eq!(d.ticks, ticks);
    }

    #[test]
    fn test_external_stop() {
        let mut d = director();
        let flag = d.stop_flag();
        assert_eq!(d.tick(true), Schedule::Continue);
        flag.stop();
        assert_eq!(d.tick(true), Schedule::Stop);
        assert!(d.is_stopped());
    }

    #[test]
    fn test_mobile_tuning_launches_less() {
        let mut desktop = director();
        let mut mobile = FireworksDirector::new(
            800.0,
            600.0,
            FireworksTuning::for_profile(crate::tuning::DeviceProfile::Mobile),
            77,
        );
        for _ in 0..4000 {
            desktop.tick(true);
            mobile.tick(true);
        }
        assert!(mobile.launched < desktop.launched);
    }
}
