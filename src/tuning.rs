//! Data-driven game balance
//!
//! A flat record handed to the simulation at construction. Defaults match the
//! shipped desktop balance; a JSON override may change any subset of fields.

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};

/// Target hardware class, picked by the glue from the user agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeviceProfile {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceProfile::Desktop => "Desktop",
            DeviceProfile::Mobile => "Mobile",
        }
    }

    /// Classify a browser user agent string
    pub fn from_user_agent(ua: &str) -> Self {
        const MOBILE_MARKERS: [&str; 4] = ["iPhone", "iPad", "iPod", "Android"];
        let ua = ua.to_lowercase();
        if MOBILE_MARKERS
            .iter()
            .any(|marker| ua.contains(&marker.to_lowercase()))
        {
            DeviceProfile::Mobile
        } else {
            DeviceProfile::Desktop
        }
    }
}

/// Race balance. Distances are base pixels (multiplied by the arena scale),
/// speeds are per frame, times are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Cars to overtake for the win
    pub target_score: u32,
    /// Game speed at score 0
    pub base_speed: f32,
    /// Game speed gained per point
    pub speed_scaling: f32,
    /// Initial gap between spawn attempts
    pub spawn_interval_ms: f32,
    /// Floor for the shrinking spawn interval
    pub min_spawn_interval_ms: f32,
    /// Interval shrink per point, applied after every spawn
    pub spawn_interval_reduction_ms: f32,
    /// Chance that a spawn attempt releases two cars instead of one
    pub double_spawn_chance: f32,
    /// Inset applied to both boxes before the overlap test
    pub collision_margin: f32,
    /// Longest frame the simulation will accept
    pub max_frame_ms: f32,
    /// Player lateral speed
    pub player_speed: f32,
    /// Obstacle speed range at game speed 1.0
    pub obstacle_speed_min: f32,
    pub obstacle_speed_range: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            target_score: 38,
            base_speed: 1.2,
            speed_scaling: 0.025,
            spawn_interval_ms: 1200.0,
            min_spawn_interval_ms: 600.0,
            spawn_interval_reduction_ms: 15.0,
            double_spawn_chance: 0.4,
            collision_margin: 8.0,
            max_frame_ms: 50.0,
            player_speed: 5.0,
            obstacle_speed_min: 3.0,
            obstacle_speed_range: 2.0,
        }
    }
}

impl Tuning {
    /// Defaults for a device class (touch devices get a gentler spawn rate)
    pub fn for_profile(profile: DeviceProfile) -> Self {
        match profile {
            DeviceProfile::Desktop => Self::default(),
            DeviceProfile::Mobile => Self {
                spawn_interval_ms: 1400.0,
                ..Self::default()
            },
        }
    }

    /// Game speed for a given score (linear ramp)
    #[inline]
    pub fn speed_for_score(&self, score: u32) -> f32 {
        self.base_speed + score as f32 * self.speed_scaling
    }

    /// Parse a JSON override; missing fields keep their defaults
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let tuning: Tuning = serde_json::from_str(json).context("malformed tuning JSON")?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse an override on top of a profile, falling back to the profile on error
    pub fn from_json_or_profile(json: &str, profile: DeviceProfile) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("Ignoring tuning override: {err:#}");
                Self::for_profile(profile)
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.target_score > 0, "target_score must be > 0");
        ensure!(self.base_speed > 0.0, "base_speed must be > 0");
        ensure!(
            self.speed_scaling >= 0.0,
            "speed_scaling must be >= 0 (difficulty may not drop as score rises)"
        );
        ensure!(
            self.min_spawn_interval_ms > 0.0,
            "min_spawn_interval_ms must be > 0"
        );
        ensure!(
            self.spawn_interval_ms >= self.min_spawn_interval_ms,
            "spawn_interval_ms ({}) is below min_spawn_interval_ms ({})",
            self.spawn_interval_ms,
            self.min_spawn_interval_ms
        );
        ensure!(
            self.spawn_interval_reduction_ms >= 0.0,
            "spawn_interval_reduction_ms must be >= 0"
        );
        ensure!(
            (0.0..=1.0).contains(&self.double_spawn_chance),
            "double_spawn_chance must be within [0, 1]"
        );
        ensure!(self.collision_margin >= 0.0, "collision_margin must be >= 0");
        ensure!(self.max_frame_ms > 0.0, "max_frame_ms must be > 0");
        ensure!(self.player_speed > 0.0, "player_speed must be > 0");
        ensure!(
            self.obstacle_speed_min > 0.0 && self.obstacle_speed_range >= 0.0,
            "obstacle speeds must be positive"
        );
        Ok(())
    }
}
