//! Lane Racer - a vertically scrolling lane-avoidance arcade racer
//!
//! Core modules:
//! - `sim`: Frame-driven race simulation (spawning, difficulty, collisions, win/lose)
//! - `fireworks`: Victory-screen particle effect with its own clock
//! - `renderer`: Shape composition for a 2D canvas
//! - `platform`: Frame-loop scheduling and cancellation
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod fireworks;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use settings::Settings;
pub use tuning::{DeviceProfile, Tuning};

/// Game geometry constants (base pixels at scale 1.0)
pub mod consts {
    /// Canvas width the scale factor is measured against
    pub const BASE_CANVAS_WIDTH: f32 = 800.0;
    /// Canvas aspect ratio is 4:3
    pub const CANVAS_ASPECT_W: f32 = 4.0;
    pub const CANVAS_ASPECT_H: f32 = 3.0;

    /// Car body size, shared by the player and obstacles
    pub const CAR_WIDTH: f32 = 50.0;
    pub const CAR_HEIGHT: f32 = 80.0;
    /// Gap between the player's rear wing and the bottom edge
    pub const PLAYER_BOTTOM_GAP: f32 = 20.0;

    /// Road has three lanes, split by two dashed lines
    pub const LANE_COUNT: u32 = 3;
    pub const LANE_DASH_SPACING: f32 = 50.0;
    pub const LANE_DASH_LENGTH: f32 = 30.0;
    pub const LANE_DASH_WIDTH: f32 = 4.0;

    /// Nominal frame duration used by headless runs (60 Hz)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
}
