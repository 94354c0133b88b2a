//! Race simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering,
//! audio and DOM concerns:
//! - Frame-driven: one `advance` call per display frame
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - Changes are reported as `GameEvent`s, never acted on directly

pub mod autopilot;
pub mod collision;
pub mod geom;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, boxes_collide, find_collision};
pub use geom::{Aabb, Arena};
pub use state::{
    GameEvent, GamePhase, GameState, Obstacle, Player, Snapshot, Team, TickInput,
};
pub use tick::{advance, clamp_frame_ms};
