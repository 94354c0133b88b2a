//! Idle/demo mode - AI drives the player's car
//!
//! Samples positions across the road, rates each by how much rival traffic
//! is bearing down on it, and holds the arrow key toward the best one.

use super::state::{GameState, TickInput};

/// Candidate positions sampled across the road
const SAMPLES: usize = 24;
/// How far ahead of the player (in car heights) rivals count as a threat
const LOOKAHEAD_CARS: f32 = 3.5;
/// Sideways clearance wanted around a rival (fraction of car width)
const SIDE_PADDING: f32 = 0.35;

/// Danger of parking the car's left edge at `x`
fn danger_at(state: &GameState, x: f32) -> f32 {
    let player = &state.player.body;
    let pad = player.width * SIDE_PADDING;
    let lane_left = x - pad;
    let lane_right = x + player.width + pad;
    let horizon = player.top() - player.height * LOOKAHEAD_CARS;

    state
        .obstacles
        .iter()
        .filter(|o| o.body.bottom() > horizon && o.body.top() < player.bottom())
        .filter(|o| o.body.right() > lane_left && o.body.left() < lane_right)
        .map(|o| {
            // Nearer rivals weigh more; rivals level with the car weigh most
            let gap = (player.top() - o.body.bottom()).max(0.0);
            1.0 / (1.0 + gap / player.height)
        })
        .sum()
}

/// Left edge the autopilot wants to reach
pub fn safest_x(state: &GameState) -> f32 {
    let player = &state.player.body;
    let max_x = (state.arena.width - player.width).max(0.0);
    let current = player.x;

    (0..=SAMPLES)
        .map(|i| max_x * i as f32 / SAMPLES as f32)
        .map(|x| {
            // Small travel cost so it doesn't wander when everything is clear
            let travel = (x - current).abs() / state.arena.width.max(1.0) * 0.05;
            (x, danger_at(state, x) + travel)
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(x, _)| x)
        .unwrap_or(current)
}

/// Input for this frame
pub fn steer(state: &GameState) -> TickInput {
    let target = safest_x(state);
    let x = state.player.body.x;
    let dead_zone = state.player.speed;
    TickInput {
        left: target < x - dead_zone,
        right: target > x + dead_zone,
        pointer_x: None,
    }
}
