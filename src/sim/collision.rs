//! Collision detection between cars
//!
//! Each box is shrunk by a margin before the strict overlap test, so cars
//! that touch only inside that margin brush past each other.

use super::geom::Aabb;
use super::state::{Obstacle, Player};

/// Result of a collision sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Index into the obstacle list
    pub obstacle_index: usize,
    /// Id of the obstacle that was hit
    pub obstacle_id: u32,
    /// Centre of the overlap region (for crash effects)
    pub point: glam::Vec2,
}

/// Margin-tolerant overlap test between two boxes
pub fn boxes_collide(a: &Aabb, b: &Aabb, margin: f32) -> bool {
    a.inset(margin).overlaps(&b.inset(margin))
}

/// Find the first obstacle (in spawn order) touching the player
pub fn find_collision(player: &Player, obstacles: &[Obstacle], margin: f32) -> Option<CollisionResult> {
    let body = player.body;
    obstacles
        .iter()
        .enumerate()
        .find(|(_, obstacle)| boxes_collide(&body, &obstacle.body, margin))
        .map(|(obstacle_index, obstacle)| {
            let a = body.inset(margin);
            let b = obstacle.body.inset(margin);
            let left = a.left().max(b.left());
            let right = a.right().min(b.right());
            let top = a.top().max(b.top());
            let bottom = a.bottom().min(b.bottom());
            CollisionResult {
                obstacle_index,
                obstacle_id: obstacle.id,
                point: glam::Vec2::new((left + right) / 2.0, (top + bottom) / 2.0),
            }
        })
}
