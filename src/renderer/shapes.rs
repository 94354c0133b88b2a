//! Shape composition for 2D primitives
//!
//! Turns simulation state into a flat, ordered list of fills. Later shapes
//! paint over earlier ones.

use glam::Vec2;

use super::palette::{self, Color, Livery, colors};
use crate::consts::*;
use crate::fireworks::{Firework, FireworksDirector};
use crate::sim::{Aabb, Arena, Snapshot};

/// Firework shell streak size (canvas px)
const SHELL_SIZE: Vec2 = Vec2::new(2.0, 10.0);
/// Spark size (canvas px)
const SPARK_SIZE: Vec2 = Vec2::new(2.0, 2.0);

/// One filled primitive in canvas pixels
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { pos: Vec2, size: Vec2, color: Color },
    Polygon { points: Vec<Vec2>, color: Color },
    Circle { center: Vec2, radius: f32, color: Color },
    Text { pos: Vec2, text: String, size: f32, color: Color },
}

impl Shape {
    pub fn color(&self) -> Color {
        match self {
            Shape::Rect { color, .. }
            | Shape::Polygon { color, .. }
            | Shape::Circle { color, .. }
            | Shape::Text { color, .. } => *color,
        }
    }
}

fn rect(pos: Vec2, size: Vec2, color: Color) -> Shape {
    Shape::Rect { pos, size, color }
}

/// Road surface plus the two dashed lane dividers
pub fn road(arena: &Arena, lane_offset: f32) -> Vec<Shape> {
    let mut shapes = vec![rect(Vec2::ZERO, Vec2::new(arena.width, arena.height), colors::ROAD)];

    let spacing = LANE_DASH_SPACING * arena.scale;
    if spacing <= 0.0 {
        return shapes;
    }
    let dash = Vec2::new(LANE_DASH_WIDTH * arena.scale, LANE_DASH_LENGTH * arena.scale);
    let lane_width = arena.width / LANE_COUNT as f32;

    for lane in 1..LANE_COUNT {
        let x = lane_width * lane as f32 - dash.x / 2.0;
        let mut y = lane_offset - spacing;
        while y < arena.height {
            shapes.push(rect(Vec2::new(x, y), dash, colors::LANE_MARKING));
            y += spacing;
        }
    }
    shapes
}

/// Top-down open-wheel car filling `body`. The player's car gets a helmet.
pub fn car(body: &Aabb, livery: &Livery, helmet: Option<Color>) -> Vec<Shape> {
    let (x, y, w, h) = (body.x, body.y, body.width, body.height);
    // Point at fractions of the body box
    let at = |fx: f32, fy: f32| Vec2::new(x + w * fx, y + h * fy);

    let mut shapes = vec![
        Shape::Polygon {
            points: vec![
                at(0.45, 0.0),
                at(0.55, 0.0),
                at(0.8, 0.25),
                at(0.85, 0.6),
                at(0.7, 0.95),
                at(0.3, 0.95),
                at(0.15, 0.6),
                at(0.2, 0.25),
            ],
            color: livery.main,
        },
        // Sidepods
        Shape::Polygon {
            points: vec![at(0.3, 0.3), at(0.9, 0.3), at(0.85, 0.7), at(0.25, 0.7)],
            color: livery.second,
        },
        // Front and rear wings
        rect(at(0.2, 0.0), Vec2::new(w * 0.6, h * 0.05), livery.accent),
        rect(at(0.2, 0.85), Vec2::new(w * 0.6, h * 0.04), livery.accent),
        // Cockpit
        Shape::Polygon {
            points: vec![at(0.4, 0.25), at(0.6, 0.25), at(0.55, 0.35), at(0.45, 0.35)],
            color: livery.cockpit,
        },
    ];

    if let Some(color) = helmet {
        shapes.push(Shape::Circle {
            center: at(0.5, 0.32),
            radius: w * 0.1,
            color,
        });
    }

    let wheel = Vec2::new(w * 0.1, h * 0.15);
    for (fx, fy) in [(0.1, 0.15), (0.8, 0.15), (0.1, 0.6), (0.8, 0.6)] {
        shapes.push(rect(at(fx, fy), wheel, colors::CARBON));
    }
    shapes
}

/// Full race frame: road, rivals in spawn order, player, then HUD
pub fn scene(snapshot: &Snapshot<'_>, speed_kmh: Option<u32>) -> Vec<Shape> {
    let arena = snapshot.arena;
    let mut shapes = road(&arena, snapshot.lane_offset);

    for obstacle in snapshot.obstacles {
        shapes.extend(car(&obstacle.body, &palette::livery(obstacle.team), None));
    }
    shapes.extend(car(
        &snapshot.player.body,
        &palette::PLAYER_LIVERY,
        Some(colors::HELMET),
    ));

    if let Some(kmh) = speed_kmh {
        shapes.push(Shape::Text {
            pos: Vec2::new(20.0, 60.0) * arena.scale,
            text: crate::ui::speed_text(kmh),
            size: 20.0 * arena.scale,
            color: colors::HUD_TEXT,
        });
    }
    shapes
}

/// Shell streak while rising, then one square per live spark
pub fn firework(firework: &Firework) -> Vec<Shape> {
    let mut shapes = Vec::with_capacity(firework.particles.len() + 1);
    if !firework.exploded {
        shapes.push(rect(
            firework.pos,
            SHELL_SIZE,
            palette::hsl(firework.hue, 1.0, 0.5, 1.0),
        ));
    }
    shapes.extend(firework.particles.iter().map(|p| {
        rect(
            p.pos,
            SPARK_SIZE,
            palette::hsl(firework.hue, 1.0, 0.5, p.visible_alpha()),
        )
    }));
    shapes
}

/// One frame of the fireworks overlay: the fading veil, then every firework
pub fn fireworks(director: &FireworksDirector) -> Vec<Shape> {
    let mut shapes = vec![rect(
        Vec2::ZERO,
        Vec2::new(director.width, director.height),
        colors::FIREWORKS_FADE,
    )];
    for fw in &director.fireworks {
        shapes.extend(firework(fw));
    }
    shapes
}
