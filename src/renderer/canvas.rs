//! Canvas 2D painter
//!
//! Draws a `Shape` list onto an `HtmlCanvasElement`, in order.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::palette::css;
use super::shapes::Shape;
use crate::sim::Arena;

pub struct CanvasPainter {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasPainter {
    /// None if the element has no 2D context
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Still part of the document
    pub fn is_attached(&self) -> bool {
        self.canvas.is_connected()
    }

    /// Match the backing store to the arena size
    pub fn resize(&self, arena: &Arena) {
        self.canvas.set_width(arena.width.round().max(1.0) as u32);
        self.canvas.set_height(arena.height.round().max(1.0) as u32);
    }

    /// Backing store size in pixels
    pub fn size(&self) -> (f32, f32) {
        (self.canvas.width() as f32, self.canvas.height() as f32)
    }

    pub fn clear(&self) {
        let (w, h) = self.size();
        self.ctx.clear_rect(0.0, 0.0, w as f64, h as f64);
    }

    pub fn paint(&self, shapes: &[Shape]) {
        let ctx = &self.ctx;
        for shape in shapes {
            ctx.set_fill_style_str(&css(shape.color()));
            match shape {
                Shape::Rect { pos, size, .. } => {
                    ctx.fill_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
                }
                Shape::Polygon { points, .. } => {
                    let Some((first, rest)) = points.split_first() else {
                        continue;
                    };
                    ctx.begin_path();
                    ctx.move_to(first.x as f64, first.y as f64);
                    for p in rest {
                        ctx.line_to(p.x as f64, p.y as f64);
                    }
                    ctx.close_path();
                    ctx.fill();
                }
                Shape::Circle { center, radius, .. } => {
                    ctx.begin_path();
                    let _ = ctx.arc(
                        center.x as f64,
                        center.y as f64,
                        *radius as f64,
                        0.0,
                        std::f64::consts::TAU,
                    );
                    ctx.fill();
                }
                Shape::Text { pos, text, size, .. } => {
                    ctx.set_font(&format!("{size}px Arial"));
                    let _ = ctx.fill_text(text, pos.x as f64, pos.y as f64);
                }
            }
        }
    }
}
