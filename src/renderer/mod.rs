//! 2D rendering module
//!
//! Scenes are composed into plain `Shape` lists (testable anywhere) and
//! painted with the Canvas 2D API in the browser.

pub mod palette;
pub mod shapes;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasPainter;
pub use palette::{Color, Livery};
pub use shapes::Shape;
