//! Platform abstraction layer
//!
//! Frame loops are driven by the browser's animation-frame callback. Each
//! loop owns a `StopFlag`; the owner flips it to cancel, and the loop checks
//! it before doing any work and before asking for another frame.

use std::cell::Cell;
use std::rc::Rc;

/// Whether a frame callback wants another frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Continue,
    Stop,
}

/// Shared cancellation flag between a frame loop and whoever started it
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Rc<Cell<bool>>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

#[cfg(target_arch = "wasm32")]
pub mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use super::{Schedule, StopFlag};

    /// Request one animation frame
    fn request_animation_frame(callback: impl FnOnce(f64) + 'static) {
        let Some(window) = web_sys::window() else {
            log::warn!("No window; frame loop cannot be scheduled");
            return;
        };
        let closure = Closure::once(callback);
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Run `frame` once per display frame until it returns `Stop` or `stop`
    /// is raised. The flag is checked before every frame, so a stopped loop
    /// never touches its surface again and never reschedules.
    pub fn run_frame_loop<F>(stop: StopFlag, frame: F)
    where
        F: FnMut(f64) -> Schedule + 'static,
    {
        schedule(stop, Rc::new(RefCell::new(frame)));
    }

    fn schedule<F>(stop: StopFlag, frame: Rc<RefCell<F>>)
    where
        F: FnMut(f64) -> Schedule + 'static,
    {
        request_animation_frame(move |time| {
            if stop.is_stopped() {
                return;
            }
            let next = (frame.borrow_mut())(time);
            if next == Schedule::Continue && !stop.is_stopped() {
                schedule(stop, frame);
            } else {
                stop.stop();
            }
        });
    }
}
