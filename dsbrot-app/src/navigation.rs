use dsbrot_core::{Lane, Resolution, ViewportParams};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-step factor for held-key zoom; applied as `KEY_ZOOM^(2·dt)`.
pub const KEY_ZOOM: f64 = 0.99;
/// Scale factor of one scroll-wheel notch.
pub const SCROLL_ZOOM: f64 = 0.84;
/// Iterations added per unit of held-key time.
pub const ITERATION_RATE: f32 = 2.0;
/// Iteration bound of a fresh view.
pub const DEFAULT_MAX_ITERATIONS: f32 = 512.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanDirection {
    Up,
    Down,
    Left,
    Right,
}

/// One recorded host input, replayed onto a [`ViewState`] before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    /// Held zoom key for `dt` frame steps.
    KeyZoom { direction: ZoomDirection, dt: f64 },
    /// One scroll-wheel notch.
    Scroll { direction: ZoomDirection },
    /// Held pan key for `dt` frame steps.
    Pan { direction: PanDirection, dt: f64 },
    /// Pointer drag in screen pixels, y down.
    Drag { dx: f64, dy: f64 },
    /// A whole pinch gesture: cumulative scale factors as reported by the
    /// device.
    Pinch { scales: Vec<f64> },
    /// Held iteration key for `dt` time units; negative lowers the bound.
    Iterations { dt: f32 },
}

/// Live, mutable view of the host.
///
/// Everything is plain `f64`; the renderer only ever sees a
/// [`snapshot`](Self::snapshot), so a frame in flight is unaffected by input
/// arriving while it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub center: [f64; 2],
    /// World units per pixel.
    pub scale: f64,
    /// World units moved per pixel of drag; tracks `scale` through zooms.
    pub movement_speed: f64,
    pub max_iterations: f32,
    pinch_base: Option<(f64, f64)>,
}

impl ViewState {
    /// Starting view for a frame: center `(−h/w, 0)`, scale `(h/w)·0.01`.
    pub fn new(resolution: Resolution) -> Self {
        let aspect = resolution.height as f64 / resolution.width as f64;
        Self::from_view(-aspect, 0.0, aspect * 0.01, DEFAULT_MAX_ITERATIONS)
    }

    pub fn from_view(center_re: f64, center_im: f64, scale: f64, max_iterations: f32) -> Self {
        Self {
            center: [center_re, center_im],
            scale,
            movement_speed: scale,
            max_iterations,
            pinch_base: None,
        }
    }

    /// Multiply scale and movement speed by `factor` (< 1 zooms in).
    pub fn zoom(&mut self, factor: f64) {
        self.scale *= factor;
        self.movement_speed *= factor;
    }

    /// Held-key zoom over `dt` frame steps.
    pub fn key_zoom(&mut self, direction: ZoomDirection, dt: f64) {
        let factor = KEY_ZOOM.powf(dt * 2.0);
        match direction {
            ZoomDirection::In => self.zoom(factor),
            ZoomDirection::Out => self.zoom(1.0 / factor),
        }
    }

    /// One scroll-wheel notch.
    pub fn scroll(&mut self, direction: ZoomDirection) {
        match direction {
            ZoomDirection::In => self.zoom(SCROLL_ZOOM),
            ZoomDirection::Out => self.zoom(1.0 / SCROLL_ZOOM),
        }
    }

    /// `notches` scroll steps at once; positive zooms in.
    pub fn scroll_by(&mut self, notches: i32) {
        self.zoom(SCROLL_ZOOM.powi(notches));
    }

    /// Held-key pan over `dt` frame steps.
    pub fn step(&mut self, direction: PanDirection, dt: f64) {
        let d = self.movement_speed * dt * 2.0;
        match direction {
            PanDirection::Up => self.center[1] += d,
            PanDirection::Down => self.center[1] -= d,
            PanDirection::Left => self.center[0] -= d,
            PanDirection::Right => self.center[0] += d,
        }
    }

    /// Drag by `(dx, dy)` screen pixels (y down): the content follows the
    /// pointer, so the center moves the other way.
    pub fn pan_pixels(&mut self, dx: f64, dy: f64) {
        self.center[0] -= self.movement_speed * dx;
        self.center[1] += self.movement_speed * dy;
    }

    /// Remember the current scale as the reference of a pinch gesture.
    pub fn pinch_begin(&mut self) {
        self.pinch_base = Some((self.scale, self.movement_speed));
    }

    /// Apply a pinch of cumulative factor `gesture_scale` (> 1 zooms in).
    pub fn pinch(&mut self, gesture_scale: f64) {
        let (scale, speed) = *self
            .pinch_base
            .get_or_insert((self.scale, self.movement_speed));
        self.scale = scale / gesture_scale;
        self.movement_speed = speed / gesture_scale;
    }

    pub fn pinch_end(&mut self) {
        self.pinch_base = None;
    }

    /// Change the iteration bound by `dt·ITERATION_RATE`, never below zero.
    pub fn adjust_iterations(&mut self, dt: f32) {
        self.max_iterations = (self.max_iterations + ITERATION_RATE * dt).max(0.0);
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyZoom { direction, dt } => self.key_zoom(*direction, *dt),
            InputEvent::Scroll { direction } => self.scroll(*direction),
            InputEvent::Pan { direction, dt } => self.step(*direction, *dt),
            InputEvent::Drag { dx, dy } => self.pan_pixels(*dx, *dy),
            InputEvent::Pinch { scales } => {
                self.pinch_begin();
                for &scale in scales {
                    self.pinch(scale);
                }
                self.pinch_end();
            }
            InputEvent::Iterations { dt } => self.adjust_iterations(*dt),
        }
    }

    /// Split the current view into kernel parameters for one frame.
    pub fn snapshot<L: Lane>(
        &self,
        resolution: Resolution,
    ) -> dsbrot_core::Result<ViewportParams<L>> {
        let params = ViewportParams::from_view(
            self.center[0],
            self.center[1],
            self.scale,
            resolution,
            self.max_iterations,
        )?;
        debug!(
            center_re = self.center[0],
            center_im = self.center[1],
            scale = self.scale,
            max_iterations = self.max_iterations,
            "View snapshot"
        );
        Ok(params)
    }
}
