use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use dsbrot_core::{KernelOptions, Resolution};
use dsbrot_render::ColorPolicy;

use crate::error::{AppError, Result};
use crate::navigation::{InputEvent, ViewState, DEFAULT_MAX_ITERATIONS};

/// Width of the extended-precision lanes used for a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arithmetic {
    /// Pairs of `f32`, about 48 significant bits.
    #[default]
    DoubleSingle,
    /// Pairs of `f64`, about 106 significant bits.
    DoubleDouble,
}

/// A headless render job, loaded from JSON.
///
/// Every field has a default, so `{}` describes the starting view at 800×600.
/// Missing view fields fall back to the host's starting view for the
/// configured resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub center_re: Option<f64>,
    #[serde(default)]
    pub center_im: Option<f64>,
    /// World units per pixel.
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: f32,
    /// Scroll-wheel notches applied to the view before rendering; positive
    /// zooms in.
    #[serde(default)]
    pub scroll_steps: i32,
    /// Host input replayed after the scroll steps, in order.
    #[serde(default)]
    pub input: Vec<InputEvent>,
    #[serde(default)]
    pub arithmetic: Arithmetic,
    #[serde(default)]
    pub kernel: KernelOptions,
    #[serde(default)]
    pub coloring: ColorPolicy,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_max_iterations() -> f32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_output() -> PathBuf {
    PathBuf::from("dsbrot.png")
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            center_re: None,
            center_im: None,
            scale: None,
            max_iterations: default_max_iterations(),
            scroll_steps: 0,
            input: Vec::new(),
            arithmetic: Arithmetic::default(),
            kernel: KernelOptions::default(),
            coloring: ColorPolicy::default(),
            output: default_output(),
        }
    }
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| AppError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json).map_err(|source| AppError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded job from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn resolution(&self) -> Result<Resolution> {
        Ok(Resolution::new(self.width, self.height)?)
    }

    /// The view this job renders, after its scroll steps and input events.
    pub fn view(&self) -> Result<ViewState> {
        let start = ViewState::new(self.resolution()?);
        let mut view = ViewState::from_view(
            self.center_re.unwrap_or(start.center[0]),
            self.center_im.unwrap_or(start.center[1]),
            self.scale.unwrap_or(start.scale),
            self.max_iterations,
        );
        view.scroll_by(self.scroll_steps);
        for event in &self.input {
            view.apply(event);
        }
        Ok(view)
    }
}
