use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use dsbrot_core::{
    EscapeKernel, IterationResult, KernelOptions, Lane, PixelKernel, Resolution, ViewportParams,
};

use crate::buffer::RenderBuffer;
use crate::iteration_buffer::IterationBuffer;
use crate::palette::ColorPolicy;
use crate::tile::{build_tile_grid, Tile};

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Render generation counter plus tile progress.
///
/// A host that starts a new frame calls [`cancel`](Self::cancel); tiles of
/// the older frame that have not started yet are skipped. A pixel already in
/// flight always runs to completion.
#[derive(Debug)]
pub struct RenderCancel {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            progress_done: AtomicUsize::new(0),
            progress_total: AtomicUsize::new(0),
        }
    }

    /// Supersede the frame currently rendering.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    pub fn inc_progress(&self) {
        self.progress_done.fetch_add(1, Ordering::Relaxed);
    }

    /// `(tiles done, tiles total)` of the latest render.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Raw iteration data of one frame, before coloring.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub iterations: IterationBuffer,
    pub elapsed: Duration,
    /// Set when a newer generation started before every tile ran. Skipped
    /// tiles keep the buffer's interior fill.
    pub cancelled: bool,
    pub tiles_rendered: usize,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Evaluate every pixel of one tile, row-major.
fn render_tile<K: PixelKernel>(
    kernel: &K,
    tile: &Tile,
    frame_height: u32,
) -> Vec<IterationResult> {
    let mut data = Vec::with_capacity(tile.pixel_count());
    for py in 0..tile.height {
        for px in 0..tile.width {
            let (fx, fy) = tile.fragment(px, py, frame_height);
            data.push(kernel.evaluate(fx, fy));
        }
    }
    data
}

/// Render a full frame with `kernel`, tiles in parallel via rayon.
///
/// Generic over the kernel for static dispatch. Every pixel is an independent
/// evaluation, so the output does not depend on thread count or tile order.
pub fn render<K: PixelKernel + Sync>(
    kernel: &K,
    resolution: Resolution,
    cancel: &RenderCancel,
) -> RenderResult {
    let start = Instant::now();
    let gen = cancel.generation();
    let Resolution { width, height } = resolution;

    let tiles = build_tile_grid(width, height);
    let tile_count = tiles.len();
    debug!(
        tile_count,
        width,
        height,
        budget = kernel.budget(),
        "Starting tiled render"
    );
    cancel.reset_progress(tile_count);

    let tile_data: Vec<Option<Vec<IterationResult>>> = tiles
        .par_iter()
        .map(|tile| {
            if cancel.generation() != gen {
                return None;
            }
            let data = render_tile(kernel, tile, height);
            cancel.inc_progress();
            Some(data)
        })
        .collect();

    let cancelled = cancel.generation() != gen;
    let mut iterations =
        IterationBuffer::new(width, height, kernel.max_iterations(), kernel.budget());
    let mut tiles_rendered = 0;
    for (tile, data) in tiles.iter().zip(tile_data.iter()) {
        if let Some(d) = data {
            iterations.blit_tile(tile, d);
            tiles_rendered += 1;
        }
    }

    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        tiles_rendered, tile_count, cancelled, "Render complete"
    );

    RenderResult {
        iterations,
        elapsed,
        cancelled,
        tiles_rendered,
    }
}

/// Render one frame from a parameter snapshot and color it.
pub fn render_frame<L: Lane>(
    params: ViewportParams<L>,
    options: KernelOptions,
    resolution: Resolution,
    policy: &ColorPolicy,
    cancel: &RenderCancel,
) -> (RenderResult, RenderBuffer) {
    let kernel = EscapeKernel::new(params, options);
    let result = render(&kernel, resolution, cancel);
    let image = policy.colorize(&result.iterations);
    (result, image)
}
