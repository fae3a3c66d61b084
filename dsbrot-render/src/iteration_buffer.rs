use dsbrot_core::IterationResult;

use crate::tile::Tile;

/// Per-pixel `IterationResult`s for a full frame, row-major with row 0 at the
/// top.
///
/// Kept apart from colored pixels so a frame can be recolored under another
/// [`ColorPolicy`](crate::ColorPolicy) without iterating again.
#[derive(Debug, Clone)]
pub struct IterationBuffer {
    pub width: u32,
    pub height: u32,
    /// Configured iteration bound of the frame, as handed to the kernel.
    pub max_iterations: f32,
    /// Steps the kernel actually ran: the bound after the structural cap.
    pub budget: u32,
    pub data: Vec<IterationResult>,
}

impl IterationBuffer {
    /// A buffer with every pixel marked interior for `budget` steps.
    pub fn new(width: u32, height: u32, max_iterations: f32, budget: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            max_iterations,
            budget,
            data: vec![IterationResult::Interior { iterations: budget }; size],
        }
    }

    /// The bound colors are scaled against, so interior pixels land on the
    /// top of the range even when the configured bound was capped.
    pub fn color_bound(&self) -> f32 {
        self.budget as f32
    }

    pub fn get(&self, x: u32, y: u32) -> Option<IterationResult> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    /// Number of pixels whose orbit escaped.
    pub fn escaped_count(&self) -> usize {
        self.data.iter().filter(|r| r.is_escaped()).count()
    }

    /// Copy tile iteration data into the matching region of the buffer.
    pub fn blit_tile(&mut self, tile: &Tile, tile_data: &[IterationResult]) {
        debug_assert_eq!(tile_data.len(), tile.pixel_count());
        for py in 0..tile.height {
            let buf_y = tile.y + py;
            if buf_y >= self.height {
                break;
            }
            let dst_start = (buf_y * self.width + tile.x) as usize;
            let src_start = (py * tile.width) as usize;
            let copy_w = tile.width.min(self.width - tile.x) as usize;
            self.data[dst_start..dst_start + copy_w]
                .copy_from_slice(&tile_data[src_start..src_start + copy_w]);
        }
    }
}
