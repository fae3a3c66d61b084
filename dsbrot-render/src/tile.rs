/// Tile edge in pixels. One tile is the unit of work handed to a rayon worker
/// and the granularity at which a render can be cancelled.
pub const TILE_SIZE: u32 = 64;

/// A rectangular block of the output frame, in row-major pixel coordinates
/// (row 0 at the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    /// May be smaller than [`TILE_SIZE`] at the right edge.
    pub width: u32,
    /// May be smaller than [`TILE_SIZE`] at the bottom edge.
    pub height: u32,
}

impl Tile {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Fragment position of pixel `(px, py)` inside this tile.
    ///
    /// Fragment coordinates are pixel centers with y pointing up, so the
    /// bottom row of a `frame_height` frame sits at `y = 0.5`.
    #[inline]
    pub fn fragment(&self, px: u32, py: u32, frame_height: u32) -> (f32, f32) {
        let col = self.x + px;
        let row = self.y + py;
        (col as f32 + 0.5, (frame_height - 1 - row) as f32 + 0.5)
    }
}

/// Cover a `width`×`height` frame with non-overlapping tiles, row by row.
pub fn build_tile_grid(width: u32, height: u32) -> Vec<Tile> {
    let mut tiles = Vec::new();
    let mut y = 0;
    while y < height {
        let th = TILE_SIZE.min(height - y);
        let mut x = 0;
        while x < width {
            let tw = TILE_SIZE.min(width - x);
            tiles.push(Tile {
                x,
                y,
                width: tw,
                height: th,
            });
            x += tw;
        }
        y += th;
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_grid_covers_frame_exactly_once() {
        let tiles = build_tile_grid(200, 150);
        let mut covered = vec![false; 200 * 150];
        for tile in &tiles {
            for py in tile.y..tile.y + tile.height {
                for px in tile.x..tile.x + tile.width {
                    let idx = py as usize * 200 + px as usize;
                    assert!(!covered[idx], "pixel ({px}, {py}) covered twice");
                    covered[idx] = true;
                }
            }
        }
        assert!(covered.iter().all(|&c| c), "all pixels must be covered");
    }

    #[test]
    fn edge_tiles_are_clipped() {
        let tiles = build_tile_grid(130, 70);
        assert_eq!(tiles.len(), 3 * 2);
        assert!(tiles.iter().all(|t| t.width <= TILE_SIZE && t.height <= TILE_SIZE));
        let last = tiles[tiles.len() - 1];
        assert_eq!((last.x, last.y, last.width, last.height), (128, 64, 2, 6));
    }

    #[test]
    fn empty_frame_has_no_tiles() {
        assert!(build_tile_grid(0, 10).is_empty());
        assert!(build_tile_grid(10, 0).is_empty());
    }

    #[test]
    fn fragments_are_pixel_centers_with_y_up() {
        let tile = Tile {
            x: 64,
            y: 0,
            width: 64,
            height: 64,
        };
        // Top-left pixel of the tile is on the top row of a 100-row frame.
        assert_eq!(tile.fragment(0, 0, 100), (64.5, 99.5));
        let bottom = Tile {
            x: 0,
            y: 64,
            width: 64,
            height: 36,
        };
        assert_eq!(bottom.fragment(3, 35, 100), (3.5, 0.5));
    }
}
