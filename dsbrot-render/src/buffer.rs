/// An 8-bit RGBA image, row-major with row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBuffer {
    pub width: u32,
    pub height: u32,
    /// 4 bytes per pixel.
    pub pixels: Vec<u8>,
}

impl RenderBuffer {
    /// Create a new buffer filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[idx..idx + 4];
        Some([px[0], px[1], px[2], px[3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_black_opaque() {
        let buf = RenderBuffer::new(4, 4);
        assert_eq!(buf.pixels.len(), 4 * 4 * 4);
        for chunk in buf.pixels.chunks_exact(4) {
            assert_eq!(chunk, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn pixel_reads_rgba_and_rejects_out_of_range() {
        let mut buf = RenderBuffer::new(8, 8);
        buf.pixels[(8 + 2) * 4] = 255;
        assert_eq!(buf.pixel(2, 1), Some([255, 0, 0, 255]));
        assert_eq!(buf.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(buf.pixel(8, 0), None);
        assert_eq!(buf.pixel(0, 8), None);
    }
}
