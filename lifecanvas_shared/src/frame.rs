use crate::Point;
use log::debug;

const BYTES_PER_PIXEL: usize = 4;
const RED: usize = 0;
const ALPHA: usize = 3;

/// How many points of a frame landed on the canvas.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub painted: usize,
    pub skipped: usize,
}

/// A row-major RGBA8 image the size of the canvas, ready for `putImageData`.
///
/// Every frame is rendered into a fresh, fully transparent buffer; live cells
/// become opaque red pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Builds the full-canvas image for one inbound frame.
    pub fn render(width: u32, height: u32, points: &[Point]) -> (Self, RenderStats) {
        let mut buffer = Self::new(width, height);
        let mut stats = RenderStats::default();
        for &point in points {
            if buffer.plot(point) {
                stats.painted += 1;
            } else {
                stats.skipped += 1;
            }
        }
        if stats.skipped > 0 {
            debug!(
                "skipped {} of {} points outside the {}x{} canvas",
                stats.skipped,
                points.len(),
                width,
                height
            );
        }
        (buffer, stats)
    }

    /// Marks `point` opaque red. Points outside the canvas are left out and
    /// reported with `false`.
    pub fn plot(&mut self, point: Point) -> bool {
        let Some(offset) = self.offset(point) else {
            return false;
        };
        self.data[offset + RED] = u8::MAX;
        self.data[offset + ALPHA] = u8::MAX;
        true
    }

    /// The RGBA bytes of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let offset = self.offset(Point::new(i64::from(x), i64::from(y)))?;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.data[offset..offset + BYTES_PER_PIXEL]);
        Some(rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    // (x + width * y) * 4, only for points on the canvas.
    fn offset(&self, point: Point) -> Option<usize> {
        let x = u32::try_from(point.x).ok().filter(|&x| x < self.width)?;
        let y = u32::try_from(point.y).ok().filter(|&y| y < self.height)?;
        Some((x as usize + self.width as usize * y as usize) * BYTES_PER_PIXEL)
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
