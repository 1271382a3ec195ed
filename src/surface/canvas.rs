use super::RawTile;
use image::{imageops, Rgba, RgbaImage};

/// Initial fill color: white, fully opaque.
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Fixed-size drawable RGBA bitmap recording freehand strokes.
///
/// Dimensions are constant for the surface's lifetime. The surface itself
/// carries no change tracking; the owning session pairs it with a dirty flag.
pub struct Surface {
    pixels: RgbaImage,
    width: u32,
    height: u32,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self {
            pixels: RgbaImage::from_pixel(width, height, BACKGROUND),
            width,
            height,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Fill the entire surface with the initial background value.
    pub fn reset(&mut self) {
        self.pixels = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
    }

    /// Draw a line segment of the given width and color between two
    /// surface-local points. Out-of-bounds coordinates are clamped by the
    /// raster step; drawing never fails.
    pub fn write_stroke(&mut self, from: (f32, f32), to: (f32, f32), pen_width: u32, color: Rgba<u8>) {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;

        // Step densely enough that consecutive stamps overlap.
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(from.0 + dx * t, from.1 + dy * t, pen_width, color);
        }
    }

    /// Stamp a filled disc of diameter `pen_width` centered at (cx, cy).
    fn stamp(&mut self, cx: f32, cy: f32, pen_width: u32, color: Rgba<u8>) {
        let radius = pen_width as f32 / 2.0;

        let x0 = (cx - radius).floor().clamp(0.0, (self.width - 1) as f32) as u32;
        let x1 = (cx + radius).ceil().clamp(0.0, (self.width - 1) as f32) as u32;
        let y0 = (cy - radius).floor().clamp(0.0, (self.height - 1) as f32) as u32;
        let y1 = (cy + radius).ceil().clamp(0.0, (self.height - 1) as f32) as u32;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let ox = x as f32 + 0.5 - cx;
                let oy = y as f32 + 0.5 - cy;
                if ox * ox + oy * oy <= radius * radius {
                    self.pixels.put_pixel(x, y, color);
                }
            }
        }
    }

    /// Copy the full surface into an owned tile.
    pub fn snapshot(&self) -> RawTile {
        self.snapshot_region(0, 0, self.width, self.height)
    }

    /// Copy the requested pixel region into an owned tile. The region is
    /// clamped to the surface bounds; a region entirely outside the surface
    /// yields an empty tile.
    pub fn snapshot_region(&self, x: u32, y: u32, w: u32, h: u32) -> RawTile {
        let x0 = x.min(self.width);
        let y0 = y.min(self.height);
        let w = w.min(self.width - x0);
        let h = h.min(self.height - y0);

        let region = imageops::crop_imm(&self.pixels, x0, y0, w, h).to_image();
        RawTile {
            width: w,
            height: h,
            data: region.into_raw(),
        }
    }
}
