use crate::error::PipelineError;
use crate::pipeline::types::InputTensor;
use crate::surface::RawTile;
use image::{imageops, Rgba, RgbaImage};
use ndarray::Array3;

/// Converts raw RGBA tiles into the classifier's input tensor format.
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGBA tile into a (target_height, target_width, 1) tensor.
    ///
    /// Steps:
    /// 1. Resize to the target dimensions, preserving aspect ratio by
    ///    scale-to-fit and centering on a white canvas
    /// 2. Reduce each pixel to one inverted-grayscale ink value:
    ///    `255 − (R/3 + G/3 + B/3)`, so white background maps to 0 and black
    ///    ink to 255, matching the training set's polarity
    ///
    /// Ink values are left in [0, 255]; no rescale to [0, 1] is applied.
    /// This is a pure function of the tile contents.
    pub fn to_input_tensor(&self, tile: &RawTile) -> Result<InputTensor, PipelineError> {
        let _span = tracing::debug_span!("preprocess").entered();

        let expected_len = tile.width as usize * tile.height as usize * 4;
        if tile.width == 0 || tile.height == 0 || tile.data.len() != expected_len {
            return Err(PipelineError::InvalidTileShape {
                width: tile.width,
                height: tile.height,
                len: tile.data.len(),
            });
        }

        // Validated above, so the buffer always reassembles.
        let rgba = RgbaImage::from_raw(tile.width, tile.height, tile.data.clone()).ok_or(
            PipelineError::InvalidTileShape {
                width: tile.width,
                height: tile.height,
                len: tile.data.len(),
            },
        )?;

        let resized = self.scale_to_fit(&rgba);

        let mut tensor = Array3::<f32>::zeros((
            self.target_height as usize,
            self.target_width as usize,
            1,
        ));
        for (x, y, pixel) in resized.enumerate_pixels() {
            // Alpha is ignored; the surface is fully opaque by contract.
            let ink = 255.0 - (pixel[0] as f32 + pixel[1] as f32 + pixel[2] as f32) / 3.0;
            tensor[[y as usize, x as usize, 0]] = ink;
        }

        Ok(tensor)
    }

    /// Resize preserving aspect ratio, centered on a white canvas of the
    /// target dimensions.
    fn scale_to_fit(&self, image: &RgbaImage) -> RgbaImage {
        let (w, h) = image.dimensions();
        if (w, h) == (self.target_width, self.target_height) {
            return image.clone();
        }

        let scale = (self.target_width as f32 / w as f32).min(self.target_height as f32 / h as f32);
        let scaled_w = ((w as f32 * scale).round() as u32).max(1);
        let scaled_h = ((h as f32 * scale).round() as u32).max(1);

        let scaled = imageops::resize(image, scaled_w, scaled_h, imageops::FilterType::Lanczos3);

        let mut canvas = RgbaImage::from_pixel(
            self.target_width,
            self.target_height,
            Rgba([255, 255, 255, 255]),
        );
        imageops::overlay(
            &mut canvas,
            &scaled,
            ((self.target_width - scaled_w) / 2) as i64,
            ((self.target_height - scaled_h) / 2) as i64,
        );
        canvas
    }
}
