//! Image preprocessing
//!
//! Decode -> RGB -> resize (no aspect preservation) -> [0,1] -> per-channel
//! normalization -> NCHW with a batch dimension of 1.

use crate::config::PreprocessConfig;
use crate::error::{LesionError, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, RgbImage};
use std::io::Cursor;
use tract_onnx::prelude::tract_ndarray::Array4;

/// Number of color channels fed to the network.
pub const CHANNELS: usize = 3;

/// Turns uploaded image bytes into a network input tensor.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    /// Create a preprocessor.
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Input shape produced by [`Self::preprocess`]: `[1, 3, size, size]`.
    pub fn input_shape(&self) -> [usize; 4] {
        let size = self.config.image_size as usize;
        [1, CHANNELS, size, size]
    }

    /// Decode and normalize an encoded image.
    pub fn preprocess(&self, bytes: &[u8]) -> Result<Array4<f32>> {
        let image = decode(bytes)?;
        Ok(self.tensor_from_image(&image))
    }

    /// Normalize an already decoded image.
    pub fn tensor_from_image(&self, image: &DynamicImage) -> Array4<f32> {
        let size = self.config.image_size;
        let rgb: RgbImage = image.to_rgb8();
        let resized = imageops::resize(&rgb, size, size, FilterType::Triangle);

        let mean = self.config.mean;
        let std = self.config.std;
        let mut tensor = Array4::<f32>::zeros(self.input_shape());

        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..CHANNELS {
                let value = pixel[c] as f32 / 255.0;
                tensor[[0, c, y as usize, x as usize]] = (value - mean[c]) / std[c];
            }
        }

        tensor
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(PreprocessConfig::default())
    }
}

/// Decode bytes of any supported format.
fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(LesionError::InvalidImage("empty upload".to_string()));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LesionError::InvalidImage(e.to_string()))?;

    if reader.format().is_none() {
        return Err(LesionError::InvalidImage(
            "unrecognized image format".to_string(),
        ));
    }

    reader
        .decode()
        .map_err(|e| LesionError::InvalidImage(e.to_string()))
}
