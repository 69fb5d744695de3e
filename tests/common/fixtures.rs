// Test fixtures: encoded images and a stub classifier

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lesionscan::classifier::{Array4, Classifier};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Encode a solid-colour image.
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode test image");
    bytes
}

/// A small PNG lesion photo stand-in.
pub fn lesion_png() -> Vec<u8> {
    solid_image(120, 80, [150, 90, 70], ImageFormat::Png)
}

/// A JPEG with a different aspect ratio.
pub fn lesion_jpeg() -> Vec<u8> {
    solid_image(64, 200, [60, 40, 30], ImageFormat::Jpeg)
}

/// Classifier returning fixed scores and counting forward passes.
pub struct StubClassifier {
    scores: Vec<f32>,
    calls: AtomicUsize,
}

impl StubClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of forward passes so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubClassifier {
    /// Favors `malignant`.
    fn default() -> Self {
        Self::new(vec![0.25, 1.75])
    }
}

impl Classifier for StubClassifier {
    fn forward(&self, input: Array4<f32>) -> lesionscan::Result<Vec<f32>> {
        assert_eq!(input.shape(), &[1, 3, 224, 224]);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }

    fn num_classes(&self) -> usize {
        self.scores.len()
    }
}
