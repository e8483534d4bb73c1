use image::{GrayImage, Luma, Rgb, RgbImage};
use crate::{
    algorithms::color,
    error::Result,
    traits::{ColorSegmenter, ImagePreprocessor},
};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Marks pixels whose hue, saturation and value all fall in an inclusive range
#[derive(Debug, Clone)]
pub struct HsvRangeSegmenter {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl Default for HsvRangeSegmenter {
    /// Near-black pixels of any hue and saturation
    fn default() -> Self {
        Self {
            lower: [0, 0, 0],
            upper: [180, 255, 50],
        }
    }
}

impl HsvRangeSegmenter {
    fn contains(&self, hsv: [u8; 3]) -> bool {
        hsv.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(&c, (&lo, &hi))| lo <= c && c <= hi)
    }
}

impl ColorSegmenter for HsvRangeSegmenter {
    fn segment(&self, image: &RgbImage) -> Result<GrayImage> {
        Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let Rgb([r, g, b]) = *image.get_pixel(x, y);
            if self.contains(color::hsv(r, g, b)) {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        }))
    }
}

/// Strict thresholding: intensity above `threshold` becomes foreground
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self { threshold: 50 }
    }
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::threshold(image, self.threshold))
    }
}

/// Inclusive thresholding against a cut-off that may fall outside 0..=255.
///
/// A cut-off at or below zero marks every pixel, one above 255 marks none.
#[derive(Debug, Clone)]
pub struct AtLeastThreshold {
    pub cutoff: i32,
}

impl ImagePreprocessor for AtLeastThreshold {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let binary = match self.cutoff {
            c if c <= 0 => GrayImage::from_pixel(image.width(), image.height(), Luma([FOREGROUND])),
            c if c > u8::MAX as i32 => {
                GrayImage::from_pixel(image.width(), image.height(), Luma([BACKGROUND]))
            }
            c => imageproc::contrast::threshold(image, (c - 1) as u8),
        };
        Ok(binary)
    }
}

/// Number of pixels equal to `value`
pub fn count_equal(image: &GrayImage, value: u8) -> u64 {
    image.pixels().filter(|p| p[0] == value).count() as u64
}

pub fn count_non_zero(image: &GrayImage) -> u64 {
    image.pixels().filter(|p| p[0] != 0).count() as u64
}
