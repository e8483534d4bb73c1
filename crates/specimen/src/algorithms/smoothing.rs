use image::{GrayImage, Luma};
use crate::{error::Result, traits::ImagePreprocessor};

/// Binomial approximation used for a 5-tap gaussian with size-derived sigma
const KERNEL_5: [u32; 5] = [1, 4, 6, 4, 1];
const KERNEL_5_SHIFT: u32 = 8;

/// Maps an out-of-range index back into `0..len` by mirroring without
/// repeating the edge sample (`dcb|abcd|cba`).
pub fn reflect_101(index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len <= 1 {
        return 0;
    }
    let mut i = index;
    while i < 0 || i >= len {
        if i < 0 {
            i = -i;
        }
        if i >= len {
            i = 2 * (len - 1) - i;
        }
    }
    i as u32
}

/// 5x5 gaussian blur in integer arithmetic with reflect-101 borders
#[derive(Debug, Clone, Default)]
pub struct Gaussian5x5Preprocessor;

impl ImagePreprocessor for Gaussian5x5Preprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let (width, height) = image.dimensions();
        let radius = (KERNEL_5.len() / 2) as i64;

        // Horizontal pass keeps unnormalised sums (max 16 * 255)
        let mut rows = vec![0u32; width as usize * height as usize];
        for y in 0..height {
            for x in 0..width {
                let sum: u32 = KERNEL_5
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let sx = reflect_101(x as i64 + k as i64 - radius, width);
                        w * image.get_pixel(sx, y)[0] as u32
                    })
                    .sum();
                rows[(y * width + x) as usize] = sum;
            }
        }

        Ok(GrayImage::from_fn(width, height, |x, y| {
            let sum: u32 = KERNEL_5
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let sy = reflect_101(y as i64 + k as i64 - radius, height);
                    w * rows[(sy * width + x) as usize]
                })
                .sum();
            let value = (sum + (1 << (KERNEL_5_SHIFT - 1))) >> KERNEL_5_SHIFT;
            Luma([value.min(u8::MAX as u32) as u8])
        }))
    }
}
