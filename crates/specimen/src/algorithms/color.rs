//! Colour space conversions with 8-bit fixed-point arithmetic.
//!
//! Both conversions reproduce the integer rounding of the common 8-bit
//! computer-vision conventions so pixel counts stay comparable with
//! measurements taken by earlier tooling.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

/// Three-channel image whose channels hold hue (0..180), saturation and value
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

const GRAY_SHIFT: u32 = 14;
const GRAY_R: u32 = 4899;
const GRAY_G: u32 = 9617;
const GRAY_B: u32 = 1868;

const HSV_SHIFT: u32 = 12;
const HUE_RANGE: i32 = 180;

/// BT.601 luma of one RGB pixel
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let sum = r as u32 * GRAY_R + g as u32 * GRAY_G + b as u32 * GRAY_B;
    ((sum + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT) as u8
}

pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        Luma([luma(r, g, b)])
    })
}

/// Grayscale view of any decoded image; single-channel input is kept as is
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    if image.color().has_color() {
        rgb_to_gray(&image.to_rgb8())
    } else {
        image.to_luma8()
    }
}

/// Hue, saturation and value of one RGB pixel
pub fn hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;
    let round = 1 << (HSV_SHIFT - 1);

    let s = if v == 0 {
        0
    } else {
        let sdiv = ((255 << HSV_SHIFT) as f64 / v as f64).round() as i32;
        (diff * sdiv + round) >> HSV_SHIFT
    };

    let h = if diff == 0 {
        0
    } else {
        let raw = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let hdiv = ((HUE_RANGE << HSV_SHIFT) as f64 / (6 * diff) as f64).round() as i32;
        let h = (raw * hdiv + round) >> HSV_SHIFT;
        if h < 0 { h + HUE_RANGE } else { h }
    };

    [h as u8, s as u8, v as u8]
}

pub fn rgb_to_hsv(image: &RgbImage) -> HsvImage {
    HsvImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        Rgb(hsv(r, g, b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_extremes_and_weights() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
        assert_eq!(luma(120, 120, 120), 120);
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv(255, 0, 0), [0, 255, 255]);
        assert_eq!(hsv(0, 255, 0), [60, 255, 255]);
        assert_eq!(hsv(0, 0, 255), [120, 255, 255]);
        assert_eq!(hsv(40, 40, 40), [0, 0, 40]);
        assert_eq!(hsv(0, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_value_is_channel_maximum() {
        for &(r, g, b) in &[(10u8, 200u8, 30u8), (51, 50, 49), (7, 7, 250)] {
            assert_eq!(hsv(r, g, b)[2], r.max(g).max(b));
            assert!(hsv(r, g, b)[0] < 180);
        }
    }

    #[test]
    fn test_to_gray_keeps_single_channel() {
        let gray = GrayImage::from_fn(4, 3, |x, y| Luma([(x * 10 + y) as u8]));
        let converted = to_gray(&DynamicImage::ImageLuma8(gray.clone()));
        assert_eq!(converted, gray);
    }
}
