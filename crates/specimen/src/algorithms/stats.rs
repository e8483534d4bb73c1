use image::GrayImage;

/// Population intensity statistics of a grayscale image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityStats {
    pub min: u8,
    pub max: u8,
    pub mean: f64,
    pub std_dev: f64,
}

/// `None` for an image without pixels
pub fn intensity_stats(image: &GrayImage) -> Option<IntensityStats> {
    let mut hist = [0u64; 256];
    for p in image.pixels() {
        hist[p[0] as usize] += 1;
    }

    let count: u64 = hist.iter().sum();
    if count == 0 {
        return None;
    }

    let min = hist.iter().position(|&n| n > 0)? as u8;
    let max = hist.iter().rposition(|&n| n > 0)? as u8;

    let n = count as f64;
    let mean = hist
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum::<f64>()
        / n;
    let variance = hist
        .iter()
        .enumerate()
        .map(|(v, &c)| {
            let d = v as f64 - mean;
            d * d * c as f64
        })
        .sum::<f64>()
        / n;

    Some(IntensityStats {
        min,
        max,
        mean,
        std_dev: variance.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_two_level_image() {
        let image = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 0 } else { 200 }]));
        let stats = intensity_stats(&image).unwrap();
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 200);
        assert!((stats.mean - 100.0).abs() < 1e-9);
        assert!((stats.std_dev - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_image_has_no_spread() {
        let stats = intensity_stats(&GrayImage::from_pixel(3, 7, Luma([42]))).unwrap();
        assert_eq!((stats.min, stats.max), (42, 42));
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_empty_image() {
        assert!(intensity_stats(&GrayImage::new(0, 0)).is_none());
    }
}
