use image::GrayImage;
use imageproc::contours::BorderType;
use crate::{error::Result, traits::ContourExtractor, types::Contour};

/// Imageproc-based extractor returning only the outermost borders.
///
/// Hole borders and components nested inside holes are dropped, so a
/// ring yields a single contour. Order follows the raster scan in which
/// borders are discovered.
#[derive(Debug, Clone, Default)]
pub struct ImageprocContourExtractor;

impl ContourExtractor for ImageprocContourExtractor {
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Contour>> {
        let contours = imageproc::contours::find_contours::<i32>(mask);

        let result = contours
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .map(Contour::from)
            .filter(|c| !c.is_empty())
            .collect();

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(image: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, value: u8) {
        for y in y0..y1 {
            for x in x0..x1 {
                image.put_pixel(x, y, Luma([value]));
            }
        }
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let mask = GrayImage::new(20, 20);
        let contours = ImageprocContourExtractor.extract_contours(&mask).unwrap();
        assert!(contours.is_empty());
    }

    #[test]
    fn test_ring_yields_single_outer_contour() {
        let mut mask = GrayImage::new(40, 40);
        fill(&mut mask, 5, 5, 35, 35, 255);
        fill(&mut mask, 10, 10, 30, 30, 0);
        // island inside the hole
        fill(&mut mask, 18, 18, 22, 22, 255);

        let contours = ImageprocContourExtractor.extract_contours(&mask).unwrap();
        assert_eq!(contours.len(), 1);
        let bbox = contours[0].bounding_box().unwrap();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (5, 5, 30, 30));
    }

    #[test]
    fn test_disjoint_regions_in_scan_order() {
        let mut mask = GrayImage::new(60, 40);
        fill(&mut mask, 40, 2, 50, 8, 255);
        fill(&mut mask, 2, 20, 30, 35, 255);

        let contours = ImageprocContourExtractor.extract_contours(&mask).unwrap();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].bounding_box().unwrap().x, 40);
        assert_eq!(contours[1].bounding_box().unwrap().x, 2);
    }
}
