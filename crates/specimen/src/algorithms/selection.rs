use image::{GrayImage, Luma};
use imageproc::{drawing::draw_polygon_mut, point::Point};
use crate::{
    algorithms::segmentation::FOREGROUND,
    traits::RegionSelector,
    types::Contour,
};

/// Picks the contour enclosing the largest area.
///
/// Among contours of exactly equal maximal area the first one in the
/// input order wins, which for extracted contours is raster discovery
/// order.
#[derive(Debug, Clone, Default)]
pub struct LargestAreaSelector;

impl RegionSelector for LargestAreaSelector {
    fn select<'a>(&self, contours: &'a [Contour]) -> Option<&'a Contour> {
        let mut best: Option<(&Contour, f64)> = None;
        for contour in contours {
            let area = contour.area();
            match best {
                Some((_, best_area)) if area <= best_area => {}
                _ => best = Some((contour, area)),
            }
        }
        best.map(|(contour, _)| contour)
    }
}

/// Filled mask of the contour's interior, boundary pixels included, over a
/// `width` x `height` canvas. Enclosed holes are filled too.
pub fn fill_region_mask(contour: &Contour, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);

    let mut polygon: Vec<Point<i32>> = Vec::with_capacity(contour.points.len());
    for &p in &contour.points {
        if polygon.last() != Some(&p) {
            polygon.push(p);
        }
    }
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    // The polygon drawer rejects closed rings and needs a real area to fill
    if polygon.len() >= 3 {
        draw_polygon_mut(&mut mask, &polygon, Luma([FOREGROUND]));
    }

    for p in &contour.points {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
            mask.put_pixel(p.x as u32, p.y as u32, Luma([FOREGROUND]));
        }
    }

    mask
}
