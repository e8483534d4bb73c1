pub mod color;
pub mod segmentation;
pub mod smoothing;
pub mod extraction;
pub mod selection;
pub mod enhancement;
pub mod stats;

pub use color::*;
pub use segmentation::*;
pub use smoothing::*;
pub use extraction::*;
pub use selection::*;
pub use enhancement::*;
pub use stats::*;

use image::GrayImage;
use crate::{
    error::Result,
    traits::{ContourExtractor, RegionExtractor, RegionSelector},
    types::Region,
};

/// Standard region extractor: contours, then selection, then a filled mask
#[derive(Debug)]
pub struct StandardRegionExtractor<C, R>
where
    C: ContourExtractor,
    R: RegionSelector,
{
    pub contour_extractor: C,
    pub selector: R,
}

impl<C, R> StandardRegionExtractor<C, R>
where
    C: ContourExtractor,
    R: RegionSelector,
{
    pub fn new(contour_extractor: C, selector: R) -> Self {
        Self {
            contour_extractor,
            selector,
        }
    }
}

impl<C, R> RegionExtractor for StandardRegionExtractor<C, R>
where
    C: ContourExtractor,
    R: RegionSelector,
{
    fn extract_region(&self, mask: &GrayImage) -> Result<Option<Region>> {
        let contours = self.contour_extractor.extract_contours(mask)?;
        let Some(contour) = self.selector.select(&contours) else {
            return Ok(None);
        };
        let Some(bounding_box) = contour.bounding_box() else {
            return Ok(None);
        };

        Ok(Some(Region {
            mask: fill_region_mask(contour, mask.width(), mask.height()),
            contour: contour.clone(),
            bounding_box,
        }))
    }
}

/// Largest outer region, the extractor both analyzers use
pub type LargestRegionExtractor = StandardRegionExtractor<ImageprocContourExtractor, LargestAreaSelector>;

impl Default for LargestRegionExtractor {
    fn default() -> Self {
        Self::new(ImageprocContourExtractor, LargestAreaSelector)
    }
}
