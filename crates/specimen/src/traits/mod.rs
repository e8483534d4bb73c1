use image::{GrayImage, RgbImage};
use crate::{error::Result, types::{Contour, Region}};

/// Trait for grayscale-to-grayscale image stages (e.g. blur, threshold, contrast)
pub trait ImagePreprocessor: Send + Sync {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for colour segmentation producing a binary mask of the same size
pub trait ColorSegmenter: Send + Sync {
    fn segment(&self, image: &RgbImage) -> Result<GrayImage>;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract the outer contours of the foreground regions of a binary mask
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<Contour>>;
}

/// Trait for choosing the region of interest among candidate contours
pub trait RegionSelector: Send + Sync {
    /// Returns `None` when there are no candidates
    fn select<'a>(&self, contours: &'a [Contour]) -> Option<&'a Contour>;
}

/// Main trait for isolating the region of interest in a binary mask
pub trait RegionExtractor: Send + Sync {
    /// Returns `Ok(None)` when the mask has no foreground region
    fn extract_region(&self, mask: &GrayImage) -> Result<Option<Region>>;
}
