pub mod builder;
pub mod silhouette;
pub mod stripe;

use image::{DynamicImage, GrayImage, GenericImageView, Luma, imageops};
use crate::{
    error::{Result, SpecimenError},
    types::Region,
};

pub use silhouette::SilhouetteAreaAnalyzer;
pub use stripe::StripeCoverageAnalyzer;

/// Rejects images without pixels, returning the dimensions otherwise
pub(crate) fn validate_image(image: &DynamicImage) -> Result<(u32, u32)> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(SpecimenError::InvalidImage { width, height });
    }
    Ok((width, height))
}

/// Crops `image` to the region's bounding box, zeroing pixels outside the
/// region mask
pub fn masked_crop(image: &GrayImage, region: &Region) -> GrayImage {
    let bbox = region.bounding_box;
    let mut roi = imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image();

    for (x, y, pixel) in roi.enumerate_pixels_mut() {
        let inside = region
            .mask
            .get_pixel_checked(bbox.x + x, bbox.y + y)
            .is_some_and(|m| m[0] != 0);
        if !inside {
            *pixel = Luma([0]);
        }
    }

    roi
}
