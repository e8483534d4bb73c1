use std::sync::Arc;

use image::DynamicImage;
use tracing::debug;
use crate::{
    algorithms::{color, count_non_zero},
    error::Result,
    observer::{AnalysisKind, AnalysisObserver, AnalysisStage},
    pipeline::{builder::SilhouetteAreaAnalyzerBuilder, validate_image},
    traits::{ImagePreprocessor, RegionExtractor},
    types::SilhouetteMeasurement,
};

const KIND: AnalysisKind = AnalysisKind::SilhouetteArea;

/// Measures the pixel area of the largest bright region on a dark background
pub struct SilhouetteAreaAnalyzer {
    smoother: Box<dyn ImagePreprocessor>,
    thresholder: Box<dyn ImagePreprocessor>,
    region_extractor: Box<dyn RegionExtractor>,
    observer: Arc<dyn AnalysisObserver>,
}

impl SilhouetteAreaAnalyzer {
    pub fn builder() -> SilhouetteAreaAnalyzerBuilder {
        SilhouetteAreaAnalyzerBuilder::new()
    }

    pub fn new(
        smoother: Box<dyn ImagePreprocessor>,
        thresholder: Box<dyn ImagePreprocessor>,
        region_extractor: Box<dyn RegionExtractor>,
        observer: Arc<dyn AnalysisObserver>,
    ) -> Self {
        Self {
            smoother,
            thresholder,
            region_extractor,
            observer,
        }
    }

    pub fn analyze(&self, image: &DynamicImage) -> Result<SilhouetteMeasurement> {
        validate_image(image)?;

        let gray = color::to_gray(image);
        self.observer.on_stage(KIND, AnalysisStage::Grayscale, &gray);

        let blurred = self.smoother.preprocess(&gray)?;
        self.observer.on_stage(KIND, AnalysisStage::Blurred, &blurred);

        let binary = self.thresholder.preprocess(&blurred)?;
        self.observer.on_stage(KIND, AnalysisStage::Binary, &binary);

        let Some(region) = self.region_extractor.extract_region(&binary)? else {
            self.observer.on_no_region(KIND);
            return Ok(SilhouetteMeasurement::NoRegionFound);
        };
        self.observer.on_stage(KIND, AnalysisStage::RegionMask, &region.mask);

        let area = count_non_zero(&region.mask);
        debug!(area, "silhouette area measured");
        Ok(SilhouetteMeasurement::Area(area))
    }
}

impl Default for SilhouetteAreaAnalyzer {
    fn default() -> Self {
        Self::builder().build()
    }
}
