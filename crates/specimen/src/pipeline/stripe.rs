use std::sync::Arc;

use image::{DynamicImage, GrayImage};
use tracing::debug;
use crate::{
    algorithms::{color, count_equal, intensity_stats, AtLeastThreshold, FOREGROUND},
    error::{Result, SpecimenError},
    observer::{AnalysisKind, AnalysisObserver, AnalysisStage},
    pipeline::{builder::StripeCoverageAnalyzerBuilder, masked_crop, validate_image},
    traits::{ColorSegmenter, ImagePreprocessor, RegionExtractor},
    types::{StripeCoverage, ThresholdDecision, ThresholdSpec},
};

const KIND: AnalysisKind = AnalysisKind::StripeCoverage;

/// Counts bright stripe pixels inside the largest dark-outlined region.
///
/// The outline is found by colour segmentation, its interior is cropped
/// from the grayscale frame, contrast-enhanced, then binarized at a cut-off
/// measured down from the brightest enhanced pixel.
pub struct StripeCoverageAnalyzer {
    segmenter: Box<dyn ColorSegmenter>,
    region_extractor: Box<dyn RegionExtractor>,
    enhancer: Box<dyn ImagePreprocessor>,
    std_multiplier: f64,
    observer: Arc<dyn AnalysisObserver>,
}

impl StripeCoverageAnalyzer {
    pub fn builder() -> StripeCoverageAnalyzerBuilder {
        StripeCoverageAnalyzerBuilder::new()
    }

    pub fn new(
        segmenter: Box<dyn ColorSegmenter>,
        region_extractor: Box<dyn RegionExtractor>,
        enhancer: Box<dyn ImagePreprocessor>,
        std_multiplier: f64,
        observer: Arc<dyn AnalysisObserver>,
    ) -> Self {
        Self {
            segmenter,
            region_extractor,
            enhancer,
            std_multiplier,
            observer,
        }
    }

    pub fn analyze(&self, image: &DynamicImage, threshold: ThresholdSpec) -> Result<StripeCoverage> {
        let (width, height) = validate_image(image)?;
        let total_pixel_count = width as u64 * height as u64;

        let black_mask = self.segmenter.segment(&image.to_rgb8())?;
        self.observer.on_stage(KIND, AnalysisStage::BlackMask, &black_mask);

        let Some(region) = self.region_extractor.extract_region(&black_mask)? else {
            self.observer.on_no_region(KIND);
            return Ok(StripeCoverage {
                white_pixel_count: 0,
                total_pixel_count,
            });
        };
        self.observer.on_stage(KIND, AnalysisStage::RegionMask, &region.mask);

        let roi = masked_crop(&color::to_gray(image), &region);
        self.observer.on_stage(KIND, AnalysisStage::OriginalRoi, &roi);

        let enhanced = self.enhancer.preprocess(&roi)?;
        self.observer.on_stage(KIND, AnalysisStage::EnhancedRoi, &enhanced);

        let decision = self.decide_threshold(&enhanced, threshold)?;
        self.observer.on_threshold(&decision);

        let binary = AtLeastThreshold {
            cutoff: decision.manual_threshold,
        }
        .preprocess(&enhanced)?;
        self.observer.on_stage(KIND, AnalysisStage::ThresholdedRoi, &binary);

        let white_pixel_count = count_equal(&binary, FOREGROUND);
        debug!(
            white_pixel_count,
            total_pixel_count,
            roi_width = region.bounding_box.width,
            roi_height = region.bounding_box.height,
            "stripe coverage measured"
        );

        Ok(StripeCoverage {
            white_pixel_count,
            total_pixel_count,
        })
    }

    /// Derives the binarization cut-off from the enhanced ROI
    pub fn decide_threshold(
        &self,
        enhanced: &GrayImage,
        threshold: ThresholdSpec,
    ) -> Result<ThresholdDecision> {
        let stats = intensity_stats(enhanced)
            .ok_or_else(|| SpecimenError::ImageProcessing("empty region of interest".to_string()))?;
        let brightest = stats.max;

        let decision = match threshold {
            ThresholdSpec::Manual(level) => ThresholdDecision {
                brightest,
                mean: None,
                std_dev: None,
                threshold_level: level,
                manual_threshold: (brightest as i32).saturating_sub(level),
            },
            ThresholdSpec::Adaptive => {
                if !self.std_multiplier.is_finite() || self.std_multiplier < 0.0 {
                    return Err(SpecimenError::ImageProcessing(format!(
                        "std multiplier must be finite and non-negative, got {}",
                        self.std_multiplier
                    )));
                }
                let level = (stats.std_dev * self.std_multiplier).round() as i32;
                ThresholdDecision {
                    brightest,
                    mean: Some(stats.mean),
                    std_dev: Some(stats.std_dev),
                    threshold_level: level,
                    manual_threshold: (brightest as i32).saturating_sub(level),
                }
            }
        };

        Ok(decision)
    }
}

impl Default for StripeCoverageAnalyzer {
    fn default() -> Self {
        Self::builder().build()
    }
}
