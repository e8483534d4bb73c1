use std::sync::Arc;

use crate::{
    algorithms::{
        ClaheEnhancer, Gaussian5x5Preprocessor, HsvRangeSegmenter, LargestRegionExtractor,
        ThresholdPreprocessor,
    },
    config::{SilhouetteConfig, StripeCoverageConfig},
    observer::{AnalysisObserver, NoopObserver},
    pipeline::{SilhouetteAreaAnalyzer, StripeCoverageAnalyzer},
    traits::{ColorSegmenter, ImagePreprocessor, RegionExtractor},
};

/// Builder for [`StripeCoverageAnalyzer`] with a fluent API
pub struct StripeCoverageAnalyzerBuilder {
    segmenter: Option<Box<dyn ColorSegmenter>>,
    region_extractor: Option<Box<dyn RegionExtractor>>,
    enhancer: Option<Box<dyn ImagePreprocessor>>,
    clahe: ClaheEnhancer,
    std_multiplier: f64,
    observer: Option<Arc<dyn AnalysisObserver>>,
}

impl StripeCoverageAnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            segmenter: None,
            region_extractor: None,
            enhancer: None,
            clahe: ClaheEnhancer::default(),
            std_multiplier: 1.0,
            observer: None,
        }
    }

    /// Start from a configuration; later calls still override it
    pub fn from_config(config: &StripeCoverageConfig) -> Self {
        Self::new()
            .set_segmenter(HsvRangeSegmenter {
                lower: config.black_lower,
                upper: config.black_upper,
            })
            .clip_limit(config.clip_limit)
            .tile_grid(config.tile_grid[0], config.tile_grid[1])
            .std_multiplier(config.std_multiplier)
    }

    /// Set the outline segmenter (replaces any existing one)
    pub fn set_segmenter<S>(mut self, segmenter: S) -> Self
    where
        S: ColorSegmenter + 'static,
    {
        self.segmenter = Some(Box::new(segmenter));
        self
    }

    /// Set the region extractor (replaces any existing one)
    pub fn set_region_extractor<R>(mut self, extractor: R) -> Self
    where
        R: RegionExtractor + 'static,
    {
        self.region_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the ROI contrast enhancer, bypassing the CLAHE settings
    pub fn set_enhancer<E>(mut self, enhancer: E) -> Self
    where
        E: ImagePreprocessor + 'static,
    {
        self.enhancer = Some(Box::new(enhancer));
        self
    }

    pub fn clip_limit(mut self, clip_limit: f64) -> Self {
        self.clahe.clip_limit = clip_limit;
        self
    }

    /// Number of CLAHE tiles across and down
    pub fn tile_grid(mut self, columns: u32, rows: u32) -> Self {
        self.clahe.tile_grid = (columns, rows);
        self
    }

    pub fn std_multiplier(mut self, multiplier: f64) -> Self {
        self.std_multiplier = multiplier;
        self
    }

    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: AnalysisObserver + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Build the analyzer with default components if not specified
    pub fn build(self) -> StripeCoverageAnalyzer {
        StripeCoverageAnalyzer::new(
            self.segmenter
                .unwrap_or_else(|| Box::new(HsvRangeSegmenter::default())),
            self.region_extractor
                .unwrap_or_else(|| Box::new(LargestRegionExtractor::default())),
            self.enhancer.unwrap_or_else(|| Box::new(self.clahe)),
            self.std_multiplier,
            self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
        )
    }
}

impl Default for StripeCoverageAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`SilhouetteAreaAnalyzer`] with a fluent API
pub struct SilhouetteAreaAnalyzerBuilder {
    smoother: Option<Box<dyn ImagePreprocessor>>,
    thresholder: Option<Box<dyn ImagePreprocessor>>,
    region_extractor: Option<Box<dyn RegionExtractor>>,
    observer: Option<Arc<dyn AnalysisObserver>>,
}

impl SilhouetteAreaAnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            smoother: None,
            thresholder: None,
            region_extractor: None,
            observer: None,
        }
    }

    pub fn from_config(config: &SilhouetteConfig) -> Self {
        Self::new().threshold(config.threshold)
    }

    /// Set the noise-suppression stage (replaces any existing one)
    pub fn set_smoother<P>(mut self, smoother: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.smoother = Some(Box::new(smoother));
        self
    }

    /// Set the binarization stage (replaces any existing one)
    pub fn set_thresholder<P>(mut self, thresholder: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.thresholder = Some(Box::new(thresholder));
        self
    }

    /// Strict fixed threshold on the blurred intensity
    pub fn threshold(self, threshold: u8) -> Self {
        self.set_thresholder(ThresholdPreprocessor { threshold })
    }

    pub fn set_region_extractor<R>(mut self, extractor: R) -> Self
    where
        R: RegionExtractor + 'static,
    {
        self.region_extractor = Some(Box::new(extractor));
        self
    }

    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: AnalysisObserver + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn build(self) -> SilhouetteAreaAnalyzer {
        SilhouetteAreaAnalyzer::new(
            self.smoother
                .unwrap_or_else(|| Box::new(Gaussian5x5Preprocessor)),
            self.thresholder
                .unwrap_or_else(|| Box::new(ThresholdPreprocessor::default())),
            self.region_extractor
                .unwrap_or_else(|| Box::new(LargestRegionExtractor::default())),
            self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
        )
    }
}

impl Default for SilhouetteAreaAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
