//! Optional listeners for intermediate analysis results.
//!
//! Analyzers stay pure functions of their input. Anything that wants to
//! see the in-between images or the derived threshold (logging, debug
//! image dumps, a preview UI) attaches an [`AnalysisObserver`].

use std::{
    path::PathBuf,
    sync::Arc,
};

use image::GrayImage;
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::types::ThresholdDecision;

/// Which analysis is reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisKind {
    StripeCoverage,
    SilhouetteArea,
}

/// Intermediate images handed to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisStage {
    /// Near-black outline candidates
    BlackMask,
    /// Filled interior of the selected contour
    RegionMask,
    /// Masked grayscale crop before enhancement
    OriginalRoi,
    EnhancedRoi,
    ThresholdedRoi,
    Grayscale,
    Blurred,
    Binary,
}

pub trait AnalysisObserver: Send + Sync {
    fn on_stage(&self, _kind: AnalysisKind, _stage: AnalysisStage, _image: &GrayImage) {}

    fn on_threshold(&self, _decision: &ThresholdDecision) {}

    fn on_no_region(&self, _kind: AnalysisKind) {}
}

impl<T> AnalysisObserver for Arc<T>
where
    T: AnalysisObserver + ?Sized,
{
    fn on_stage(&self, kind: AnalysisKind, stage: AnalysisStage, image: &GrayImage) {
        self.as_ref().on_stage(kind, stage, image);
    }

    fn on_threshold(&self, decision: &ThresholdDecision) {
        self.as_ref().on_threshold(decision);
    }

    fn on_no_region(&self, kind: AnalysisKind) {
        self.as_ref().on_no_region(kind);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl AnalysisObserver for NoopObserver {}

/// Reports derived values through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn on_stage(&self, kind: AnalysisKind, stage: AnalysisStage, image: &GrayImage) {
        debug!(%kind, %stage, width = image.width(), height = image.height(), "stage complete");
    }

    fn on_threshold(&self, decision: &ThresholdDecision) {
        debug!("Brightest pixel intensity: {}", decision.brightest);
        if let (Some(mean), Some(std_dev)) = (decision.mean, decision.std_dev) {
            debug!("Mean intensity: {mean}, Standard deviation: {std_dev}");
            debug!("Dynamic threshold level: {}", decision.threshold_level);
            debug!("Dynamic manual threshold intensity: {}", decision.manual_threshold);
        } else {
            debug!(
                "Manual threshold level {} gives intensity cut-off {}",
                decision.threshold_level, decision.manual_threshold
            );
        }
    }

    fn on_no_region(&self, kind: AnalysisKind) {
        match kind {
            AnalysisKind::StripeCoverage => info!("No black outline was detected in the image."),
            AnalysisKind::SilhouetteArea => info!("No region brighter than the background was found."),
        }
    }
}

/// Writes every stage image as `<prefix>_<kind>_<stage>.png` under a directory.
///
/// Failures are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct ImageDumpObserver {
    pub dir: PathBuf,
    pub prefix: String,
}

impl ImageDumpObserver {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, kind: AnalysisKind, stage: AnalysisStage) -> PathBuf {
        self.dir.join(format!("{}_{}_{}.png", self.prefix, kind, stage))
    }
}

impl AnalysisObserver for ImageDumpObserver {
    fn on_stage(&self, kind: AnalysisKind, stage: AnalysisStage, image: &GrayImage) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("Cannot create dump directory {:?}: {}", self.dir, e);
            return;
        }
        let path = self.path_for(kind, stage);
        if let Err(e) = image.save(&path) {
            warn!("Cannot write {:?}: {}", path, e);
        }
    }
}

/// Fans every notification out to several observers in order
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn AnalysisObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<O>(mut self, observer: O) -> Self
    where
        O: AnalysisObserver + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl AnalysisObserver for ObserverSet {
    fn on_stage(&self, kind: AnalysisKind, stage: AnalysisStage, image: &GrayImage) {
        for observer in &self.observers {
            observer.on_stage(kind, stage, image);
        }
    }

    fn on_threshold(&self, decision: &ThresholdDecision) {
        for observer in &self.observers {
            observer.on_threshold(decision);
        }
    }

    fn on_no_region(&self, kind: AnalysisKind) {
        for observer in &self.observers {
            observer.on_no_region(kind);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_stage_names() {
        assert_eq!(AnalysisStage::ThresholdedRoi.to_string(), "thresholded_roi");
        let name: &'static str = AnalysisKind::SilhouetteArea.into();
        assert_eq!(name, "silhouette_area");
    }

    #[test]
    fn test_image_dump_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let observer = ImageDumpObserver::new(dir.path().join("dumps"), "frame01");
        let image = GrayImage::from_pixel(4, 4, Luma([200]));

        observer.on_stage(AnalysisKind::StripeCoverage, AnalysisStage::BlackMask, &image);

        let path = observer.path_for(AnalysisKind::StripeCoverage, AnalysisStage::BlackMask);
        assert!(path.ends_with("frame01_stripe_coverage_black_mask.png"));
        let reloaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(reloaded, image);
    }

    #[test]
    fn test_observer_set_fans_out() {
        let first = Arc::new(testing::RecordingObserver::default());
        let second = Arc::new(testing::RecordingObserver::default());
        let set = ObserverSet::new().with(first.clone()).with(second.clone()).with(NoopObserver);
        assert_eq!(set.len(), 3);

        set.on_no_region(AnalysisKind::SilhouetteArea);
        assert_eq!(*first.no_region.lock().unwrap(), vec![AnalysisKind::SilhouetteArea]);
        assert_eq!(*second.no_region.lock().unwrap(), vec![AnalysisKind::SilhouetteArea]);
    }
}
