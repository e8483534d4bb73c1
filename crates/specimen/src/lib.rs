//! # Specimen Image Analysis Library
//!
//! Measurements on photographs of lab specimens:
//!
//! - **Stripe coverage**: the number of bright stripe pixels inside the
//!   largest black-outlined region, after local contrast enhancement.
//! - **Silhouette area**: the pixel area of the largest bright region
//!   against a dark background, holes included.
//!
//! Both analyses are assembled from small trait-based stages so individual
//! steps can be swapped, and report intermediate images to an
//! [`AnalysisObserver`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use specimen::{StripeCoverageAnalyzer, ThresholdSpec};
//!
//! let image = specimen::load_image("plate_01.jpg")?;
//! let coverage = StripeCoverageAnalyzer::default().analyze(&image, ThresholdSpec::Adaptive)?;
//! println!("{} / {}", coverage.white_pixel_count, coverage.total_pixel_count);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Analyzer
//!
//! ```rust,no_run
//! use specimen::{SilhouetteAreaAnalyzer, TracingObserver};
//!
//! let analyzer = SilhouetteAreaAnalyzer::builder()
//!     .threshold(40)
//!     .observer(TracingObserver)
//!     .build();
//! let area = analyzer.analyze(&specimen::load_image("side_view.png")?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod config;
pub mod observer;
pub mod pipeline;
pub mod command;

use std::path::Path;

use image::DynamicImage;
use tracing::debug;

// Re-exports for convenience
pub use error::{Result, SpecimenError};
pub use types::*;
pub use traits::*;
pub use algorithms::*;
pub use config::{SilhouetteConfig, StripeCoverageConfig};
pub use observer::{
    AnalysisKind, AnalysisObserver, AnalysisStage, ImageDumpObserver, NoopObserver, ObserverSet,
    TracingObserver,
};
pub use pipeline::{
    SilhouetteAreaAnalyzer, StripeCoverageAnalyzer,
    builder::{SilhouetteAreaAnalyzerBuilder, StripeCoverageAnalyzerBuilder},
};
pub use command::{AnalysisCommand, AnalysisOutcome};

/// Decode an image file, keeping its colour layout
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let image = image::open(path)?;
    debug!(path = %path.display(), width = image.width(), height = image.height(), "image loaded");
    Ok(image)
}

/// Stripe coverage with the default analyzer; `None` selects the adaptive level
pub fn analyze_stripe_coverage(
    image: &DynamicImage,
    threshold_level: Option<i32>,
) -> Result<StripeCoverage> {
    StripeCoverageAnalyzer::default().analyze(image, threshold_level.into())
}

/// Silhouette area with the default analyzer
pub fn analyze_silhouette_area(image: &DynamicImage) -> Result<SilhouetteMeasurement> {
    SilhouetteAreaAnalyzer::default().analyze(image)
}
