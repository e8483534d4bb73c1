use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tunables of the stripe coverage analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StripeCoverageConfig {
    /// Inclusive lower HSV bound of outline pixels (hue 0-180)
    pub black_lower: [u8; 3],
    /// Inclusive upper HSV bound of outline pixels (hue 0-180)
    pub black_upper: [u8; 3],
    /// CLAHE clip limit
    #[schemars(range(min = 0.0))]
    pub clip_limit: f64,
    /// CLAHE tiles across and down
    pub tile_grid: [u32; 2],
    /// Adaptive threshold level as a multiple of the ROI's standard deviation
    #[schemars(range(min = 0.0))]
    pub std_multiplier: f64,
}

impl Default for StripeCoverageConfig {
    fn default() -> Self {
        Self {
            black_lower: [0, 0, 0],
            black_upper: [180, 255, 50],
            clip_limit: 3.0,
            tile_grid: [8, 8],
            std_multiplier: 1.0,
        }
    }
}

/// Tunables of the silhouette area analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SilhouetteConfig {
    /// Blurred intensity strictly above which a pixel belongs to the specimen
    pub threshold: u8,
}

impl Default for SilhouetteConfig {
    fn default() -> Self {
        Self { threshold: 50 }
    }
}
