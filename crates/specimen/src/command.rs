use image::DynamicImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::{
    error::Result,
    pipeline::{SilhouetteAreaAnalyzer, StripeCoverageAnalyzer},
    types::{SilhouetteMeasurement, StripeCoverage},
};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisCommand {
    /// Fraction of bright stripe pixels inside the black outline
    #[serde(rename = "stripe_coverage")]
    StripeCoverage {
        /// Margin below the brightest pixel; omit for the adaptive level
        #[serde(default)]
        #[schemars(range(min = -255, max = 510))]
        threshold_level: Option<i32>,
    },

    /// Pixel area of the specimen silhouette on a dark background
    #[serde(rename = "silhouette_area")]
    SilhouetteArea,
}

/// Result of executing an [`AnalysisCommand`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "result", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Stripe(StripeCoverage),
    Silhouette(SilhouetteMeasurement),
}

impl AnalysisCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::StripeCoverage { .. } => {
                "Count bright stripe pixels inside the largest black-outlined region"
            }
            Self::SilhouetteArea => "Measure the area of the largest bright region on a dark background",
        }
    }

    /// Get parameter requirements for the command
    pub fn parameters_info(&self) -> Vec<(&'static str, &'static str, bool)> {
        match self {
            Self::StripeCoverage { .. } => vec![(
                "threshold_level",
                "Intensity margin below the brightest ROI pixel (omit for adaptive)",
                false,
            )],
            Self::SilhouetteArea => vec![],
        }
    }

    pub fn execute(
        &self,
        image: &DynamicImage,
        stripe: &StripeCoverageAnalyzer,
        silhouette: &SilhouetteAreaAnalyzer,
    ) -> Result<AnalysisOutcome> {
        match self {
            Self::StripeCoverage { threshold_level } => stripe
                .analyze(image, (*threshold_level).into())
                .map(AnalysisOutcome::Stripe),
            Self::SilhouetteArea => silhouette.analyze(image).map(AnalysisOutcome::Silhouette),
        }
    }
}
