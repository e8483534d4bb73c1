pub mod batch;
pub mod interactive;
pub mod results;

use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use specimen::{AnalysisCommand, SilhouetteConfig, SpecimenError, StripeCoverageConfig};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use results::{AreaRecord, CsvRecord, StripeRecord, append_outcome, append_record};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Analysis(#[from] SpecimenError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Documents that can be read from and written to `.toml` or `.json` files
pub trait ConfigFile: Serialize + DeserializeOwned {
    /// Load from a TOML file
    fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from TOML string
    fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a JSON file
    fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load from JSON string
    fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Save to a TOML file
    fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }

    fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Save to a JSON file
    fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let content = self.to_json()?;
        fs::write(path, content)?;
        Ok(())
    }

    fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }
}

/// Where the stripe analysis finds images and stores results
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct StripeSection {
    pub input_dir: PathBuf,
    pub extension: String,
    pub results_path: PathBuf,
}

impl Default for StripeSection {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./data/analysis"),
            extension: "jpg".to_string(),
            results_path: PathBuf::from("./result/analysis.csv"),
        }
    }
}

impl StripeSection {
    /// `<input_dir>/<name>.<extension>`
    pub fn image_path(&self, name: &str) -> PathBuf {
        self.input_dir
            .join(format!("{}.{}", name, self.extension.trim_start_matches('.')))
    }
}

/// Where the area analysis finds images and stores results
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AreaSection {
    pub input_dir: PathBuf,
    pub extension: String,
    pub results_path: PathBuf,
}

impl Default for AreaSection {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./data/area"),
            extension: "jpg".to_string(),
            results_path: PathBuf::from("./result/area.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Upper bound on images analysed at once by the `area` command
    #[schemars(range(min = 1))]
    pub max_workers: usize,
    pub stripe: StripeSection,
    pub area: AreaSection,
    pub analysis: StripeCoverageConfig,
    pub silhouette: SilhouetteConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            stripe: StripeSection::default(),
            area: AreaSection::default(),
            analysis: StripeCoverageConfig::default(),
            silhouette: SilhouetteConfig::default(),
        }
    }
}

impl ConfigFile for AppConfig {}

impl AppConfig {
    /// Load from `path` when given, otherwise use the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

pub fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// One image and the analysis to run on it
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchJob {
    pub path: PathBuf,
    pub command: AnalysisCommand,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchManifest {
    pub jobs: Vec<BatchJob>,
    #[serde(default = "default_stripe_results")]
    pub stripe_results: PathBuf,
    #[serde(default = "default_area_results")]
    pub area_results: PathBuf,
}

impl ConfigFile for BatchManifest {}

fn default_stripe_results() -> PathBuf {
    StripeSection::default().results_path
}

fn default_area_results() -> PathBuf {
    AreaSection::default().results_path
}

/// Files in `dir` whose extension matches `extension` case-insensitively,
/// sorted by name
pub fn scan_images(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, CliError> {
    let wanted = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.stripe.input_dir, PathBuf::from("./data/analysis"));
        assert_eq!(config.area.results_path, PathBuf::from("./result/area.csv"));
        assert_eq!(config.silhouette.threshold, 50);
        assert!(config.max_workers >= 1);
    }

    #[test]
    fn test_partial_sections_keep_their_own_defaults() {
        let config = AppConfig::from_toml(
            r#"
            max_workers = 3

            [area]
            input_dir = "/tmp/area"

            [analysis]
            std_multiplier = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.area.input_dir, PathBuf::from("/tmp/area"));
        assert_eq!(config.area.results_path, PathBuf::from("./result/area.csv"));
        assert_eq!(config.stripe, StripeSection::default());
        assert_eq!(config.analysis.std_multiplier, 1.5);
    }

    #[test]
    fn test_config_file_round_trip_and_format_detection() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            max_workers: 2,
            ..AppConfig::default()
        };

        let toml_path = dir.path().join("app.toml");
        config.to_toml_file(&toml_path).unwrap();
        assert_eq!(AppConfig::from_file(&toml_path).unwrap(), config);

        let json_path = dir.path().join("app.json");
        config.to_json_file(&json_path).unwrap();
        assert_eq!(AppConfig::load(Some(&json_path)).unwrap(), config);

        let yaml_path = dir.path().join("app.yaml");
        fs::write(&yaml_path, "").unwrap();
        assert!(matches!(
            AppConfig::from_file(&yaml_path),
            Err(CliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_stripe_image_path() {
        let section = StripeSection {
            extension: ".png".to_string(),
            ..StripeSection::default()
        };
        assert_eq!(section.image_path("eye_03"), PathBuf::from("./data/analysis/eye_03.png"));
    }

    #[test]
    fn test_scan_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.jpg", "c.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let files = scan_images(dir.path(), "jpg").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.JPG"]);

        assert!(scan_images(&dir.path().join("missing"), "jpg").is_err());
    }

    #[test]
    fn test_manifest_parses_commands() {
        let manifest = BatchManifest::from_json(
            r#"{
                "jobs": [
                    {"path": "a.jpg", "command": {"type": "stripe_coverage", "params": {"threshold_level": 25}}},
                    {"path": "b.jpg", "command": {"type": "silhouette_area"}}
                ],
                "area_results": "out/area.csv"
            }"#,
        )
        .unwrap();
        assert_eq!(manifest.jobs.len(), 2);
        assert_eq!(
            manifest.jobs[0].command,
            AnalysisCommand::StripeCoverage { threshold_level: Some(25) }
        );
        assert_eq!(manifest.stripe_results, PathBuf::from("./result/analysis.csv"));
        assert_eq!(manifest.area_results, PathBuf::from("out/area.csv"));
    }
}
