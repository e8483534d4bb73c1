use std::path::{Path, PathBuf};
use std::sync::Arc;

use specimen::{
    ImageDumpObserver, ObserverSet, SilhouetteAreaAnalyzer, SilhouetteAreaAnalyzerBuilder,
    SilhouetteMeasurement, SpecimenError, StripeCoverageAnalyzer, StripeCoverageAnalyzerBuilder,
    TracingObserver,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::{AppConfig, AreaRecord, BatchManifest, CliError, append_outcome, append_record, results::file_name, scan_images};

/// Logging observers, plus stage image dumps named after `prefix` when a
/// directory is given
pub fn observers(dump: Option<(&Path, &str)>) -> ObserverSet {
    let observers = ObserverSet::new().with(TracingObserver);
    match dump {
        Some((dir, prefix)) => observers.with(ImageDumpObserver::new(dir, prefix)),
        None => observers,
    }
}

pub fn stripe_analyzer(config: &AppConfig, dump: Option<(&Path, &str)>) -> StripeCoverageAnalyzer {
    StripeCoverageAnalyzerBuilder::from_config(&config.analysis)
        .observer(observers(dump))
        .build()
}

pub fn silhouette_analyzer(config: &AppConfig, dump: Option<(&Path, &str)>) -> SilhouetteAreaAnalyzer {
    SilhouetteAreaAnalyzerBuilder::from_config(&config.silhouette)
        .observer(observers(dump))
        .build()
}

type AreaResult = (PathBuf, specimen::Result<SilhouetteMeasurement>);

/// Measure every image of the area input directory, at most `jobs` at a time
/// (`max_workers` when `None`).
///
/// Rows are appended by this task as results arrive. Images that fail to load
/// or analyse, and rows that fail to write, are logged and skipped. Returns
/// the number of rows written.
pub async fn measure_areas(
    config: &AppConfig,
    jobs: Option<usize>,
    dump_dir: Option<PathBuf>,
) -> Result<usize, CliError> {
    let section = &config.area;
    info!("=== Area Calculation Program ===");
    info!("Processing all files in {}", section.input_dir.display());

    let files = scan_images(&section.input_dir, &section.extension)?;
    let workers = jobs.unwrap_or(config.max_workers).max(1);
    let semaphore = Arc::new(Semaphore::new(workers));
    let shared = Arc::new(config.clone());
    let dump_dir = dump_dir.map(Arc::new);

    let mut pending: JoinSet<AreaResult> = JoinSet::new();
    for path in files {
        let semaphore = semaphore.clone();
        let config = shared.clone();
        let dump_dir = dump_dir.clone();
        pending.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let task_path = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                let name = file_name(&task_path);
                let analyzer = silhouette_analyzer(
                    &config,
                    dump_dir.as_deref().map(|dir| (dir.as_path(), name.as_str())),
                );
                specimen::load_image(&task_path).and_then(|image| analyzer.analyze(&image))
            })
            .await
            .unwrap_or_else(|e| Err(SpecimenError::ImageProcessing(e.to_string())));
            (path, result)
        });
    }

    let mut recorded = 0usize;
    while let Some(joined) = pending.join_next().await {
        let (path, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                error!("Worker task failed: {}", e);
                continue;
            }
        };
        let file = file_name(&path);
        let measurement = match result {
            Ok(measurement) => measurement,
            Err(e) => {
                warn!("Skipping {}: {}", file, e);
                continue;
            }
        };

        match measurement {
            SilhouetteMeasurement::Area(area) => info!("Area for {}: {}", file, area),
            SilhouetteMeasurement::NoRegionFound => warn!("No black outline found in {}", file),
        }
        let record = AreaRecord {
            file_name: file.clone(),
            measurement,
        };
        if let Err(e) = append_record(&section.results_path, &record) {
            error!("Cannot save result for {}: {}", file, e);
            continue;
        }
        recorded += 1;
    }

    info!("=== Processing Completed ({} file(s) recorded) ===", recorded);
    Ok(recorded)
}

/// Run every manifest job in order, routing each outcome to its results
/// file. Per-job failures are logged and skipped. Returns the number of rows
/// written.
pub fn run_manifest(config: &AppConfig, manifest: &BatchManifest) -> usize {
    let stripe = stripe_analyzer(config, None);
    let silhouette = silhouette_analyzer(config, None);

    let mut recorded = 0usize;
    for job in &manifest.jobs {
        info!("{} -> {}", job.path.display(), job.command);
        let outcome = match specimen::load_image(&job.path)
            .and_then(|image| job.command.execute(&image, &stripe, &silhouette))
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Skipping {}: {}", job.path.display(), e);
                continue;
            }
        };
        if let Err(e) = append_outcome(&job.path, &outcome, &manifest.stripe_results, &manifest.area_results) {
            error!("Cannot save result for {}: {}", job.path.display(), e);
            continue;
        }
        recorded += 1;
    }

    info!("✅ Batch completed ({} of {} job(s) recorded)", recorded, manifest.jobs.len());
    recorded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AreaSection, BatchJob};
    use image::{Rgb, RgbImage};
    use specimen::AnalysisCommand;
    use std::fs;

    fn square_on_black(path: &Path) {
        RgbImage::from_fn(200, 200, |x, y| {
            let inside = (75..125).contains(&x) && (75..125).contains(&y);
            if inside { Rgb([120, 120, 120]) } else { Rgb([0, 0, 0]) }
        })
        .save(path)
        .unwrap();
    }

    fn data_rows(path: &Path) -> Vec<String> {
        let content = fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("File Name,Area"));
        let mut rows: Vec<String> = lines.map(str::to_string).collect();
        rows.sort();
        rows
    }

    #[tokio::test]
    async fn test_area_run_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("area");
        fs::create_dir(&input).unwrap();
        square_on_black(&input.join("a_square.png"));
        RgbImage::from_pixel(64, 48, Rgb([0, 0, 0])).save(input.join("b_black.png")).unwrap();
        fs::write(input.join("c_corrupt.png"), b"definitely not a png").unwrap();
        fs::write(input.join("notes.txt"), b"ignored").unwrap();

        let config = AppConfig {
            area: AreaSection {
                input_dir: input,
                extension: "png".to_string(),
                results_path: dir.path().join("result").join("area.csv"),
            },
            ..AppConfig::default()
        };

        let recorded = measure_areas(&config, Some(1), None).await.unwrap();
        assert_eq!(recorded, 2);
        assert_eq!(
            data_rows(&config.area.results_path),
            vec!["a_square.png,2500", "b_black.png,Error"]
        );
    }

    #[tokio::test]
    async fn test_area_run_dumps_stages() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("area");
        fs::create_dir(&input).unwrap();
        square_on_black(&input.join("wing.png"));
        let dumps = dir.path().join("dumps");

        let config = AppConfig {
            area: AreaSection {
                input_dir: input,
                extension: "png".to_string(),
                results_path: dir.path().join("area.csv"),
            },
            ..AppConfig::default()
        };
        assert_eq!(measure_areas(&config, None, Some(dumps.clone())).await.unwrap(), 1);
        assert!(dumps.join("wing.png_silhouette_area_binary.png").exists());
    }

    #[tokio::test]
    async fn test_missing_input_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            area: AreaSection {
                input_dir: dir.path().join("missing"),
                ..AreaSection::default()
            },
            ..AppConfig::default()
        };
        assert!(measure_areas(&config, Some(2), None).await.is_err());
    }

    #[test]
    fn test_manifest_routes_rows_to_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("plate.png");
        square_on_black(&image);

        let manifest = BatchManifest {
            jobs: vec![
                BatchJob {
                    path: image.clone(),
                    command: AnalysisCommand::StripeCoverage { threshold_level: Some(10) },
                },
                BatchJob {
                    path: dir.path().join("missing.png"),
                    command: AnalysisCommand::SilhouetteArea,
                },
                BatchJob {
                    path: image,
                    command: AnalysisCommand::SilhouetteArea,
                },
            ],
            stripe_results: dir.path().join("analysis.csv"),
            area_results: dir.path().join("area.csv"),
        };

        assert_eq!(run_manifest(&AppConfig::default(), &manifest), 2);

        let stripe = fs::read_to_string(&manifest.stripe_results).unwrap();
        let stripe_rows: Vec<&str> = stripe.lines().collect();
        assert_eq!(stripe_rows.len(), 2);
        assert!(stripe_rows[1].starts_with("plate,"));
        assert!(stripe_rows[1].ends_with(",40000"));

        assert_eq!(data_rows(&manifest.area_results), vec!["plate.png,2500"]);
    }

    #[test]
    fn test_manifest_continues_after_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("plate.png");
        square_on_black(&image);

        // A directory where the stripe CSV should be makes that append fail
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();

        let manifest = BatchManifest {
            jobs: vec![
                BatchJob {
                    path: image.clone(),
                    command: AnalysisCommand::StripeCoverage { threshold_level: None },
                },
                BatchJob {
                    path: image,
                    command: AnalysisCommand::SilhouetteArea,
                },
            ],
            stripe_results: blocked,
            area_results: dir.path().join("area.csv"),
        };

        assert_eq!(run_manifest(&AppConfig::default(), &manifest), 1);
        assert_eq!(data_rows(&manifest.area_results), vec!["plate.png,2500"]);
    }
}
