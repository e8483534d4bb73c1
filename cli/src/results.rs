use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use specimen::{AnalysisOutcome, SilhouetteMeasurement, StripeCoverage};
use tracing::debug;

use crate::CliError;

/// A row of one of the append-only result files
pub trait CsvRecord {
    const HEADER: &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StripeRecord {
    /// Image base name without extension
    pub file_name: String,
    pub coverage: StripeCoverage,
}

impl CsvRecord for StripeRecord {
    const HEADER: &'static [&'static str] = &["File Name", "White Pixel Count", "Total Pixels"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.file_name.clone(),
            self.coverage.white_pixel_count.to_string(),
            self.coverage.total_pixel_count.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaRecord {
    /// Image file name including extension
    pub file_name: String,
    pub measurement: SilhouetteMeasurement,
}

impl CsvRecord for AreaRecord {
    const HEADER: &'static [&'static str] = &["File Name", "Area"];

    fn fields(&self) -> Vec<String> {
        let area = match self.measurement {
            SilhouetteMeasurement::Area(area) => area.to_string(),
            SilhouetteMeasurement::NoRegionFound => "Error".to_string(),
        };
        vec![self.file_name.clone(), area]
    }
}

/// Append `record` to the CSV file at `path`.
///
/// The header is written only when the file does not exist yet; missing
/// parent directories are created.
pub fn append_record<R: CsvRecord>(path: &Path, record: &R) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let is_new = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut content = String::new();
    if is_new {
        push_row(&mut content, R::HEADER.iter().copied());
    }
    let fields = record.fields();
    push_row(&mut content, fields.iter().map(String::as_str));
    file.write_all(content.as_bytes())?;

    debug!(path = %path.display(), "result appended");
    Ok(())
}

/// Route an outcome to the matching results file, naming the image the way
/// that file expects
pub fn append_outcome(
    image_path: &Path,
    outcome: &AnalysisOutcome,
    stripe_results: &Path,
    area_results: &Path,
) -> Result<(), CliError> {
    match outcome {
        AnalysisOutcome::Stripe(coverage) => append_record(
            stripe_results,
            &StripeRecord {
                file_name: file_stem(image_path),
                coverage: *coverage,
            },
        ),
        AnalysisOutcome::Silhouette(measurement) => append_record(
            area_results,
            &AreaRecord {
                file_name: file_name(image_path),
                measurement: *measurement,
            },
        ),
    }
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str("\r\n");
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
