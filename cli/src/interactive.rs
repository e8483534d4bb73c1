use std::io::{BufRead, Write};

use specimen::{StripeCoverageAnalyzer, ThresholdSpec};
use tracing::{info, warn};

use crate::{CliError, StripeSection, StripeRecord, append_record};

/// Prompt/response loop for analysing stripe images one at a time.
///
/// Reads commands from `input` and writes prompts to `output`; ends on
/// `exit` or end of input. Returns the number of results saved.
pub struct InteractiveSession<'a, R, W> {
    input: R,
    output: W,
    section: &'a StripeSection,
    analyzer: &'a StripeCoverageAnalyzer,
    saved: usize,
}

enum Reply {
    Line(String),
    Closed,
}

impl<'a, R: BufRead, W: Write> InteractiveSession<'a, R, W> {
    pub fn new(
        input: R,
        output: W,
        section: &'a StripeSection,
        analyzer: &'a StripeCoverageAnalyzer,
    ) -> Self {
        Self {
            input,
            output,
            section,
            analyzer,
            saved: 0,
        }
    }

    pub fn run(mut self) -> Result<usize, CliError> {
        loop {
            writeln!(self.output, "=== File Processing Program ===")?;
            let Reply::Line(name) = self.ask("Enter the file name (or type 'exit' to quit): ")? else {
                return Ok(self.saved);
            };
            if name.eq_ignore_ascii_case("exit") {
                writeln!(self.output, "Exiting the program. Goodbye!")?;
                return Ok(self.saved);
            }

            if !self.process(&name)? {
                return Ok(self.saved);
            }
        }
    }

    /// Analyse `name` until the user accepts a result or the image cannot be
    /// read. Returns `false` when input ran out.
    fn process(&mut self, name: &str) -> Result<bool, CliError> {
        let path = self.section.image_path(name);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());

        loop {
            writeln!(self.output, "Processing {display_name}")?;
            let image = match specimen::load_image(&path) {
                Ok(image) => image,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load image");
                    writeln!(self.output, "Error: Image {display_name} not found.")?;
                    return Ok(true);
                }
            };

            let Reply::Line(mode) = self.ask(
                "Enter 'm' to manually set the threshold level, or any other key to use the default threshold level: ",
            )?
            else {
                return Ok(false);
            };

            let threshold = if mode.eq_ignore_ascii_case("m") {
                writeln!(self.output, "Manual mode selected.")?;
                writeln!(
                    self.output,
                    "The lower the threshold level, the stricter the thresholding (filtering out more white pixels) will be."
                )?;
                match self.ask_level()? {
                    Some(level) => ThresholdSpec::Manual(level),
                    None => return Ok(false),
                }
            } else {
                ThresholdSpec::Adaptive
            };

            let coverage = match self.analyzer.analyze(&image, threshold) {
                Ok(coverage) => coverage,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "analysis failed");
                    writeln!(self.output, "Error: {e}")?;
                    return Ok(true);
                }
            };
            writeln!(
                self.output,
                "White stripe pixels in the region of interest: {}/{}",
                coverage.white_pixel_count, coverage.total_pixel_count
            )?;

            let Reply::Line(answer) = self.ask("Are you satisfied with the results? (y/n) ")? else {
                return Ok(false);
            };
            if answer.eq_ignore_ascii_case("y") {
                append_record(
                    &self.section.results_path,
                    &StripeRecord {
                        file_name: name.to_string(),
                        coverage,
                    },
                )?;
                self.saved += 1;
                info!(file = name, results = %self.section.results_path.display(), "result saved");
                writeln!(
                    self.output,
                    "Results for {display_name} have been saved to {}",
                    self.section.results_path.display()
                )?;
                return Ok(true);
            }
            writeln!(self.output, "Retrying the same file. You can adjust the parameters.")?;
        }
    }

    /// Re-prompts until an integer is entered; `None` on end of input
    fn ask_level(&mut self) -> Result<Option<i32>, CliError> {
        loop {
            let Reply::Line(line) = self.ask("Enter the threshold level: ")? else {
                return Ok(None);
            };
            match line.parse::<i32>() {
                Ok(level) => return Ok(Some(level)),
                Err(_) => writeln!(self.output, "Please enter a whole number.")?,
            }
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<Reply, CliError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Reply::Closed);
        }
        Ok(Reply::Line(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::{fs, io::Cursor, path::Path};

    fn write_specimen(dir: &Path, name: &str) {
        let image = RgbImage::from_fn(60, 60, |x, y| {
            let ring = (10..50).contains(&x)
                && (10..50).contains(&y)
                && (x < 13 || x >= 47 || y < 13 || y >= 47);
            let patch = (25..35).contains(&x) && (25..35).contains(&y);
            match (ring, patch) {
                (true, _) => Rgb([0, 0, 0]),
                (false, true) => Rgb([240, 240, 240]),
                _ => Rgb([120, 120, 120]),
            }
        });
        image.save(dir.join(format!("{name}.png"))).unwrap();
    }

    fn section(dir: &Path) -> StripeSection {
        StripeSection {
            input_dir: dir.to_path_buf(),
            extension: "png".to_string(),
            results_path: dir.join("out").join("analysis.csv"),
        }
    }

    fn run(script: &str, section: &StripeSection) -> (usize, String) {
        let analyzer = StripeCoverageAnalyzer::default();
        let mut output = Vec::new();
        let saved = InteractiveSession::new(Cursor::new(script.to_string()), &mut output, section, &analyzer)
            .run()
            .unwrap();
        (saved, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_exit_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let (saved, output) = run("EXIT\n", &section(dir.path()));
        assert_eq!(saved, 0);
        assert!(output.contains("Goodbye!"));
    }

    #[test]
    fn test_missing_image_prompts_again() {
        let dir = tempfile::tempdir().unwrap();
        let (saved, output) = run("ghost\nexit\n", &section(dir.path()));
        assert_eq!(saved, 0);
        assert!(output.contains("Error: Image ghost.png not found."));
        assert_eq!(output.matches("Enter the file name").count(), 2);
    }

    #[test]
    fn test_retry_then_save() {
        let dir = tempfile::tempdir().unwrap();
        write_specimen(dir.path(), "eye_01");
        let section = section(dir.path());

        let script = "eye_01\n\nn\nm\nabc\n255\ny\nexit\n";
        let (saved, output) = run(script, &section);
        assert_eq!(saved, 1);
        assert!(output.contains("Retrying the same file."));
        assert!(output.contains("Manual mode selected."));
        assert!(output.contains("Please enter a whole number."));

        let csv = fs::read_to_string(&section.results_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "File Name,White Pixel Count,Total Pixels");
        // A level of 255 puts the cut-off at zero, so the whole ROI counts
        assert_eq!(lines[1], "eye_01,1600,3600");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_end_of_input_stops_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        write_specimen(dir.path(), "eye_02");
        let (saved, _) = run("eye_02\nm\n", &section(dir.path()));
        assert_eq!(saved, 0);
    }
}
