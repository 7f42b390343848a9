use crate::analysis::{
    DiameterEngine, Measurement, MeasurementRequest, MeasurementSource, ResultRow, ResultTable,
};
use crate::error::{FibresemError, Result};
use crate::extraction::read_image;
use crate::project::ImageRecord;
use crate::types::{AnalysisMethod, CropRectangle, PipelineConfig};
use image::{DynamicImage, ImageFormat};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Collects image files in `directory` whose extension matches `extension`
///
/// The match ignores ASCII case; the result is sorted by path.
pub fn collect_image_files(directory: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension() {
                if ext.eq_ignore_ascii_case(extension) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Image left out of the results, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SkippedImage {
    pub file_name: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct BatchReport {
    /// Records of every image that could be read
    pub records: Vec<ImageRecord>,

    /// Cropped previews written
    pub previews: Vec<PathBuf>,

    /// Diameter results of successfully measured images
    pub results: ResultTable,

    /// Images that could not be read or measured
    pub skipped: Vec<SkippedImage>,
}

impl BatchReport {
    fn new(config: &PipelineConfig) -> Self {
        Self {
            records: Vec::new(),
            previews: Vec::new(),
            results: ResultTable::new(config.target_unit),
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, file_name: &str, reason: impl ToString) {
        self.skipped.push(SkippedImage {
            file_name: file_name.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Number of images found in the directory
    pub fn total(&self) -> usize {
        let unread = self
            .skipped
            .iter()
            .filter(|s| !self.has_record(&s.file_name))
            .count();
        self.records.len() + unread
    }

    fn has_record(&self, file_name: &str) -> bool {
        self.records.iter().any(|r| r.file_name == file_name)
    }
}

/// Sequential batch runner over a project directory
///
/// Each image is read, its metadata extracted, the information bar cropped
/// away, and the result optionally handed to a diameter engine, one image at
/// a time.
///
/// # Example
///
/// ```no_run
/// use fibresem_core::{Pipeline, PipelineConfig};
/// use std::path::Path;
///
/// let pipeline = Pipeline::new(PipelineConfig::default());
/// let report = pipeline.run(Path::new("/data/project"), None)?;
/// println!("{} previews written", report.previews.len());
/// # Ok::<(), fibresem_core::FibresemError>(())
/// ```
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Folder receiving cropped previews for `directory`
    pub fn output_directory(&self, directory: &Path) -> PathBuf {
        directory.join(&self.config.output_folder_name)
    }

    /// Processes every matching image in `directory`
    ///
    /// # Errors
    ///
    /// Only an unreadable directory fails the batch. Failures of single images
    /// are logged and listed in [`BatchReport::skipped`].
    pub fn run(
        &self,
        directory: &Path,
        mut engine: Option<&mut dyn DiameterEngine>,
    ) -> Result<BatchReport> {
        let files = collect_image_files(directory, &self.config.extension)?;
        info!(
            "Found {} .{} files in {}",
            files.len(),
            self.config.extension,
            directory.display()
        );

        match (self.config.analysis_method, engine.is_some()) {
            (AnalysisMethod::External, false) => {
                warn!("No diameter engine available, skipping diameter analysis")
            }
            (AnalysisMethod::None, true) => debug!("Analysis method is none, engine unused"),
            _ => {}
        }

        let mut report = BatchReport::new(&self.config);
        let total = files.len();
        for (index, path) in files.into_iter().enumerate() {
            info!(
                "Processing {:02} of {:02}: {}",
                index + 1,
                total,
                path.display()
            );
            self.process_image(directory, path, engine.as_deref_mut(), &mut report);
        }

        info!(
            "Processed {} images, {} measured, {} skipped",
            report.records.len(),
            report.results.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn process_image(
        &self,
        directory: &Path,
        path: PathBuf,
        engine: Option<&mut (dyn DiameterEngine + '_)>,
        report: &mut BatchReport,
    ) {
        let (tags, image) = match read_image(&path) {
            Ok(read) => read,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                let file_name = path
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                report.skip(&file_name, e);
                return;
            }
        };

        let record = ImageRecord::from_tags(path, &tags, &self.config.sample_naming);
        if !record.metadata.has_calibration() {
            warn!(
                "{}: no pixel calibration, physical sizes will be NaN",
                record.file_name
            );
        }

        let rect = CropRectangle::compute(image.height(), image.width(), self.config.bar_height);
        let cropped = match rect {
            Ok(rect) => {
                debug!("{}: crop {}", record.file_name, rect);
                Some(rect.apply(&image))
            }
            Err(e) => {
                warn!("{}: {}; image left uncropped", record.file_name, e);
                None
            }
        };

        if self.config.crop {
            if let Some(cropped) = &cropped {
                match save_preview(cropped, &self.output_directory(directory), &record.stem) {
                    Ok(preview) => {
                        debug!("Wrote {}", preview.display());
                        report.previews.push(preview);
                    }
                    Err(e) => warn!("{}: could not write preview: {}", record.file_name, e),
                }
            }
        }

        if self.config.analysis_method == AnalysisMethod::External {
            if let Some(engine) = engine {
                let pixels = cropped.as_ref().unwrap_or(&image);
                match self.measure(engine, &record, pixels) {
                    Ok(row) => {
                        info!("{}: {}", record.file_name, row.measurement);
                        report.results.push(row);
                    }
                    Err(e) => {
                        warn!("{}: measurement failed: {}", record.file_name, e);
                        report.skip(&record.file_name, e);
                    }
                }
            }
        }

        report.records.push(record);
    }

    fn measure(
        &self,
        engine: &mut (dyn DiameterEngine + '_),
        record: &ImageRecord,
        pixels: &DynamicImage,
    ) -> Result<ResultRow> {
        let source = if self.config.load_externally {
            MeasurementSource::File(record.file_path.clone())
        } else {
            MeasurementSource::Pixels(pixels.to_luma8())
        };
        let calibration = &record.metadata.calibration;
        let request = MeasurementRequest::new(
            record.file_name.clone(),
            source,
            calibration,
            self.config.optimise_for_thin_fibres,
        );

        debug!("{}: measuring with {}", record.file_name, engine.name());
        let pixel_measurement = engine.measure(&request)?;

        Ok(ResultRow {
            file_name: record.file_name.clone(),
            sample_name: record.sample_name.clone(),
            calibration: calibration.clone(),
            measurement: Measurement::new(pixel_measurement, calibration, self.config.target_unit),
        })
    }
}

/// Writes `image` as `<stem>.png` into `directory`, creating it if needed
pub fn save_preview(image: &DynamicImage, directory: &Path, stem: &str) -> Result<PathBuf> {
    fs::create_dir_all(directory)?;
    let path = directory.join(format!("{}.png", stem));
    image
        .save_with_format(&path, ImageFormat::Png)
        .map_err(|e| FibresemError::IoError(io::Error::other(e)))?;
    Ok(path)
}
