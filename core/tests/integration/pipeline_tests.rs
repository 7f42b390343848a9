//! Batch runs over a synthetic project directory.

use super::test_utils::{MockEngine, TiffBuilder};
use fibresem_core::{
    AnalysisMethod, DiameterEngine, LengthUnit, MeasurementSource, Pipeline, PipelineConfig,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Three readable images, one broken file and one unrelated file
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    TiffBuilder::new(120, 100)
        .with_pixel_size("10.0 nm")
        .write_to(&root.join("PA6_01.tif"));
    TiffBuilder::new(120, 100)
        .with_pixel_size("10.0 nm")
        .big_endian()
        .write_to(&root.join("PA6_02.tif"));
    TiffBuilder::new(120, 100).write_to(&root.join("PA12_01.tif"));
    fs::write(root.join("zz_broken.tif"), b"II*\0garbage").unwrap();
    fs::write(root.join("notes.txt"), b"not an image").unwrap();

    dir
}

fn config() -> PipelineConfig {
    PipelineConfig::default()
        .with_bar_height(0.1)
        .with_analysis_method(AnalysisMethod::External)
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_previews_and_results() {
    let dir = project();
    let mut engine = MockEngine::new();
    let pipeline = Pipeline::new(config());

    let report = pipeline.run(dir.path(), Some(&mut engine)).unwrap();

    assert_eq!(report.total(), 4);
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file_name, "zz_broken.tif");

    let cropped = dir.path().join("cropped");
    assert_eq!(
        file_names(&cropped),
        vec!["PA12_01.png", "PA6_01.png", "PA6_02.png"]
    );
    for preview in &report.previews {
        let image = image::open(preview).unwrap();
        assert_eq!((image.width(), image.height()), (90, 90));
    }

    let rows = report.results.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].file_name, "PA12_01.tif");
    assert!(rows[0].measurement.average().is_nan());
    assert_eq!(rows[0].measurement.pixels.pixel_average, 20.0);

    // 20 px at 10 nm per pixel
    assert_eq!(rows[1].sample_name, "PA6");
    assert!((rows[1].measurement.average() - 0.2).abs() < 1e-12);
    assert_eq!(report.results.sample_names(), vec!["PA12", "PA6"]);
    assert_eq!(report.results.unit(), LengthUnit::Micrometre);
}

#[test]
fn test_engine_requests() {
    let dir = project();
    let mut engine = MockEngine::new();
    Pipeline::new(config())
        .run(dir.path(), Some(&mut engine))
        .unwrap();

    assert_eq!(engine.requests.len(), 3);

    let uncalibrated = &engine.requests[0];
    assert_eq!(uncalibrated.file_name, "PA12_01.tif");
    assert_eq!(uncalibrated.pixel_size_value, 1.0);
    assert_eq!(uncalibrated.pixel_size_unit, "px");
    assert!(uncalibrated.optimise_for_thin_fibres);

    let calibrated = &engine.requests[1];
    assert_eq!(calibrated.pixel_size_value, 10.0);
    assert_eq!(calibrated.pixel_size_unit, "nm");
    assert_eq!(
        calibrated.source,
        MeasurementSource::File(dir.path().join("PA6_01.tif"))
    );
}

#[test]
fn test_pixels_sent_to_engine() {
    let dir = project();
    let mut engine = MockEngine::new();
    let pipeline = Pipeline::new(
        config()
            .with_crop(false)
            .load_externally(false)
            .optimise_for_thin_fibres(false),
    );

    let report = pipeline.run(dir.path(), Some(&mut engine)).unwrap();

    assert!(report.previews.is_empty());
    assert!(!dir.path().join("cropped").exists());
    for request in &engine.requests {
        assert!(!request.optimise_for_thin_fibres);
        match &request.source {
            MeasurementSource::Pixels(image) => {
                assert_eq!(image.dimensions(), (90, 90));
            }
            other => panic!("expected pixels, got {other:?}"),
        }
    }
}

#[test]
fn test_engine_failure_skips_one_image() {
    let dir = project();
    let mut engine = MockEngine::new().failing_for("PA6_02.tif");

    let report = Pipeline::new(config())
        .run(dir.path(), Some(&mut engine))
        .unwrap();

    assert_eq!(report.records.len(), 3);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.total(), 4);

    let skipped: Vec<&str> = report
        .skipped
        .iter()
        .map(|s| s.file_name.as_str())
        .collect();
    assert_eq!(skipped, vec!["PA6_02.tif", "zz_broken.tif"]);
    assert!(report.skipped[0].reason.contains("no fibres found"));
}

#[test]
fn test_analysis_disabled() {
    let dir = project();
    let mut engine = MockEngine::new();
    let pipeline = Pipeline::new(config().with_analysis_method(AnalysisMethod::None));

    let report = pipeline.run(dir.path(), Some(&mut engine)).unwrap();
    assert!(engine.requests.is_empty());
    assert!(report.results.is_empty());
    assert_eq!(report.previews.len(), 3);

    // External analysis without an engine only crops
    let report = Pipeline::new(config()).run(dir.path(), None).unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.previews.len(), 3);
}

#[test]
fn test_rerun_overwrites_previews() {
    let dir = project();
    let pipeline = Pipeline::new(config().with_output_folder("previews"));

    let first = pipeline.run(dir.path(), None).unwrap();
    let second = pipeline.run(dir.path(), None).unwrap();

    assert_eq!(first.previews, second.previews);
    assert_eq!(file_names(&dir.path().join("previews")).len(), 3);
}

#[test]
fn test_engine_closed_by_caller() {
    let dir = project();
    let mut engine = MockEngine::new();
    Pipeline::new(config())
        .run(dir.path(), Some(&mut engine))
        .unwrap();

    assert!(!engine.closed);
    engine.close().unwrap();
    assert!(engine.closed);
}
