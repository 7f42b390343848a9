use clap::Parser;
use fibresem_core::cli::{Cli, OutputFormat};
use fibresem_core::{SemExtractor, SemMetadata, TextReport};
use log::{error, info};
use std::process;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    info!("Processing file: {}", cli.file.display());

    // Extract tags and calibration
    let metadata = match SemExtractor::from_file(&cli.file) {
        Ok(metadata) => metadata,
        Err(e) => {
            error!("Failed to read {}: {}", cli.file.display(), e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if !metadata.has_calibration() {
        info!("No pixel calibration found in {}", cli.file.display());
    }

    // Output results
    match cli.format {
        OutputFormat::Text => {
            let report = TextReport::new(&metadata)
                .with_unit(cli.unit)
                .with_bar_height(cli.bar_height)
                .show_block(cli.all);
            print!("{}", report);
        }
        OutputFormat::Json => output_json(&metadata, &cli),
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

#[cfg(feature = "json")]
fn output_json(metadata: &SemMetadata, cli: &Cli) {
    use serde::Serialize;

    #[derive(Serialize)]
    struct InfoJson<'a> {
        file: String,
        metadata: &'a SemMetadata,
        unit: fibresem_core::LengthUnit,
        conversion_factor: f64,
        crop: Option<fibresem_core::CropRectangle>,
    }

    let output = InfoJson {
        file: cli.file.display().to_string(),
        metadata,
        unit: cli.unit,
        conversion_factor: metadata.conversion_factor(cli.unit),
        crop: metadata
            .crop_rectangle(cli.bar_height)
            .and_then(|rect| rect.ok()),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize to JSON: {}", e);
            eprintln!("Error: Failed to serialize to JSON: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(not(feature = "json"))]
fn output_json(_metadata: &SemMetadata, _cli: &Cli) {
    eprintln!("Error: JSON output requires the 'json' feature");
    eprintln!("Rebuild with: cargo build --features json");
    process::exit(1);
}
