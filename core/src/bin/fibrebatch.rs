use clap::{Parser, ValueEnum};
use fibresem_core::cli::parse_unit;
use fibresem_core::{
    AnalysisMethod, BatchReport, BatchTextReport, DiameterEngine, EngineConfig, LengthUnit,
    Pipeline, PipelineConfig, SampleNaming, SubprocessEngine, DEFAULT_BAR_HEIGHT,
};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

/// CLI tool for cropping and measuring a directory of SEM images
#[derive(Parser, Debug)]
#[command(name = "fibrebatch")]
#[command(about = "Crop SEM images and measure fibre diameters for a whole directory")]
#[command(version)]
struct Cli {
    /// Directory containing SEM TIFF files
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Do not write cropped previews
    #[arg(long)]
    no_crop: bool,

    /// Information bar height as a fraction of the image height
    #[arg(long, default_value_t = DEFAULT_BAR_HEIGHT)]
    bar_height: f64,

    /// Folder below DIRECTORY receiving cropped previews
    #[arg(long, default_value = "cropped")]
    output_folder: String,

    /// Extension of the image files to process
    #[arg(long, default_value = "tif")]
    extension: String,

    /// Unit of reported diameters
    #[arg(short, long, default_value = "um", value_parser = parse_unit)]
    unit: LengthUnit,

    /// Diameter engine command; enables diameter analysis
    #[arg(short, long, value_name = "COMMAND")]
    engine: Option<String>,

    /// Argument passed to the engine command (repeatable)
    #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Seconds allowed for a single measurement
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Do not ask the engine to optimise for thin fibres
    #[arg(long)]
    no_thin_fibres: bool,

    /// Send cropped pixels to the engine instead of the file path
    #[arg(long)]
    send_pixels: bool,

    /// Separator splitting file stems into name parts
    #[arg(long, default_value = "_")]
    name_separator: String,

    /// Stem parts forming the sample name (comma separated indices)
    #[arg(long, default_value = "0", value_delimiter = ',')]
    name_parts: Vec<usize>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
    /// Preview paths only (one per line)
    Paths,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let method = if self.engine.is_some() {
            AnalysisMethod::External
        } else {
            AnalysisMethod::None
        };

        PipelineConfig::default()
            .with_bar_height(self.bar_height)
            .with_crop(!self.no_crop)
            .with_output_folder(self.output_folder.clone())
            .with_extension(self.extension.clone())
            .with_target_unit(self.unit)
            .with_analysis_method(method)
            .optimise_for_thin_fibres(!self.no_thin_fibres)
            .load_externally(!self.send_pixels)
            .with_sample_naming(SampleNaming {
                separator: self.name_separator.clone(),
                parts: self.name_parts.clone(),
            })
    }

    fn engine_config(&self) -> Option<EngineConfig> {
        self.engine.as_ref().map(|command| {
            EngineConfig::new(command.clone())
                .with_args(self.engine_args.iter().cloned())
                .with_timeout(Duration::from_secs(self.timeout_secs))
        })
    }
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    // Verify directory exists
    if !cli.directory.is_dir() {
        eprintln!("Error: {} is not a directory", cli.directory.display());
        process::exit(1);
    }

    info!("Processing directory: {}", cli.directory.display());

    // Build pipeline settings from arguments
    let config = cli.pipeline_config();
    if !(0.0..1.0).contains(&config.bar_height) {
        eprintln!("Error: bar height must be in [0, 1), got {}", config.bar_height);
        process::exit(1);
    }

    // Start the diameter engine once for the whole batch
    let mut engine = match cli.engine_config().map(SubprocessEngine::open).transpose() {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to start diameter engine: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // Crop and measure every image
    let pipeline = Pipeline::new(config);
    let result = pipeline.run(
        &cli.directory,
        engine.as_mut().map(|e| e as &mut dyn DiameterEngine),
    );

    // Stop the engine before reporting
    if let Some(engine) = engine.as_mut() {
        if let Err(e) = engine.close() {
            warn!("Failed to stop diameter engine: {}", e);
        }
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to read directory: {}", e);
            eprintln!("Error: Failed to read directory: {}", e);
            process::exit(1);
        }
    };

    if report.total() == 0 {
        eprintln!(
            "Error: No .{} files found in directory",
            pipeline.config().extension
        );
        process::exit(1);
    }

    // Output results
    output_report(&report, cli.format);
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

fn output_report(report: &BatchReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => print!("{}", BatchTextReport::new(report)),
        OutputFormat::Paths => {
            for preview in &report.previews {
                println!("{}", preview.display());
            }
        }
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                match serde_json::to_string_pretty(report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize to JSON: {}", e);
                        eprintln!("Error: Failed to serialize to JSON: {}", e);
                        process::exit(1);
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            {
                eprintln!("Error: JSON output requires the 'json' feature");
                eprintln!("Rebuild with: cargo build --features json");
                process::exit(1);
            }
        }
    }
}
