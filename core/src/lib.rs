pub mod analysis;
pub mod api;
pub mod cli;
pub mod error;
pub mod extraction;
pub mod project;
pub mod types;

pub use analysis::{
    DiameterEngine, EngineConfig, Measurement, MeasurementRequest, MeasurementSource,
    PixelMeasurement, ResultRow, ResultTable, SubprocessEngine,
};
pub use api::{SemExtractor, SemMetadata};
pub use cli::report::{BatchTextReport, TextReport};
pub use error::{FibresemError, Result};
pub use project::{BatchReport, ImageRecord, Pipeline};
pub use types::*;
