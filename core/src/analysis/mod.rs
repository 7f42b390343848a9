//! Fibre-diameter analysis
//!
//! The measurement method is an opaque external program. This module owns the
//! session with that program and the conversion of its pixel results into
//! physical units.

mod engine;
mod measurement;
mod summary;

pub use engine::{
    parse_response, write_request, DiameterEngine, EngineConfig, MeasurementRequest,
    MeasurementSource, SubprocessEngine, DEFAULT_ENGINE_TIMEOUT,
};
pub use measurement::{Measurement, PixelMeasurement};
pub use summary::{ResultRow, ResultTable};
