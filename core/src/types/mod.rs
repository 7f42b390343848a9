//! Core type definitions for SEM image metadata
//!
//! This module provides the data model used throughout the fibresem library:
//! - [`RawTagMap`] / [`TagValue`]: Tags of the first TIFF page
//! - [`MetadataBlock`]: Key/value pairs of the vendor's embedded text block
//! - [`Calibration`]: Physical pixel size, or the missing-calibration sentinel
//! - [`CropRectangle`]: Window removing the instrument information bar
//! - [`LengthUnit`]: Unit table used for pixel-to-length conversion
//! - [`PipelineConfig`]: Configuration for batch runs

mod calibration;
pub(crate) mod crop;
mod config;
mod metadata_block;
mod tag_map;
mod units;

pub use calibration::Calibration;
pub use config::{AnalysisMethod, PipelineConfig, SampleNaming};
pub use crop::{CropRectangle, DEFAULT_BAR_HEIGHT};
pub use metadata_block::MetadataBlock;
pub use tag_map::{decode_text, RawTagMap, TagValue};
pub use units::{conversion_factor, conversion_factor_or_nan, unit_scale, LengthUnit};
