//! Batch processing of a project directory
//!
//! A project is a flat directory of SEM TIFF images. Cropped previews are
//! written to a subfolder of it.

mod pipeline;
mod record;

pub use pipeline::{collect_image_files, save_preview, BatchReport, Pipeline, SkippedImage};
pub use record::ImageRecord;
