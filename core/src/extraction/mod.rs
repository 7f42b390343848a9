pub mod calibration;
pub mod metadata_block;
pub mod tags;
pub mod tiff_reader;

pub use calibration::{calibration_or_missing, extract_calibration, IMAGE_PIXEL_SIZE};
pub use metadata_block::{metadata_block_or_empty, parse_block_text, parse_metadata_block};
pub use tags::*;
