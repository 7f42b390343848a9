use crate::api::{SemExtractor, SemMetadata};
use crate::error::Result;
use crate::types::{RawTagMap, SampleNaming};
use std::path::{Path, PathBuf};

/// SEM image record combining file path, sample name and extracted metadata
#[derive(Debug, Clone)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ImageRecord {
    /// Path to the TIFF file
    pub file_path: PathBuf,

    /// File name including extension
    pub file_name: String,

    /// File name without extension
    pub stem: String,

    /// Sample the image belongs to
    pub sample_name: String,

    /// Extracted SEM metadata
    pub metadata: SemMetadata,
}

impl ImageRecord {
    /// Creates a record from a TIFF file path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TIFF file
    /// * `naming` - Rule deriving the sample name from the file stem
    pub fn from_file(path: PathBuf, naming: &SampleNaming) -> Result<Self> {
        let metadata = SemExtractor::from_file(&path)?;
        Ok(Self::with_metadata(path, metadata, naming))
    }

    /// Creates a record from an already-read tag map
    pub fn from_tags(path: PathBuf, tags: &RawTagMap, naming: &SampleNaming) -> Self {
        let metadata = SemExtractor::extract_with_source(tags, &display_name(&path));
        Self::with_metadata(path, metadata, naming)
    }

    fn with_metadata(path: PathBuf, metadata: SemMetadata, naming: &SampleNaming) -> Self {
        let file_name = display_name(&path);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());
        let sample_name = naming.sample_name(&stem);

        Self {
            file_path: path,
            file_name,
            stem,
            sample_name,
            metadata,
        }
    }

    /// Image area in pixels, if the dimensions are known
    pub fn image_area(&self) -> Option<u64> {
        match (self.metadata.width, self.metadata.height) {
            (Some(w), Some(h)) => Some(w as u64 * h as u64),
            _ => None,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
