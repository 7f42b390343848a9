use crate::types::crop::DEFAULT_BAR_HEIGHT;
use crate::types::LengthUnit;
use std::fmt;

/// How fibre diameters are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum AnalysisMethod {
    /// No diameter analysis
    #[default]
    None,
    /// Hand each image to an external diameter engine
    External,
}

impl AnalysisMethod {
    pub fn simple_name(&self) -> &'static str {
        match self {
            AnalysisMethod::None => "none",
            AnalysisMethod::External => "external",
        }
    }
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Derives a sample name from a file stem
///
/// The stem is split on `separator`; the parts at `parts` are joined with a
/// space. With the defaults, `"PA6-3_0500u_s1_img01"` becomes `"PA6-3"`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleNaming {
    pub separator: String,
    pub parts: Vec<usize>,
}

impl Default for SampleNaming {
    fn default() -> Self {
        Self {
            separator: "_".to_string(),
            parts: vec![0],
        }
    }
}

impl SampleNaming {
    /// Returns the sample name for `stem`, or the whole stem if no part matches
    pub fn sample_name(&self, stem: &str) -> String {
        if self.separator.is_empty() {
            return stem.to_string();
        }

        let pieces: Vec<&str> = stem.split(self.separator.as_str()).collect();
        let selected: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|&i| pieces.get(i).copied())
            .filter(|piece| !piece.is_empty())
            .collect();

        if selected.is_empty() {
            stem.to_string()
        } else {
            selected.join(" ")
        }
    }
}

/// Configuration for a batch run
///
/// Passed to [`crate::Pipeline::new`]; nothing in the pipeline reads
/// process-wide defaults.
///
/// # Example
///
/// ```
/// use fibresem_core::{AnalysisMethod, LengthUnit, PipelineConfig};
///
/// let config = PipelineConfig::default()
///     .with_bar_height(0.08)
///     .with_target_unit(LengthUnit::Nanometre)
///     .with_analysis_method(AnalysisMethod::External);
///
/// assert_eq!(config.bar_height, 0.08);
/// assert!(config.crop);
/// assert_eq!(config.output_folder_name, "cropped");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    /// Height of the information bar as a fraction of the image height
    pub bar_height: f64,

    /// Write cropped previews
    pub crop: bool,

    /// Folder below the project directory receiving cropped previews
    pub output_folder_name: String,

    /// Unit of reported diameters
    pub target_unit: LengthUnit,

    /// Diameter measurement method
    pub analysis_method: AnalysisMethod,

    /// Forwarded to the diameter engine
    pub optimise_for_thin_fibres: bool,

    /// Let the engine read the file itself instead of sending pixels
    pub load_externally: bool,

    /// Extension of the image files to collect
    pub extension: String,

    /// Sample name derivation
    pub sample_naming: SampleNaming,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bar_height: DEFAULT_BAR_HEIGHT,
            crop: true,
            output_folder_name: "cropped".to_string(),
            target_unit: LengthUnit::Micrometre,
            analysis_method: AnalysisMethod::None,
            optimise_for_thin_fibres: true,
            load_externally: true,
            extension: "tif".to_string(),
            sample_naming: SampleNaming::default(),
        }
    }
}

impl PipelineConfig {
    /// Builder: Set the information bar height fraction
    pub fn with_bar_height(mut self, bar_height: f64) -> Self {
        self.bar_height = bar_height;
        self
    }

    /// Builder: Enable or disable cropped previews
    pub fn with_crop(mut self, crop: bool) -> Self {
        self.crop = crop;
        self
    }

    /// Builder: Set the preview output folder name
    pub fn with_output_folder(mut self, name: impl Into<String>) -> Self {
        self.output_folder_name = name.into();
        self
    }

    /// Builder: Set the unit of reported diameters
    pub fn with_target_unit(mut self, unit: LengthUnit) -> Self {
        self.target_unit = unit;
        self
    }

    /// Builder: Set the diameter measurement method
    pub fn with_analysis_method(mut self, method: AnalysisMethod) -> Self {
        self.analysis_method = method;
        self
    }

    /// Builder: Forward the thin-fibre optimisation flag
    pub fn optimise_for_thin_fibres(mut self, optimise: bool) -> Self {
        self.optimise_for_thin_fibres = optimise;
        self
    }

    /// Builder: Let the engine load files itself
    ///
    /// # Example
    ///
    /// ```
    /// use fibresem_core::PipelineConfig;
    ///
    /// let config = PipelineConfig::default().load_externally(false);
    /// assert!(!config.load_externally);
    /// ```
    pub fn load_externally(mut self, load: bool) -> Self {
        self.load_externally = load;
        self
    }

    /// Builder: Set the image file extension (without dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Builder: Set the sample naming rule
    pub fn with_sample_naming(mut self, naming: SampleNaming) -> Self {
        self.sample_naming = naming;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.bar_height, 0.11);
        assert_eq!(config.target_unit, LengthUnit::Micrometre);
        assert_eq!(config.analysis_method, AnalysisMethod::None);
        assert!(config.optimise_for_thin_fibres);
        assert_eq!(config.extension, "tif");
    }

    #[test]
    fn test_extension_strips_dot() {
        let config = PipelineConfig::default().with_extension(".tiff");
        assert_eq!(config.extension, "tiff");
    }

    #[test]
    fn test_sample_name_default() {
        let naming = SampleNaming::default();
        assert_eq!(naming.sample_name("PA6-3_0500u_s1_img01"), "PA6-3");
        assert_eq!(naming.sample_name("plain"), "plain");
    }

    #[test]
    fn test_sample_name_multiple_parts() {
        let naming = SampleNaming {
            separator: "_".to_string(),
            parts: vec![0, 2],
        };
        assert_eq!(naming.sample_name("PA6_0500u_s1_img01"), "PA6 s1");
        // Out-of-range indices are ignored
        let naming = SampleNaming {
            separator: "-".to_string(),
            parts: vec![5],
        };
        assert_eq!(naming.sample_name("a-b"), "a-b");
    }
}
