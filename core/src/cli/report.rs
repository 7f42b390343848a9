use crate::api::SemMetadata;
use crate::project::BatchReport;
use crate::types::{LengthUnit, DEFAULT_BAR_HEIGHT};
use std::fmt;

/// Text report formatter for SEM image metadata
pub struct TextReport<'a> {
    metadata: &'a SemMetadata,
    unit: LengthUnit,
    bar_height: f64,
    show_block: bool,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(metadata: &'a SemMetadata) -> Self {
        Self {
            metadata,
            unit: LengthUnit::default(),
            bar_height: DEFAULT_BAR_HEIGHT,
            show_block: false,
        }
    }

    /// Builder: Unit of the reported conversion factor
    pub fn with_unit(mut self, unit: LengthUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Builder: Bar height used for the crop window
    pub fn with_bar_height(mut self, bar_height: f64) -> Self {
        self.bar_height = bar_height;
        self
    }

    /// Builder: List every metadata block entry
    pub fn show_block(mut self, show: bool) -> Self {
        self.show_block = show;
        self
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.metadata;

        writeln!(f, "SEM Image Metadata")?;
        writeln!(f, "==================")?;
        writeln!(f)?;
        match (metadata.width, metadata.height) {
            (Some(w), Some(h)) => writeln!(f, "Dimensions:     {}x{}", w, h)?,
            _ => writeln!(f, "Dimensions:     unknown")?,
        }
        writeln!(
            f,
            "Manufacturer:   {}",
            metadata.manufacturer.as_deref().unwrap_or("unknown")
        )?;
        writeln!(
            f,
            "Model:          {}",
            metadata.model.as_deref().unwrap_or("unknown")
        )?;
        writeln!(
            f,
            "Software:       {}",
            metadata.software.as_deref().unwrap_or("unknown")
        )?;
        writeln!(f, "Block Entries:  {}", metadata.block.len())?;
        writeln!(f)?;

        writeln!(f, "Calibration")?;
        writeln!(f, "-----------")?;
        writeln!(f, "Pixel Size:     {}", metadata.calibration)?;
        writeln!(
            f,
            "Factor:         {} {}/px",
            metadata.conversion_factor(self.unit),
            self.unit
        )?;
        match metadata.crop_rectangle(self.bar_height) {
            Some(Ok(rect)) => writeln!(f, "Crop Window:    {}", rect)?,
            Some(Err(e)) => writeln!(f, "Crop Window:    {}", e)?,
            None => writeln!(f, "Crop Window:    unknown")?,
        }

        if self.show_block && !metadata.block.is_empty() {
            writeln!(f)?;
            writeln!(f, "Metadata Block")?;
            writeln!(f, "--------------")?;
            for (key, value) in metadata.block.iter() {
                writeln!(f, "{} = {}", key, value)?;
            }
        }

        Ok(())
    }
}

/// Text report for a batch run
pub struct BatchTextReport<'a> {
    report: &'a BatchReport,
}

impl<'a> BatchTextReport<'a> {
    pub fn new(report: &'a BatchReport) -> Self {
        Self { report }
    }
}

impl<'a> fmt::Display for BatchTextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        writeln!(f, "Batch Summary")?;
        writeln!(f, "=============")?;
        writeln!(f)?;
        writeln!(f, "Images:     {}", report.total())?;
        writeln!(f, "Read:       {}", report.records.len())?;
        writeln!(f, "Previews:   {}", report.previews.len())?;
        writeln!(f, "Measured:   {}", report.results.len())?;
        writeln!(f, "Skipped:    {}", report.skipped.len())?;

        if !report.records.is_empty() {
            writeln!(f)?;
            writeln!(f, "Calibration")?;
            writeln!(f, "-----------")?;
            for record in &report.records {
                writeln!(
                    f,
                    "{:<32} {:<20} {}",
                    record.file_name, record.sample_name, record.metadata.calibration
                )?;
            }
        }

        if !report.results.is_empty() {
            writeln!(f)?;
            writeln!(f, "Diameters")?;
            writeln!(f, "---------")?;
            write!(f, "{}", report.results)?;
        }

        if !report.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped")?;
            writeln!(f, "-------")?;
            for skipped in &report.skipped {
                writeln!(f, "{}: {}", skipped.file_name, skipped.reason)?;
            }
        }

        Ok(())
    }
}
