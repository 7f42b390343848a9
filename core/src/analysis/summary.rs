use crate::analysis::Measurement;
use crate::types::{Calibration, LengthUnit};
use std::fmt;

/// One measured image
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ResultRow {
    pub file_name: String,
    pub sample_name: String,
    pub calibration: Calibration,
    pub measurement: Measurement,
}

/// Aggregated diameter results of a batch, in insertion order
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ResultTable {
    unit: LengthUnit,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Creates an empty table reporting in `unit`
    pub fn new(unit: LengthUnit) -> Self {
        Self {
            unit,
            rows: Vec::new(),
        }
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows belonging to `sample_name`
    pub fn rows_for_sample<'a>(
        &'a self,
        sample_name: &'a str,
    ) -> impl Iterator<Item = &'a ResultRow> {
        self.rows.iter().filter(move |r| r.sample_name == sample_name)
    }

    /// Distinct sample names in first-seen order
    pub fn sample_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !names.contains(&row.sample_name.as_str()) {
                names.push(&row.sample_name);
            }
        }
        names
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit.symbol();
        writeln!(
            f,
            "{:<24} {:<20} {:>12} {:>12} {:>12} {:>12} {:>6}",
            "file",
            "sample",
            "pixel size",
            "avg [px]",
            format!("avg [{}]", unit),
            format!("sdev [{}]", unit),
            "count"
        )?;

        for row in &self.rows {
            let m = &row.measurement;
            writeln!(
                f,
                "{:<24} {:<20} {:>12} {:>12.3} {:>12.4} {:>12.4} {:>6}",
                row.file_name,
                row.sample_name,
                row.calibration.raw,
                m.pixels.pixel_average,
                m.average(),
                m.sdev(),
                m.pixels.pixel_diameters.len()
            )?;
        }

        Ok(())
    }
}
