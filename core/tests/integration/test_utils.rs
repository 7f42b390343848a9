//! Test utilities for integration tests.
//!
//! Builds small uncompressed 8-bit grayscale TIFF files carrying an embedded
//! SEM metadata block, and a mock diameter engine recording its requests.

use fibresem_core::{
    DiameterEngine, FibresemError, MeasurementRequest, PixelMeasurement, Result,
};
use std::path::Path;

pub const SEM_METADATA_TAG: u16 = 34119;

const SHORT: u16 = 3;
const LONG: u16 = 4;
const ASCII: u16 = 2;

// =============================================================================
// Synthetic TIFF builder
// =============================================================================

/// Builder for a single-strip grayscale TIFF
pub struct TiffBuilder {
    width: u32,
    height: u32,
    big_endian: bool,
    pixels: Vec<u8>,
    ascii: Vec<(u16, Vec<u8>)>,
}

impl TiffBuilder {
    /// Image of `width` x `height` pixels filled with a diagonal gradient
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| ((x + y) % 256) as u8))
            .collect();
        Self {
            width,
            height,
            big_endian: false,
            pixels,
            ascii: Vec::new(),
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    /// Adds the vendor block with CRLF line endings and a trailing NUL
    pub fn with_sem_block(self, lines: &[&str]) -> Self {
        let mut text = lines.join("\r\n").into_bytes();
        text.extend_from_slice(b"\r\n\0");
        self.with_ascii(SEM_METADATA_TAG, text)
    }

    /// Adds the vendor block with a calibration line
    pub fn with_pixel_size(self, pixel_size: &str) -> Self {
        let line = format!("Image Pixel Size = {}", pixel_size);
        self.with_sem_block(&["AP_PIXEL_SIZE", line.as_str(), "AP_MAG", "Mag = 5.00 K X"])
    }

    pub fn with_ascii(mut self, tag: u16, bytes: Vec<u8>) -> Self {
        self.ascii.push((tag, bytes));
        self
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn build(&self) -> Vec<u8> {
        let u16b = |v: u16| {
            if self.big_endian {
                v.to_be_bytes()
            } else {
                v.to_le_bytes()
            }
        };
        let u32b = |v: u32| {
            if self.big_endian {
                v.to_be_bytes()
            } else {
                v.to_le_bytes()
            }
        };

        let mut out = Vec::new();
        out.extend_from_slice(if self.big_endian { b"MM" } else { b"II" });
        out.extend_from_slice(&u16b(42));
        out.extend_from_slice(&[0; 4]);

        let strip_offset = out.len() as u32;
        out.extend_from_slice(&self.pixels);

        // (tag, type, count, inline value or offset)
        let mut entries: Vec<(u16, u16, u32, [u8; 4])> = Vec::new();
        let short = |v: u16| {
            let b = u16b(v);
            [b[0], b[1], 0, 0]
        };

        entries.push((256, LONG, 1, u32b(self.width)));
        entries.push((257, LONG, 1, u32b(self.height)));
        entries.push((258, SHORT, 1, short(8)));
        entries.push((259, SHORT, 1, short(1)));
        entries.push((262, SHORT, 1, short(1)));
        entries.push((273, LONG, 1, u32b(strip_offset)));
        entries.push((277, SHORT, 1, short(1)));
        entries.push((278, LONG, 1, u32b(self.height)));
        entries.push((279, LONG, 1, u32b(self.pixels.len() as u32)));

        for (tag, bytes) in &self.ascii {
            let value = if bytes.len() <= 4 {
                let mut inline = [0u8; 4];
                inline[..bytes.len()].copy_from_slice(bytes);
                inline
            } else {
                if out.len() % 2 == 1 {
                    out.push(0);
                }
                let offset = out.len() as u32;
                out.extend_from_slice(bytes);
                u32b(offset)
            };
            entries.push((*tag, ASCII, bytes.len() as u32, value));
        }
        entries.sort_by_key(|entry| entry.0);

        if out.len() % 2 == 1 {
            out.push(0);
        }
        let ifd_offset = out.len() as u32;
        out[4..8].copy_from_slice(&u32b(ifd_offset));

        out.extend_from_slice(&u16b(entries.len() as u16));
        for (tag, field_type, count, value) in &entries {
            out.extend_from_slice(&u16b(*tag));
            out.extend_from_slice(&u16b(*field_type));
            out.extend_from_slice(&u32b(*count));
            out.extend_from_slice(value);
        }
        out.extend_from_slice(&[0; 4]);

        out
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

// =============================================================================
// Mock diameter engine
// =============================================================================

/// Engine returning a fixed measurement and recording every request
pub struct MockEngine {
    pub measurement: PixelMeasurement,
    pub fail_for: Option<String>,
    pub requests: Vec<MeasurementRequest>,
    pub closed: bool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            measurement: PixelMeasurement {
                pixel_average: 20.0,
                pixel_sdev: 2.0,
                pixel_diameters: vec![18.0, 20.0, 22.0],
            },
            fail_for: None,
            requests: Vec::new(),
            closed: false,
        }
    }

    pub fn failing_for(mut self, file_name: &str) -> Self {
        self.fail_for = Some(file_name.to_string());
        self
    }
}

impl DiameterEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn measure(&mut self, request: &MeasurementRequest) -> Result<PixelMeasurement> {
        self.requests.push(request.clone());
        if self.fail_for.as_deref() == Some(request.file_name.as_str()) {
            return Err(FibresemError::Engine("no fibres found".to_string()));
        }
        Ok(self.measurement.clone())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
